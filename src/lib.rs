//! Runnel - a typed dataflow channel runtime.
//!
//! Pipelines are composed out of small stateful *processes* connected by
//! typed channels. A producer pushes values into a [`Sender`]; each
//! downstream stage consumes values and emits derived values, which fan out
//! to further stages. The runtime schedules every stage cooperatively on an
//! external executor, runs at most one step per stage at a time, and
//! propagates close and teardown through the handle reference counts.
//!
//! # Example
//!
//! ```
//! use runnel::channel_on;
//! use runnel::exec::InlineExecutor;
//! use std::sync::Arc;
//!
//! let (sender, receiver) = channel_on::<i32>(Arc::new(InlineExecutor));
//! let doubled = receiver.map(|x| x * 2);
//! # drop(doubled);
//!
//! sender.send(21);
//! ```

mod channel;
mod error;
mod loom;
mod stage;

pub mod consts;
pub mod exec;
pub mod process;
pub mod sync;

pub use self::channel::Receiver;
pub use self::channel::Sender;
pub use self::channel::channel;
pub use self::channel::channel_on;
