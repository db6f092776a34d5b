//! The user-facing process protocol of the channel runtime.
//!
//! A pipeline stage hosts a *process*: a small stateful value that consumes
//! inputs and produces outputs at its own cadence. One-to-one transforms are
//! plain closures lifted into the protocol by [`FnProcess`].
//!
//! # Public API
//!
//! - [`Process`]: the protocol a stage drives
//! - [`ProcessState`]: readiness reported by a process
//! - [`FnProcess`] / [`lift`]: adapter for ordinary functions

mod function;
mod process;
mod state;

pub(crate) use self::function::Identity;

pub use self::function::FnProcess;
pub use self::function::lift;
pub use self::process::Process;
pub use self::state::ProcessState;
