//! Task scheduling interface of the channel runtime.
//!
//! The runtime owns no threads. Every stage step is handed to an external
//! executor through the single [`Executor::schedule`] hook, which must run
//! the task at least once, at any later point, on any thread.
//!
//! # Provided Executors
//!
//! - [`TokioExecutor`]: schedules steps onto a tokio runtime (default)
//! - [`InlineExecutor`]: runs steps immediately on the calling thread

mod inline;
mod tokio;

pub use self::inline::InlineExecutor;
pub use self::tokio::TokioExecutor;

use std::sync::Arc;

/// A unit of work submitted to an [`Executor`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A shared handle to an [`Executor`].
pub type ExecutorRef = Arc<dyn Executor>;

/// The outbound scheduling contract of the channel runtime.
///
/// Implementations must execute the task at least once. No ordering between
/// tasks is required; the runtime serializes the steps of a single stage
/// itself and never schedules two steps of one stage concurrently.
pub trait Executor: Send + Sync + 'static {
  /// Submits `task` for asynchronous execution.
  fn schedule(&self, task: Task);
}
