use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use tokio::runtime::Handle;

use crate::exec::Executor;
use crate::exec::Task;

/// An [`Executor`] that schedules stage steps onto a tokio runtime.
///
/// The runtime handle is captured at construction, so tasks can be scheduled
/// from any thread afterwards, including threads outside the runtime.
pub struct TokioExecutor {
  handle: Handle,
}

impl TokioExecutor {
  /// Creates a new executor bound to the current tokio runtime.
  ///
  /// # Panics
  ///
  /// Panics when called outside a tokio runtime context.
  #[inline]
  pub fn new() -> Self {
    Self::with_handle(Handle::current())
  }

  /// Creates a new executor bound to the given runtime handle.
  #[inline]
  pub fn with_handle(handle: Handle) -> Self {
    Self { handle }
  }
}

impl Executor for TokioExecutor {
  fn schedule(&self, task: Task) {
    self.handle.spawn(async move { task() });
  }
}

impl Debug for TokioExecutor {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.write_str("TokioExecutor(..)")
  }
}
