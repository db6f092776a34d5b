use crate::exec::Executor;
use crate::exec::Task;

/// An [`Executor`] that runs every task immediately on the calling thread.
///
/// With this executor a pipeline is fully synchronous: by the time a send
/// returns, the value has flowed as far as the flow-control protocol allows.
/// Steps nest on the call stack, so stack depth grows with pipeline depth.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
  fn schedule(&self, task: Task) {
    task();
  }
}
