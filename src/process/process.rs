use crate::process::ProcessState;

/// A stateful pipeline stage body.
///
/// A process consumes inputs through [`accept`] and produces outputs through
/// [`emit`], pacing the two with [`state`]. The hosting stage guarantees the
/// calls are serialized: at most one of them executes at any instant, always
/// without any stage lock held, with one exception noted on [`state`].
///
/// `accept` and `emit` carry what the channel literature calls the *await*
/// and *yield* operations; both of those words are reserved in Rust.
///
/// # Contract
///
/// - [`accept`] is only invoked while [`state`] is not [`Yield`]
/// - [`emit`] is only invoked while [`state`] is [`Yield`] or [`AwaitTry`]
/// - [`close`] is invoked at most once, after the last input
///
/// [`accept`]: Process::accept
/// [`emit`]: Process::emit
/// [`state`]: Process::state
/// [`close`]: Process::close
/// [`Yield`]: ProcessState::Yield
/// [`AwaitTry`]: ProcessState::AwaitTry
pub trait Process<A>: Send + 'static
where
  A: Send + 'static,
{
  /// The type of value this process emits.
  type Output: Clone + Send + 'static;

  /// Consumes one input.
  fn accept(&mut self, input: A);

  /// Produces one output for broadcast to downstream stages.
  fn emit(&mut self) -> Self::Output;

  /// Reports the current readiness of the process.
  ///
  /// The default never yields, which makes the process a pure sink.
  ///
  /// The hosting stage probes this from the flow-control path while holding
  /// its stage lock, so implementations must be cheap and must not call back
  /// into the channel.
  fn state(&self) -> ProcessState {
    ProcessState::Await
  }

  /// Notifies the process that upstream has closed and the input queue has
  /// fully drained. No further calls follow.
  fn close(&mut self) {}
}
