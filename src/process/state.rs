/// Readiness reported by a [`Process`].
///
/// A stage queries the state between steps to decide whether to feed the
/// process another input or to collect an output from it.
///
/// [`Process`]: crate::process::Process
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProcessState {
  /// The process wants another input.
  Await,
  /// The process can accept another input but already holds an output.
  AwaitTry,
  /// The process holds an output and must not be fed until it has emitted.
  Yield,
}
