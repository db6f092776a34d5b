use crate::channel::Sender;
use crate::exec::ExecutorRef;

// -----------------------------------------------------------------------------
// Stage Sender
// -----------------------------------------------------------------------------

/// The upstream-facing protocol of a pipeline stage.
///
/// Producers and [`Sender`] handles reach the stage through this interface,
/// held as a weak trait object so a dead stage silently absorbs the calls.
pub(crate) trait StageSender<T>: Send + Sync
where
  T: Send + 'static,
{
  /// Enqueues one input, kicking a step if the stage should run.
  fn send(&self, value: T);

  /// Records one more sender handle.
  fn add_sender(&self);

  /// Records one sender handle gone; the last one closes the input queue.
  fn remove_sender(&self);
}

// -----------------------------------------------------------------------------
// Stage Receiver
// -----------------------------------------------------------------------------

/// The downstream-facing protocol of a pipeline stage.
///
/// [`Receiver`] handles and downstream stages reach the stage through this
/// interface, held as a strong trait object: a stage keeps its upstream
/// alive for as long as it exists itself.
///
/// [`Receiver`]: crate::channel::Receiver
pub(crate) trait StageReceiver<T>: Send + Sync
where
  T: Send + 'static,
{
  /// Appends a downstream sender to the broadcast list.
  fn map(&self, sender: Sender<T>);

  /// Acknowledges a previously broadcast value (clear-to-send).
  fn cts(&self);

  /// Records one more receiver handle.
  fn add_receiver(&self);

  /// Records one receiver handle gone; the last one lets the stage drain.
  fn remove_receiver(&self);

  /// Returns the executor this stage schedules its steps on.
  fn executor(&self) -> ExecutorRef;
}
