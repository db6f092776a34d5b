use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::sync::Arc;
use std::sync::Weak;

use crate::stage::StageSender;

/// The sending half of a channel.
///
/// A value handle: cloning registers another producer with the stage,
/// dropping deregisters one, and the last drop closes the stage's input
/// queue. The handle holds the stage weakly, so sending into a pipeline
/// that has already been torn down is a silent no-op.
pub struct Sender<T>
where
  T: Send + 'static,
{
  stage: Option<Weak<dyn StageSender<T>>>,
}

impl<T> Sender<T>
where
  T: Send + 'static,
{
  /// Binds a handle to a stage, taking ownership of one sender count.
  pub(crate) fn attach(stage: Weak<dyn StageSender<T>>) -> Self {
    Self { stage: Some(stage) }
  }

  /// Promotes the weak stage reference, if the stage is still alive.
  pub(crate) fn peek(&self) -> Option<Arc<dyn StageSender<T>>> {
    self.stage.as_ref().and_then(Weak::upgrade)
  }

  /// Returns `true` iff the underlying stage is still alive.
  pub(crate) fn alive(&self) -> bool {
    self
      .stage
      .as_ref()
      .is_some_and(|stage| stage.strong_count() != 0)
  }

  /// Sends one value into the pipeline.
  ///
  /// Values are consumed in send order. A send to a closed or destroyed
  /// stage is silently dropped.
  pub fn send(&self, value: T) {
    if let Some(stage) = self.peek() {
      stage.send(value);
    }
  }

  /// Closes this handle eagerly.
  ///
  /// Performs the drop-side deregistration now and disarms the handle;
  /// subsequent sends and the eventual drop are no-ops.
  pub fn close(&mut self) {
    if let Some(stage) = self.stage.take() {
      if let Some(stage) = stage.upgrade() {
        stage.remove_sender();
      }
    }
  }
}

impl<T> Clone for Sender<T>
where
  T: Send + 'static,
{
  fn clone(&self) -> Self {
    if let Some(stage) = self.peek() {
      stage.add_sender();
    }

    Self {
      stage: self.stage.clone(),
    }
  }
}

impl<T> Drop for Sender<T>
where
  T: Send + 'static,
{
  fn drop(&mut self) {
    self.close();
  }
}

impl<T> Debug for Sender<T>
where
  T: Send + 'static,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.write_str("Sender(..)")
  }
}
