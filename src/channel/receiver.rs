use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::ops::BitOr;
use std::sync::Arc;
use std::sync::Weak;

use crate::error::raise;
use crate::loom::sync::atomic::AtomicBool;
use crate::loom::sync::atomic::Ordering;
use crate::process::Process;
use crate::process::lift;
use crate::stage::SharedStage;
use crate::stage::StageReceiver;
use crate::stage::StageSender;
use crate::stage::StepMode;
use crate::stage::is_void;

use super::Sender;

/// The receiving half of a channel.
///
/// A receiver does not expose values directly; it is the point where further
/// stages attach. Composing through [`map`], [`pipe`], or the `|` operator
/// mints a new downstream stage and marks this receiver *ready*: the
/// downstream list then owns the edge and the handle no longer holds the
/// stage open.
///
/// A receiver dropped before becoming ready releases its stage, which lets
/// a closing pipeline drain without subscribers.
///
/// [`map`]: Receiver::map
/// [`pipe`]: Receiver::pipe
pub struct Receiver<T>
where
  T: Send + 'static,
{
  stage: Arc<dyn StageReceiver<T>>,
  ready: AtomicBool,
}

impl<T> Receiver<T>
where
  T: Send + 'static,
{
  /// Binds a handle to a stage, taking ownership of one receiver count.
  pub(crate) fn bind(stage: Arc<dyn StageReceiver<T>>) -> Self {
    Self {
      stage,
      ready: AtomicBool::new(false),
    }
  }

  /// Attaches a one-to-one mapping stage and returns its receiver.
  ///
  /// The new stage runs the one-shot step: each input is transformed and
  /// broadcast individually.
  pub fn map<F, Y>(&self, func: F) -> Receiver<Y>
  where
    F: FnMut(T) -> Y + Send + 'static,
    Y: Clone + Send + 'static,
  {
    self.compose(lift(func), StepMode::OneShot)
  }

  /// Attaches a stateful process stage and returns its receiver.
  ///
  /// The new stage runs the buffered step: the process is fed until it
  /// reports [`Yield`], and emits at its own cadence.
  ///
  /// [`Yield`]: crate::process::ProcessState::Yield
  pub fn pipe<P>(&self, process: P) -> Receiver<P::Output>
  where
    P: Process<T>,
  {
    self.compose(process, StepMode::Buffered)
  }

  fn compose<P>(&self, process: P, mode: StepMode) -> Receiver<P::Output>
  where
    P: Process<T>,
  {
    if is_void::<T>() {
      raise!(Error, Misuse, "cannot attach a stage to a void receiver");
    }

    let stage: Arc<SharedStage<P, T>> = SharedStage::new(
      process,
      mode,
      self.stage.executor(),
      Some(Arc::clone(&self.stage)),
    );

    // Attach the edge before releasing this handle's receiver count, so a
    // drain kicked by the release already sees the new subscriber.
    let stage_dyn: Arc<dyn StageSender<T>> = stage.clone();
    let weak: Weak<dyn StageSender<T>> = Arc::downgrade(&stage_dyn);

    self.stage.map(Sender::attach(weak));
    self.set_ready();

    Receiver::bind(stage)
  }

  /// Marks this receiver ready, releasing its receiver count.
  ///
  /// Composition does this implicitly; call it directly on a terminal
  /// receiver whose values are intentionally unobserved.
  pub fn set_ready(&self) {
    if !self.ready.swap(true, Ordering::AcqRel) {
      self.stage.remove_receiver();
    }
  }

  /// Returns `true` iff this receiver has been composed or released.
  pub fn ready(&self) -> bool {
    self.ready.load(Ordering::Acquire)
  }
}

impl<T> Clone for Receiver<T>
where
  T: Send + 'static,
{
  fn clone(&self) -> Self {
    let ready: bool = self.ready();

    if !ready {
      self.stage.add_receiver();
    }

    Self {
      stage: Arc::clone(&self.stage),
      ready: AtomicBool::new(ready),
    }
  }
}

impl<T> Drop for Receiver<T>
where
  T: Send + 'static,
{
  fn drop(&mut self) {
    if !self.ready() {
      self.stage.remove_receiver();
    }
  }
}

impl<T> Debug for Receiver<T>
where
  T: Send + 'static,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.write_str("Receiver(..)")
  }
}

// -----------------------------------------------------------------------------
// Composition Operator
// -----------------------------------------------------------------------------

impl<T, P> BitOr<P> for Receiver<T>
where
  T: Send + 'static,
  P: Process<T>,
{
  type Output = Receiver<P::Output>;

  fn bitor(self, process: P) -> Self::Output {
    self.pipe(process)
  }
}

impl<T, P> BitOr<P> for &Receiver<T>
where
  T: Send + 'static,
  P: Process<T>,
{
  type Output = Receiver<P::Output>;

  fn bitor(self, process: P) -> Self::Output {
    self.pipe(process)
  }
}
