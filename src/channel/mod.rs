//! Channel construction and the public handle types.

mod receiver;
mod sender;

pub use self::receiver::Receiver;
pub use self::sender::Sender;

use std::sync::Arc;
use std::sync::Weak;

use crate::exec::ExecutorRef;
use crate::exec::TokioExecutor;
use crate::process::Identity;
use crate::stage::SharedStage;
use crate::stage::StageSender;
use crate::stage::StepMode;

/// Creates a channel scheduled on the current tokio runtime.
///
/// Equivalent to [`channel_on`] with a [`TokioExecutor`].
///
/// # Panics
///
/// Panics when called outside a tokio runtime context.
pub fn channel<T>() -> (Sender<T>, Receiver<T>)
where
  T: Clone + Send + 'static,
{
  channel_on(Arc::new(TokioExecutor::new()))
}

/// Creates a channel whose stages schedule their steps on `executor`.
///
/// The head stage passes values through unchanged; attach transforms to the
/// returned [`Receiver`] and feed values through the returned [`Sender`].
/// Stages composed onto the receiver inherit the executor.
pub fn channel_on<T>(executor: ExecutorRef) -> (Sender<T>, Receiver<T>)
where
  T: Clone + Send + 'static,
{
  let stage: Arc<SharedStage<Identity<T>, T>> =
    SharedStage::new(Identity::new(), StepMode::OneShot, executor, None);

  let stage_dyn: Arc<dyn StageSender<T>> = stage.clone();
  let weak: Weak<dyn StageSender<T>> = Arc::downgrade(&stage_dyn);
  let sender: Sender<T> = Sender::attach(weak);
  let receiver: Receiver<T> = Receiver::bind(stage);

  tracing::debug!("channel created");

  (sender, receiver)
}
