use bitflags::bitflags;
use parking_lot::Mutex;
use std::any::TypeId;
use std::collections::VecDeque;
use std::mem;
use std::sync::Arc;
use std::sync::Weak;

use crate::channel::Sender;
use crate::consts::CAP_STAGE_DOWNSTREAM;
use crate::consts::CAP_STAGE_QUEUE;
use crate::error::fatal;
use crate::exec::ExecutorRef;
use crate::exec::Task;
use crate::process::Process;
use crate::process::ProcessState;
use crate::stage::StageCell;
use crate::stage::StageReceiver;
use crate::stage::StageSender;
use crate::sync::RefCounter;

/// Returns `true` iff `T` is the unit type.
///
/// Unit-yielding stages are pure sinks: they carry no receiver accounting
/// and run eagerly on send.
#[inline]
pub(crate) fn is_void<T: 'static>() -> bool {
  TypeId::of::<T>() == TypeId::of::<()>()
}

// -----------------------------------------------------------------------------
// Stage Flags
// -----------------------------------------------------------------------------

bitflags! {
  /// Run-state of a stage, guarded by the stage lock.
  #[derive(Clone, Copy, Debug, PartialEq, Eq)]
  pub(crate) struct StageFlags: u8 {
    /// A step is scheduled or executing.
    const RUNNING = 1 << 0;
    /// Upstream has closed; apply once the queue drains.
    const CLOSING = 1 << 1;
    /// The close has been applied; tear down at the next task completion.
    const FINAL   = 1 << 2;
  }
}

// -----------------------------------------------------------------------------
// Step Mode
// -----------------------------------------------------------------------------

/// Which step variant a stage runs.
///
/// Selected once at construction: stages minted from a plain mapping
/// function take the one-shot path, stages minted from a stateful process
/// take the buffered path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StepMode {
  /// Dequeue at most one message, transform it, broadcast the result.
  OneShot,
  /// Feed the process until it reports [`Yield`], then broadcast.
  ///
  /// [`Yield`]: ProcessState::Yield
  Buffered,
}

// -----------------------------------------------------------------------------
// Stage Internal
// -----------------------------------------------------------------------------

/// Mutable stage state, guarded by the stage lock.
struct StageInternal<A> {
  /// Pending inputs in arrival order.
  queue: VecDeque<A>,
  /// Outstanding clear-to-send acknowledgements after a broadcast.
  suspend_count: usize,
  /// Run-state flags.
  flags: StageFlags,
}

impl<A> StageInternal<A> {
  #[inline]
  fn new() -> Self {
    Self {
      queue: VecDeque::with_capacity(CAP_STAGE_QUEUE),
      suspend_count: 0,
      flags: StageFlags::empty(),
    }
  }
}

// -----------------------------------------------------------------------------
// Shared Stage
// -----------------------------------------------------------------------------

/// The coordination core of one pipeline stage.
///
/// Owns the user process, the input queue, the downstream sender list, and
/// the reference counts tying the stage to its producers and consumers. The
/// stage schedules its own steps on the executor and guarantees at most one
/// step is scheduled or executing at any instant.
///
/// # Locking
///
/// Two locks, never nested: the stage lock (`internal`) protects the queue,
/// the flags, and the suspend count; the downstream lock protects the sender
/// list. User code and downstream sends always run with neither lock held.
///
/// # Ownership
///
/// Downstream edges hold the next stage weakly; each stage holds its
/// upstream strongly. Liveness therefore flows tail-to-head while close
/// propagation flows head-to-tail, and no reference cycle exists.
pub(crate) struct SharedStage<P, A>
where
  P: Process<A>,
  A: Send + 'static,
{
  /// Step variant, fixed at construction.
  mode: StepMode,
  /// Where steps are scheduled.
  executor: ExecutorRef,
  /// Back-reference for delivering clear-to-send tokens.
  upstream: Option<Arc<dyn StageReceiver<A>>>,
  /// Weak self-reference captured by scheduled tasks.
  myself: Weak<Self>,
  /// The user process; see [`StageCell`] for the access protocol.
  process: StageCell<P>,
  /// Queue, flags, and suspend count.
  internal: Mutex<StageInternal<A>>,
  /// Downstream senders in attach order.
  downstream: Mutex<Vec<Sender<P::Output>>>,
  /// Live sender handles feeding this stage.
  sender_count: RefCounter,
  /// Live receiver handles not yet composed or released.
  receiver_count: RefCounter,
}

impl<P, A> SharedStage<P, A>
where
  P: Process<A>,
  A: Send + 'static,
{
  pub(crate) fn new(
    process: P,
    mode: StepMode,
    executor: ExecutorRef,
    upstream: Option<Arc<dyn StageReceiver<A>>>,
  ) -> Arc<Self> {
    let receivers: usize = if is_void::<P::Output>() { 0 } else { 1 };

    tracing::trace!(mode = ?mode, "stage created");

    Arc::new_cyclic(|myself| Self {
      mode,
      executor,
      upstream,
      myself: myself.clone(),
      process: StageCell::new(process),
      internal: Mutex::new(StageInternal::new()),
      downstream: Mutex::new(Vec::with_capacity(CAP_STAGE_DOWNSTREAM)),
      sender_count: RefCounter::new(1),
      receiver_count: RefCounter::new(receivers),
    })
  }

  // ---------------------------------------------------------------------------
  // Scheduling
  // ---------------------------------------------------------------------------

  /// Submits one step to the executor.
  ///
  /// The caller must already have set RUNNING under the stage lock. The task
  /// captures only a weak reference; a stage destroyed before the executor
  /// gets around to it makes the task a no-op.
  fn schedule(&self) {
    let stage: Weak<Self> = self.myself.clone();

    let task: Task = Box::new(move || {
      if let Some(stage) = stage.upgrade() {
        stage.step();
      }
    });

    self.executor.schedule(task);
  }

  fn step(&self) {
    match self.mode {
      StepMode::OneShot => self.step_one_shot(),
      StepMode::Buffered => self.step_buffered(),
    }
  }

  // ---------------------------------------------------------------------------
  // Step Variants
  // ---------------------------------------------------------------------------

  /// Buffered step: feed the process until it is ready to yield, then
  /// broadcast one output.
  fn step_buffered(&self) {
    loop {
      // SAFETY: This task is the stage's single running step.
      let state: Option<ProcessState> =
        unsafe { self.process.with_mut(|cell| cell.as_ref().map(|p| p.state())) };

      match state {
        None => return,
        Some(ProcessState::Yield) => break,
        Some(_) => {}
      }

      if !self.dequeue() {
        break;
      }
    }

    // SAFETY: This task is the stage's single running step.
    let state: Option<ProcessState> =
      unsafe { self.process.with_mut(|cell| cell.as_ref().map(|p| p.state())) };

    match state {
      None => {}
      Some(ProcessState::Await) => self.task_done(),
      Some(_) => {
        // SAFETY: This task is the stage's single running step.
        let value: Option<P::Output> =
          unsafe { self.process.with_mut(|cell| cell.as_mut().map(|p| p.emit())) };

        if let Some(value) = value {
          self.broadcast(value);
          self.cts();
        }
      }
    }
  }

  /// One-shot step: dequeue at most one message, transform it, broadcast.
  fn step_one_shot(&self) {
    let mut message: Option<A> = None;
    let mut notify: bool = false;

    {
      let mut internal = self.internal.lock();

      if internal.queue.is_empty() {
        if internal.flags.contains(StageFlags::CLOSING) {
          internal.flags.remove(StageFlags::CLOSING);
          internal.flags.insert(StageFlags::FINAL);
        }
      } else {
        message = internal.queue.pop_front();
        notify = internal.queue.is_empty();
      }
    }

    if notify {
      if let Some(upstream) = &self.upstream {
        upstream.cts();
      }
    }

    match message {
      Some(input) => {
        // SAFETY: This task is the stage's single running step.
        let value: Option<P::Output> = unsafe {
          self.process.with_mut(|cell| {
            cell.as_mut().map(|process| {
              process.accept(input);
              process.emit()
            })
          })
        };

        if let Some(value) = value {
          self.broadcast(value);
          self.cts();
        }
      }
      None => self.task_done(),
    }
  }

  // ---------------------------------------------------------------------------
  // Step Plumbing
  // ---------------------------------------------------------------------------

  /// Takes one message off the queue and feeds it to the process.
  ///
  /// Sends an upstream clear-to-send when the queue transitions to empty so
  /// upstream can refill. An empty queue with CLOSING set transfers the flag
  /// to FINAL (applied after any pending yield) and fires the close hook.
  ///
  /// Returns `true` iff a message was consumed.
  fn dequeue(&self) -> bool {
    let mut message: Option<A> = None;
    let mut notify: bool = false;
    let mut do_close: bool = false;

    {
      let mut internal = self.internal.lock();

      if internal.queue.is_empty() {
        if internal.flags.contains(StageFlags::CLOSING) {
          internal.flags.remove(StageFlags::CLOSING);
          internal.flags.insert(StageFlags::FINAL);
          do_close = true;
        }
      } else {
        message = internal.queue.pop_front();
        notify = internal.queue.is_empty();
      }
    }

    if notify {
      if let Some(upstream) = &self.upstream {
        upstream.cts();
      }
    }

    match message {
      Some(input) => {
        // SAFETY: This task is the stage's single running step.
        unsafe {
          self.process.with_mut(|cell| {
            if let Some(process) = cell.as_mut() {
              process.accept(input);
            }
          });
        }

        true
      }
      None => {
        if do_close {
          // SAFETY: This task is the stage's single running step.
          unsafe {
            self.process.with_mut(|cell| {
              if let Some(process) = cell.as_mut() {
                process.close();
              }
            });
          }
        }

        false
      }
    }
  }

  /// Broadcasts one output to every downstream sender attached at entry.
  ///
  /// Dead downstream entries are purged first: a dead stage acknowledges
  /// nothing, so counting it would suspend this stage forever. Senders that
  /// attach while the broadcast is in flight catch the next value.
  fn broadcast(&self, value: P::Output) {
    let targets: Vec<Arc<dyn StageSender<P::Output>>> = {
      let mut downstream = self.downstream.lock();
      downstream.retain(Sender::alive);
      downstream.iter().filter_map(Sender::peek).collect()
    };

    {
      let mut internal = self.internal.lock();

      if internal.suspend_count != 0 {
        fatal!("broadcast while suspended");
      }

      // One acknowledgement per downstream, plus one from this step itself.
      internal.suspend_count = targets.len() + 1;
    }

    for target in targets {
      target.send(value.clone());
    }
  }

  /// Completes a step that has no output to broadcast.
  ///
  /// Reschedules when work arrived during the step; otherwise goes idle. A
  /// stage in FINAL clears its downstream list (propagating the close) and
  /// drops its user process.
  fn task_done(&self) {
    let do_run: bool;
    let do_final: bool;

    {
      let mut internal = self.internal.lock();

      do_run = !internal.queue.is_empty() || internal.flags.contains(StageFlags::CLOSING);
      internal.flags.set(StageFlags::RUNNING, do_run);
      do_final = internal.flags.contains(StageFlags::FINAL);
    }

    if do_run && do_final {
      fatal!("stage cannot run and finalize at once");
    }

    if do_run {
      self.schedule();
    }

    if do_final {
      // Dropping the senders outside the lock propagates the close without
      // holding the downstream lock across downstream stage calls.
      let dropped: Vec<Sender<P::Output>> = {
        let mut downstream = self.downstream.lock();
        mem::take(&mut *downstream)
      };

      drop(dropped);

      // SAFETY: FINAL means the queue is empty and CLOSING is consumed, so
      // no further step can be scheduled; this is the last process access.
      let process: Option<P> = unsafe { self.process.with_mut(Option::take) };

      drop(process);

      tracing::trace!("stage finalized");
    }
  }
}

// -----------------------------------------------------------------------------
// Upstream-Facing Protocol
// -----------------------------------------------------------------------------

impl<P, A> StageSender<A> for SharedStage<P, A>
where
  P: Process<A>,
  A: Send + 'static,
{
  fn send(&self, value: A) {
    let do_run: bool = {
      let mut internal = self.internal.lock();

      internal.queue.push_back(value);

      // Work is deferred until every pending receiver has composed; a
      // void-yielding stage never counts receivers and runs eagerly.
      let do_run: bool =
        self.receiver_count.get() == 0 && !internal.flags.contains(StageFlags::RUNNING);

      if do_run {
        internal.flags.insert(StageFlags::RUNNING);
      }

      do_run
    };

    if do_run {
      self.schedule();
    }
  }

  fn add_sender(&self) {
    self.sender_count.increment();
  }

  fn remove_sender(&self) {
    if !self.sender_count.release() {
      return;
    }

    let do_run: bool = {
      let mut internal = self.internal.lock();

      internal.flags.insert(StageFlags::CLOSING);

      // Kick a drain step ourselves if no receiver release ever will.
      let do_run: bool =
        self.receiver_count.get() == 0 && !internal.flags.contains(StageFlags::RUNNING);

      if do_run {
        internal.flags.insert(StageFlags::RUNNING);
      }

      do_run
    };

    tracing::debug!("upstream closed");

    if do_run {
      self.schedule();
    }
  }
}

// -----------------------------------------------------------------------------
// Downstream-Facing Protocol
// -----------------------------------------------------------------------------

impl<P, A> StageReceiver<P::Output> for SharedStage<P, A>
where
  P: Process<A>,
  A: Send + 'static,
{
  fn map(&self, sender: Sender<P::Output>) {
    self.downstream.lock().push(sender);
  }

  fn cts(&self) {
    let do_run: bool = {
      let mut internal = self.internal.lock();

      if !internal.flags.contains(StageFlags::RUNNING) {
        fatal!("clear-to-send while idle");
      }

      if internal.suspend_count == 0 {
        fatal!("clear-to-send without a broadcast");
      }

      internal.suspend_count -= 1;

      if internal.suspend_count != 0 {
        false
      } else {
        // SAFETY: The suspend count reaching zero under the stage lock
        // proves the step that broadcast has performed its last process
        // access; no new step starts before RUNNING is re-evaluated here.
        let state: ProcessState = unsafe {
          self
            .process
            .with_mut(|cell| cell.as_ref().map(|p| p.state()))
            .unwrap_or(ProcessState::Await)
        };

        // FINAL counts as pending work: a process that still had an output
        // to yield when the close was applied broadcasts it first, and the
        // follow-up step's task-done performs the deferred teardown.
        if state == ProcessState::Yield
          || !internal.queue.is_empty()
          || internal
            .flags
            .intersects(StageFlags::CLOSING | StageFlags::FINAL)
        {
          true
        } else {
          internal.flags.remove(StageFlags::RUNNING);
          false
        }
      }
    };

    if do_run {
      self.schedule();
    }
  }

  fn add_receiver(&self) {
    if is_void::<P::Output>() {
      return;
    }

    self.receiver_count.increment();
  }

  fn remove_receiver(&self) {
    if is_void::<P::Output>() {
      return;
    }

    if !self.receiver_count.release() {
      return;
    }

    // Releasing the count can let a send start the stage before this check,
    // so re-test RUNNING under the lock before kicking a drain step.
    let do_run: bool = {
      let mut internal = self.internal.lock();

      let do_run: bool = (!internal.queue.is_empty()
        || internal.flags.contains(StageFlags::CLOSING))
        && !internal.flags.contains(StageFlags::RUNNING);

      if do_run {
        internal.flags.insert(StageFlags::RUNNING);
      }

      do_run
    };

    tracing::debug!("receivers released");

    if do_run {
      self.schedule();
    }
  }

  fn executor(&self) -> ExecutorRef {
    Arc::clone(&self.executor)
  }
}
