use std::cell::UnsafeCell;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

/// Unsynchronized storage for a stage's user process.
///
/// The process is deliberately not behind a lock: user code must run with no
/// stage lock held, because it may call straight back into the channel (for
/// example by sending into its own stage). Exclusive access is guaranteed by
/// the stage's run-state protocol instead of by the type system:
///
/// 1. A stage schedules at most one step at a time (the RUNNING flag), and
///    only the running step mutates the process.
/// 2. The flow-control path reads the process state only at the moment the
///    suspend count reaches zero under the stage lock, which can happen only
///    after the step performed its last process access.
/// 3. The lock handoffs between those two points establish the necessary
///    happens-before edges.
///
/// The cell holds an `Option` so the process can be dropped eagerly when the
/// stage finalizes, ahead of the stage allocation itself.
#[repr(transparent)]
pub(crate) struct StageCell<P> {
  inner: UnsafeCell<Option<P>>,
}

// SAFETY: StageCell is Send because ownership of the process moves with the
// cell and P is required to be Send at every construction site.
unsafe impl<P: Send> Send for StageCell<P> {}

// SAFETY: StageCell is Sync because all access goes through `with_mut`, whose
// callers uphold the exclusivity protocol documented on the type.
unsafe impl<P: Send> Sync for StageCell<P> {}

impl<P> StageCell<P> {
  #[inline]
  pub(crate) fn new(process: P) -> Self {
    Self {
      inner: UnsafeCell::new(Some(process)),
    }
  }

  /// Runs `f` with mutable access to the process slot.
  ///
  /// # Safety
  ///
  /// The caller must hold step exclusivity per the protocol documented on
  /// the type: either it is the stage's single running step, or it is the
  /// flow-control path observing the suspend count hit zero under the stage
  /// lock.
  #[inline]
  pub(crate) unsafe fn with_mut<F, R>(&self, f: F) -> R
  where
    F: FnOnce(&mut Option<P>) -> R,
  {
    // SAFETY: Exclusivity is guaranteed by the caller.
    f(unsafe { &mut *self.inner.get() })
  }
}

impl<P> Debug for StageCell<P> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.write_str("StageCell(..)")
  }
}
