use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result;

use crate::error::fatal;
use crate::loom::sync::atomic::AtomicUsize;
use crate::loom::sync::atomic::Ordering;

/// An atomic reference counter with zero-transition detection.
///
/// Backs the sender and receiver counts of a pipeline stage: handles call
/// [`increment`] on clone and [`release`] on drop, and exactly one caller
/// observes the final 1→0 transition, which drives the stage lifecycle.
///
/// [`increment`]: RefCounter::increment
/// [`release`]: RefCounter::release
#[repr(transparent)]
pub struct RefCounter {
  inner: AtomicUsize,
}

impl RefCounter {
  /// Creates a new `RefCounter` with the given initial count.
  #[inline]
  pub fn new(initial: usize) -> Self {
    Self {
      inner: AtomicUsize::new(initial),
    }
  }

  /// Returns the current count.
  #[inline]
  pub fn get(&self) -> usize {
    self.inner.load(Ordering::Acquire)
  }

  /// Adds one reference to the counter.
  #[inline]
  pub fn increment(&self) {
    self.inner.fetch_add(1, Ordering::Relaxed);
  }

  /// Removes one reference from the counter.
  ///
  /// Returns `true` iff this call performed the final 1→0 transition. The
  /// release ordering pairs with the acquire load in [`get`], so work done
  /// before a release is visible to whoever observes the zero.
  ///
  /// [`get`]: RefCounter::get
  #[inline]
  pub fn release(&self) -> bool {
    let previous: usize = self.inner.fetch_sub(1, Ordering::AcqRel);

    if previous == 0 {
      fatal!("reference counter underflow");
    }

    previous == 1
  }
}

impl Debug for RefCounter {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    Debug::fmt(&self.inner, f)
  }
}

#[cfg(all(test, not(loom)))]
mod tests {
  use super::*;

  #[test]
  fn test_zero_transition() {
    let counter: RefCounter = RefCounter::new(2);

    assert!(!counter.release());
    assert!(counter.release());
    assert_eq!(counter.get(), 0);
  }

  #[test]
  fn test_increment_defers_zero() {
    let counter: RefCounter = RefCounter::new(1);

    counter.increment();
    assert!(!counter.release());
    assert!(counter.release());
  }

  #[test]
  fn test_concurrent_release_reports_zero_once() {
    use std::sync::Arc;
    use std::thread;

    let counter: Arc<RefCounter> = Arc::new(RefCounter::new(8));

    let zeroes: usize = (0..8)
      .map(|_| {
        let counter: Arc<RefCounter> = Arc::clone(&counter);
        thread::spawn(move || counter.release())
      })
      .collect::<Vec<_>>()
      .into_iter()
      .map(|handle| handle.join().unwrap())
      .filter(|zero| *zero)
      .count();

    assert_eq!(zeroes, 1);
  }
}
