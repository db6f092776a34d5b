use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

use crate::error::fatal;
use crate::process::Process;
use crate::process::ProcessState;

// -----------------------------------------------------------------------------
// Function Process
// -----------------------------------------------------------------------------

/// Lifts an ordinary unary function into the process protocol.
///
/// See [`FnProcess`].
#[inline]
pub fn lift<F, A, Y>(func: F) -> FnProcess<F, A>
where
  F: FnMut(A) -> Y + Send + 'static,
  A: Send + 'static,
  Y: Clone + Send + 'static,
{
  FnProcess { func, slot: None }
}

/// A one-to-one mapping function adapted to the process protocol.
///
/// [`accept`] stores the input; [`emit`] applies the function to it and
/// clears the slot; [`state`] flips between [`Await`] (slot empty) and
/// [`Yield`] (slot occupied). This lets a plain function run through the
/// same buffered execution model as a stateful process.
///
/// [`accept`]: Process::accept
/// [`emit`]: Process::emit
/// [`state`]: Process::state
/// [`Await`]: ProcessState::Await
/// [`Yield`]: ProcessState::Yield
pub struct FnProcess<F, A> {
  func: F,
  slot: Option<A>,
}

impl<F, A, Y> Process<A> for FnProcess<F, A>
where
  F: FnMut(A) -> Y + Send + 'static,
  A: Send + 'static,
  Y: Clone + Send + 'static,
{
  type Output = Y;

  fn accept(&mut self, input: A) {
    self.slot = Some(input);
  }

  fn emit(&mut self) -> Y {
    match self.slot.take() {
      Some(input) => (self.func)(input),
      None => fatal!("function process emitted without a pending input"),
    }
  }

  fn state(&self) -> ProcessState {
    if self.slot.is_some() {
      ProcessState::Yield
    } else {
      ProcessState::Await
    }
  }
}

impl<F, A> Debug for FnProcess<F, A> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.write_str("FnProcess(..)")
  }
}

// -----------------------------------------------------------------------------
// Identity
// -----------------------------------------------------------------------------

/// The pass-through process hosted by the head stage of a channel.
pub(crate) struct Identity<T> {
  slot: Option<T>,
}

impl<T> Identity<T> {
  #[inline]
  pub(crate) fn new() -> Self {
    Self { slot: None }
  }
}

impl<T> Process<T> for Identity<T>
where
  T: Clone + Send + 'static,
{
  type Output = T;

  fn accept(&mut self, input: T) {
    self.slot = Some(input);
  }

  fn emit(&mut self) -> T {
    match self.slot.take() {
      Some(value) => value,
      None => fatal!("identity process emitted without a pending input"),
    }
  }

  fn state(&self) -> ProcessState {
    if self.slot.is_some() {
      ProcessState::Yield
    } else {
      ProcessState::Await
    }
  }
}

impl<T> Debug for Identity<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.write_str("Identity(..)")
  }
}

#[cfg(all(test, not(loom)))]
mod tests {
  use super::*;

  #[test]
  fn test_function_process_states() {
    let mut process: FnProcess<_, i32> = lift(|x: i32| x * 2);

    assert_eq!(process.state(), ProcessState::Await);

    process.accept(21);
    assert_eq!(process.state(), ProcessState::Yield);

    assert_eq!(process.emit(), 42);
    assert_eq!(process.state(), ProcessState::Await);
  }

  #[test]
  fn test_identity_round_trip() {
    let mut process: Identity<&str> = Identity::new();

    process.accept("value");
    assert_eq!(process.state(), ProcessState::Yield);
    assert_eq!(process.emit(), "value");
  }
}
