//! Internal error handling macros.
//!
//! Provides two categories of error handling:
//!
//! - [`fatal!`]: For unrecoverable runtime bugs (invariant violations)
//! - [`raise!`]: For checked caller misuse of the channel API
//!
//! [`fatal!`]: crate::error::fatal
//! [`raise!`]: crate::error::raise

/// Displays a runtime error message and aborts the program.
///
/// Use this for unrecoverable errors that indicate bugs in the runtime
/// implementation itself. The program prints a diagnostic message and
/// immediately aborts without unwinding.
///
/// # Examples
///
/// ```ignore
/// if running && finalized {
///   fatal!("stage cannot run and finalize at once");
/// }
/// ```
macro_rules! fatal {
  ($error:expr) => {{
    ::std::eprintln!(
      "{}:{}: (SysInv) a channel invariant has been broken: {}",
      ::std::file!(),
      ::std::line!(),
      $error,
    );

    ::std::process::abort();
  }};
}

/// Panics with a checked caller error.
///
/// Use this for misuse of the public API that a caller can correct, such as
/// composing further stages onto a receiver whose yield type is `()`.
///
/// # Examples
///
/// ```ignore
/// if is_void::<T>() {
///   raise!(Error, Misuse, "cannot attach a stage to a void receiver");
/// }
/// ```
macro_rules! raise {
  (Error, Misuse, $error:expr) => {
    ::std::panic!(
      "{}:{}: (Misuse) invalid channel operation: {}",
      ::std::file!(),
      ::std::line!(),
      $error,
    )
  };
}

pub(crate) use fatal;
pub(crate) use raise;
