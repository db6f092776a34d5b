//! Error handling utilities for runtime errors.

mod macros;

pub(crate) use self::macros::fatal;
pub(crate) use self::macros::raise;
