//! Synchronization primitives used by the channel runtime.

mod counter;

pub use self::counter::RefCounter;
