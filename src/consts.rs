//! Runtime tuning constants and default values.
//!
//! This module defines the initial capacities used by the channel runtime.
//! None of these affect semantics; they only control how much a stage
//! allocates up front before its buffers start growing.

// -----------------------------------------------------------------------------
// Memory Allocation
// -----------------------------------------------------------------------------

/// Initial capacity of a stage's input message queue.
///
/// A stage between two other stages holds at most one pending message at a
/// time under the flow-control protocol; only the head stage of a pipeline
/// can accumulate a deeper backlog from external producers.
pub const CAP_STAGE_QUEUE: usize = 8;

/// Initial capacity of a stage's downstream sender list.
///
/// Most pipelines are linear (one downstream per stage); fan-out beyond this
/// capacity reallocates under the downstream lock.
pub const CAP_STAGE_DOWNSTREAM: usize = 4;
