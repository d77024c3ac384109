//! # Proxy Batching
//!
//! Merges the far set into a few combined draw batches and feeds them to
//! the host incrementally.
//!
//! A build runs in the background as a two-stage pipeline per group; the
//! [`BatchScheduler`] polls it each frame and commits finished groups one
//! per frame.

mod build;
mod group;
mod scheduler;

pub use build::BuildHandle;
pub use group::{build_generation, group_count, group_ranges, BatchGroup, StagedGroup};
pub use scheduler::{BatchScheduler, StepOutcome};
