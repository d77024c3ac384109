//! # Level of Detail
//!
//! Per-frame, synchronous half of the engine: distance classification and
//! facing rotations for far proxies. Both are O(n) and run on the worker
//! pool while the frame waits.

mod classify;
mod orientation;

pub use classify::{ClassCounts, Classifier, FarSet, Membership, Zone};
pub use orientation::{look_rotation, orient_far, WORLD_UP};
