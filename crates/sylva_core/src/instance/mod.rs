//! # Instances
//!
//! One object type's instance set: positions, plus one representation
//! phase per instance.

mod phase;
mod store;

pub use phase::Phase;
pub use store::InstanceStore;
