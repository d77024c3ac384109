//! # SYLVA Core
//!
//! Instance storage shared by the SYLVA LOD engine:
//! - Owned buffers with copy-discard-reallocate resizing
//! - The per-instance representation [`Phase`]
//! - The [`InstanceStore`] holding one object type's positions and phases
//!
//! ## Architecture Rules
//!
//! 1. **One owner per buffer** - A store belongs to exactly one renderer
//! 2. **Wholesale replacement** - Instances are never added one at a time
//! 3. **Idempotent disposal** - Releasing twice is a no-op
//!
//! ## Example
//!
//! ```rust
//! use glam::Vec3;
//! use sylva_core::{InstanceStore, Phase};
//!
//! let mut store = InstanceStore::new(Vec3::ZERO);
//! store.replace(&[Vec3::new(1.0, 0.0, 5.0)]);
//! assert_eq!(store.phases()[0], Phase::Uninitialized);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod instance;
pub mod memory;

pub use instance::{InstanceStore, Phase};
pub use memory::OwnedBuffer;
