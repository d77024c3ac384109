//! # Memory Management
//!
//! Owned buffers with an explicit allocation lifecycle.
//!
//! ## Design Philosophy
//!
//! Buffers never grow in place. A length change discards the old storage
//! and allocates a new one; disposal goes through one path that tolerates
//! being called twice or before anything was allocated.

mod buffer;

pub use buffer::OwnedBuffer;
