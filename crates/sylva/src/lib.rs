//! # SYLVA
//!
//! Scene-level owner of the proxy LOD engine: one renderer per object
//! type, one shared worker pool, one inbox for position sets produced on
//! other threads.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         ProxyRegistry                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  PositionInbox ──► drain_inbox ──► ProxyRenderer (type #1)      │
//! │  (any thread)                      ProxyRenderer (type #2)      │
//! │                                    ...                          │
//! │                 ThreadPool "sylva-worker-N" (shared builds)     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: TOML registry configuration
//! - `inbox`: cross-thread position submission
//! - `registry`: renderers keyed by type id

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod inbox;
pub mod registry;

// Re-export the engine crates
pub use sylva_core as core;
pub use sylva_lod as lod;

pub use config::{RegistryConfig, TypeEntry};
pub use error::{RegistryError, RegistryResult};
pub use inbox::{PositionInbox, PositionSender, PositionUpdate};
pub use registry::{ProxyRegistry, ProxyTypeId, TypeAssets};
