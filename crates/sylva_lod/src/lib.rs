//! # SYLVA LOD Engine
//!
//! Renders very large populations of repeated static objects by switching
//! each instance between its detailed mesh and a flat, camera-facing proxy,
//! and by merging thousands of proxies into a handful of combined batches.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      PER FRAME (sync)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  InstanceStore → Classifier → near / far / transitioning    │
//! │                                 ↓                           │
//! │                         orient_far (parallel)               │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   ACROSS FRAMES (async)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  BuildHandle: stage ║ expand  (worker pool)                 │
//! │       ↓                                                     │
//! │  BatchScheduler → one group per frame → RenderHost          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//!
//! - No instance jumps between detailed and proxy without a transition phase
//! - A group becomes visible only after its whole build has joined
//! - At most one build in flight per renderer
//! - Disposal is idempotent

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod batch;
pub mod capture;
pub mod config;
pub mod error;
pub mod host;
pub mod lod;
pub mod mesh;
pub mod renderer;
pub mod stats;
pub mod viewer;

pub use batch::{BatchGroup, BatchScheduler, BuildHandle, StepOutcome};
pub use capture::CaptureTrigger;
pub use config::ProxyTypeConfig;
pub use error::{LodError, LodResult};
pub use host::{
    BatchId, CaptureRequest, HostCall, RecordingHost, RenderHost, ShadowFlags, TextureId,
};
pub use lod::{ClassCounts, Classifier, FarSet, Membership, Zone};
pub use mesh::{DetailMesh, MaterialId, ModelBounds, ProxyQuad, ProxyVertex};
pub use renderer::ProxyRenderer;
pub use stats::FrameStats;
pub use viewer::{SceneView, Viewer};

pub use sylva_core::Phase;
