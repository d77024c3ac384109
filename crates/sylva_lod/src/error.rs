//! # LOD Error Types
//!
//! All errors that can occur while configuring or driving a proxy renderer.

use thiserror::Error;

/// Errors that can occur in the LOD engine.
#[derive(Error, Debug)]
pub enum LodError {
    /// The detailed mesh has no vertices.
    #[error("missing detailed mesh: no vertices supplied")]
    MissingMesh,

    /// The detailed mesh has no materials to draw with.
    #[error("missing materials: detailed mesh needs at least one material")]
    MissingMaterials,

    /// The mesh bounds collapse to a point or contain non-finite values.
    #[error("degenerate mesh: bounding radius is {max_size}")]
    DegenerateMesh {
        /// The computed bounding radius.
        max_size: f32,
    },

    /// A batch build is still in flight; force-complete it first.
    #[error("a batch build is already in flight")]
    BuildInFlight,

    /// The worker dropped its result channel without a generation.
    #[error("batch build aborted before delivering its result")]
    BuildAborted,

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for LOD operations.
pub type LodResult<T> = Result<T, LodError>;
