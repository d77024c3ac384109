//! # Render Host
//!
//! The capability interface the engine drives. The host owns the graphics
//! device: it uploads and draws combined proxy batches, draws detailed
//! meshes, and renders proxy texture snapshots. The engine only decides
//! what to call and when.
//!
//! ```text
//!   ProxyRenderer ──► RenderHost
//!        │              ├── draw_detailed        (near + transitioning)
//!        │              ├── upload/rewrite/release_proxy_batch
//!        │              ├── draw_proxy_batch     (committed groups)
//!        │              └── capture_snapshot     (proxy texture)
//! ```

mod recording;

pub use recording::{BatchRecord, HostCall, RecordingHost};

use glam::{Quat, Vec3};

use crate::mesh::{DetailMesh, MaterialId, ProxyVertex};

/// Host-side handle of an uploaded combined proxy batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct BatchId(pub u64);

/// Host-side handle of a captured proxy texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct TextureId(pub u64);

/// Shadow participation of a draw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShadowFlags {
    /// Casts shadows.
    pub cast: bool,
    /// Receives shadows.
    pub receive: bool,
}

/// Everything the host needs to render one proxy texture snapshot.
///
/// The snapshot camera is orthographic, square, and cleared to transparent.
#[derive(Debug, Clone, Copy)]
pub struct CaptureRequest<'a> {
    /// Recentred detailed mesh, drawn at the origin.
    pub mesh: &'a DetailMesh,
    /// Materials, one per submesh.
    pub materials: &'a [MaterialId],
    /// Snapshot camera position.
    pub eye: Vec3,
    /// Snapshot camera rotation (the viewer's rotation).
    pub rotation: Quat,
    /// Snapshot view direction.
    pub forward: Vec3,
    /// Orthographic half-size.
    pub ortho_half_size: f32,
    /// Square texture edge in pixels.
    pub resolution: u32,
    /// Light rotation at capture time, if the scene has a light.
    pub light: Option<Quat>,
}

/// Rendering capabilities supplied by the host application.
///
/// Calls arrive on the thread that owns the renderer, never from workers.
pub trait RenderHost {
    /// Draws the detailed mesh once at `position` with every material.
    fn draw_detailed(
        &mut self,
        mesh: &DetailMesh,
        materials: &[MaterialId],
        position: Vec3,
        shadows: ShadowFlags,
    );

    /// Uploads a new combined proxy batch.
    fn upload_proxy_batch(&mut self, vertices: &[ProxyVertex], indices: &[u32]) -> BatchId;

    /// Clears an existing batch and writes new contents into it.
    fn rewrite_proxy_batch(&mut self, batch: BatchId, vertices: &[ProxyVertex], indices: &[u32]);

    /// Releases a batch. It is never drawn again.
    fn release_proxy_batch(&mut self, batch: BatchId);

    /// Draws a committed batch with the current proxy texture.
    fn draw_proxy_batch(
        &mut self,
        batch: BatchId,
        texture: Option<TextureId>,
        shadows: ShadowFlags,
    );

    /// Renders a proxy texture snapshot.
    fn capture_snapshot(&mut self, request: &CaptureRequest<'_>) -> TextureId;

    /// Releases a texture returned by [`capture_snapshot`](Self::capture_snapshot).
    fn release_texture(&mut self, texture: TextureId);
}
