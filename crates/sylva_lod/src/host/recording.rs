//! Headless host that records every call.
//!
//! Used by tests, benches and the demo in place of a graphics device.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec3;
use tracing::warn;

use super::{BatchId, CaptureRequest, RenderHost, ShadowFlags, TextureId};
use crate::mesh::{DetailMesh, MaterialId, ProxyVertex};

/// One recorded host call.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    /// Detailed mesh drawn.
    DrawDetailed {
        /// World position.
        position: Vec3,
        /// Number of materials drawn with.
        materials: usize,
    },
    /// Batch uploaded.
    Upload {
        /// New batch.
        batch: BatchId,
        /// Vertex count.
        vertices: usize,
        /// Index count.
        indices: usize,
    },
    /// Batch rewritten in place.
    Rewrite {
        /// Rewritten batch.
        batch: BatchId,
        /// Vertex count.
        vertices: usize,
        /// Index count.
        indices: usize,
    },
    /// Batch released.
    Release {
        /// Released batch.
        batch: BatchId,
    },
    /// Batch drawn.
    DrawProxy {
        /// Drawn batch.
        batch: BatchId,
        /// Texture bound.
        texture: Option<TextureId>,
        /// Shadow flags.
        shadows: ShadowFlags,
    },
    /// Snapshot captured.
    Capture {
        /// Returned texture.
        texture: TextureId,
        /// View direction.
        forward: Vec3,
        /// Snapshot eye.
        eye: Vec3,
    },
    /// Texture released.
    ReleaseTexture {
        /// Released texture.
        texture: TextureId,
    },
}

/// Contents of a live batch.
#[derive(Debug, Clone, Default)]
pub struct BatchRecord {
    /// Combined vertices.
    pub vertices: Vec<ProxyVertex>,
    /// Combined indices.
    pub indices: Vec<u32>,
}

/// Host that keeps live batches and textures in memory and logs calls.
#[derive(Debug, Default)]
pub struct RecordingHost {
    calls: Vec<HostCall>,
    batches: BTreeMap<BatchId, BatchRecord>,
    textures: BTreeSet<TextureId>,
    next_batch: u64,
    next_texture: u64,
}

impl RecordingHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls recorded since the last [`clear_calls`](Self::clear_calls).
    #[must_use]
    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    /// Empties the call log. Live batches and textures are kept.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of batches uploaded and not yet released.
    #[must_use]
    pub fn live_batches(&self) -> usize {
        self.batches.len()
    }

    /// Number of textures captured and not yet released.
    #[must_use]
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Contents of a live batch.
    #[must_use]
    pub fn batch(&self, id: BatchId) -> Option<&BatchRecord> {
        self.batches.get(&id)
    }

    /// Detailed draws in the log.
    #[must_use]
    pub fn detailed_draws(&self) -> usize {
        self.count(|c| matches!(c, HostCall::DrawDetailed { .. }))
    }

    /// Proxy batch draws in the log.
    #[must_use]
    pub fn proxy_draws(&self) -> usize {
        self.count(|c| matches!(c, HostCall::DrawProxy { .. }))
    }

    /// Draws of either kind in the log.
    #[must_use]
    pub fn draw_calls(&self) -> usize {
        self.detailed_draws() + self.proxy_draws()
    }

    /// Snapshot captures in the log.
    #[must_use]
    pub fn captures(&self) -> usize {
        self.count(|c| matches!(c, HostCall::Capture { .. }))
    }

    /// Uploads and rewrites in the log.
    #[must_use]
    pub fn batch_writes(&self) -> usize {
        self.count(|c| matches!(c, HostCall::Upload { .. } | HostCall::Rewrite { .. }))
    }

    fn count(&self, predicate: impl Fn(&HostCall) -> bool) -> usize {
        self.calls.iter().filter(|c| predicate(c)).count()
    }
}

impl RenderHost for RecordingHost {
    fn draw_detailed(
        &mut self,
        _mesh: &DetailMesh,
        materials: &[MaterialId],
        position: Vec3,
        _shadows: ShadowFlags,
    ) {
        self.calls.push(HostCall::DrawDetailed {
            position,
            materials: materials.len(),
        });
    }

    fn upload_proxy_batch(&mut self, vertices: &[ProxyVertex], indices: &[u32]) -> BatchId {
        let batch = BatchId(self.next_batch);
        self.next_batch += 1;
        self.batches.insert(
            batch,
            BatchRecord {
                vertices: vertices.to_vec(),
                indices: indices.to_vec(),
            },
        );
        self.calls.push(HostCall::Upload {
            batch,
            vertices: vertices.len(),
            indices: indices.len(),
        });
        batch
    }

    fn rewrite_proxy_batch(&mut self, batch: BatchId, vertices: &[ProxyVertex], indices: &[u32]) {
        match self.batches.get_mut(&batch) {
            Some(record) => {
                record.vertices.clear();
                record.vertices.extend_from_slice(vertices);
                record.indices.clear();
                record.indices.extend_from_slice(indices);
            }
            None => warn!(batch = batch.0, "rewrite of unknown batch"),
        }
        self.calls.push(HostCall::Rewrite {
            batch,
            vertices: vertices.len(),
            indices: indices.len(),
        });
    }

    fn release_proxy_batch(&mut self, batch: BatchId) {
        if self.batches.remove(&batch).is_none() {
            warn!(batch = batch.0, "release of unknown batch");
        }
        self.calls.push(HostCall::Release { batch });
    }

    fn draw_proxy_batch(
        &mut self,
        batch: BatchId,
        texture: Option<TextureId>,
        shadows: ShadowFlags,
    ) {
        self.calls.push(HostCall::DrawProxy {
            batch,
            texture,
            shadows,
        });
    }

    fn capture_snapshot(&mut self, request: &CaptureRequest<'_>) -> TextureId {
        let texture = TextureId(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(texture);
        self.calls.push(HostCall::Capture {
            texture,
            forward: request.forward,
            eye: request.eye,
        });
        texture
    }

    fn release_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
        self.calls.push(HostCall::ReleaseTexture { texture });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_lifecycle() {
        let mut host = RecordingHost::new();
        let vertices = [ProxyVertex::default(); 4];

        let batch = host.upload_proxy_batch(&vertices, &[0, 3, 1, 3, 0, 2]);
        assert_eq!(host.live_batches(), 1);

        host.rewrite_proxy_batch(batch, &vertices[..0], &[]);
        assert!(host.batch(batch).unwrap().vertices.is_empty());

        host.release_proxy_batch(batch);
        assert_eq!(host.live_batches(), 0);
        assert_eq!(host.batch_writes(), 2);
    }

    #[test]
    fn test_call_counters() {
        let mut host = RecordingHost::new();
        let mesh = DetailMesh::default();

        host.draw_detailed(&mesh, &[MaterialId(0)], Vec3::ZERO, ShadowFlags::default());
        host.draw_proxy_batch(BatchId(0), None, ShadowFlags::default());
        assert_eq!(host.draw_calls(), 2);

        host.clear_calls();
        assert_eq!(host.draw_calls(), 0);
    }
}
