//! Proxy quad geometry and the combined-buffer vertex format.

use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec2, Vec3};

use super::bounds::ModelBounds;

/// Two triangles over the four quad corners.
pub const QUAD_INDICES: [u32; 6] = [0, 3, 1, 3, 0, 2];

/// Unit quad corners (position, uv), bottom row first.
const UNIT_CORNERS: [(Vec3, Vec2); 4] = [
    (Vec3::new(-0.5, -0.5, 0.0), Vec2::new(0.0, 0.0)),
    (Vec3::new(0.5, -0.5, 0.0), Vec2::new(1.0, 0.0)),
    (Vec3::new(-0.5, 0.5, 0.0), Vec2::new(0.0, 1.0)),
    (Vec3::new(0.5, 0.5, 0.0), Vec2::new(1.0, 1.0)),
];

/// Vertex written into combined proxy buffers.
///
/// Uploaded as raw bytes (32 bytes, 4-byte aligned).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ProxyVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// World-space normal.
    pub normal: [f32; 3],
    /// Texture coordinate into the captured proxy texture.
    pub uv: [f32; 2],
}

impl ProxyVertex {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Creates a vertex from glam vectors.
    #[inline]
    #[must_use]
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        }
    }

    /// Position as a vector.
    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    /// Normal as a vector.
    #[inline]
    #[must_use]
    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }
}

/// The flat quad every far instance is drawn as, already scaled to the
/// model and lifted in ground-anchored mode.
///
/// Its normal is local `-Z`, so a rotation mapping `+Z` away from the
/// viewer leaves the visible face pointing back at them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProxyQuad {
    corners: [Vec3; 4],
    uvs: [Vec2; 4],
}

impl ProxyQuad {
    /// Vertices per quad.
    pub const VERTEX_COUNT: usize = 4;

    /// Indices per quad.
    pub const INDEX_COUNT: usize = QUAD_INDICES.len();

    /// Local facing normal.
    pub const NORMAL: Vec3 = Vec3::NEG_Z;

    /// Builds the quad for a model.
    ///
    /// Edge length is `2 * max_size`. In ground-anchored mode the quad is
    /// lifted by half its height so its bottom edge sits at the origin.
    #[must_use]
    pub fn new(bounds: &ModelBounds, ground_anchored: bool) -> Self {
        let scale = 2.0 * bounds.max_size;
        let lift = if ground_anchored { 0.5 } else { 0.0 };

        let mut corners = [Vec3::ZERO; 4];
        let mut uvs = [Vec2::ZERO; 4];
        for (i, (corner, uv)) in UNIT_CORNERS.iter().enumerate() {
            corners[i] = (*corner + Vec3::new(0.0, lift, 0.0)) * scale;
            uvs[i] = *uv;
        }

        Self { corners, uvs }
    }

    /// Local-space corner positions.
    #[inline]
    #[must_use]
    pub const fn corners(&self) -> &[Vec3; 4] {
        &self.corners
    }

    /// Writes one transformed copy of the quad.
    ///
    /// # Arguments
    ///
    /// * `slot` - Position of the instance inside its group
    /// * `position` - Instance world position
    /// * `rotation` - Instance facing rotation
    /// * `vertices` - Exactly [`Self::VERTEX_COUNT`] output vertices
    /// * `indices` - Exactly [`Self::INDEX_COUNT`] output indices
    #[inline]
    pub fn write_instance(
        &self,
        slot: u32,
        position: Vec3,
        rotation: Quat,
        vertices: &mut [ProxyVertex],
        indices: &mut [u32],
    ) {
        let normal = rotation * Self::NORMAL;
        for ((out, corner), uv) in vertices.iter_mut().zip(&self.corners).zip(&self.uvs) {
            *out = ProxyVertex::new(position + rotation * *corner, normal, *uv);
        }

        let base = slot * Self::VERTEX_COUNT as u32;
        for (out, index) in indices.iter_mut().zip(QUAD_INDICES) {
            *out = base + index;
        }
    }
}
