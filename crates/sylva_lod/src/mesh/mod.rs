//! # Meshes
//!
//! The detailed mesh an object type is drawn with up close, its derived
//! bounds, and the flat proxy quad that replaces it at distance.

mod bounds;
mod quad;

pub use bounds::ModelBounds;
pub use quad::{ProxyQuad, ProxyVertex, QUAD_INDICES};

use glam::Vec3;

/// Host-side material handle. Opaque to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct MaterialId(pub u32);

/// Detailed mesh geometry, read but never modified by the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailMesh {
    /// Vertex positions in model space.
    pub vertices: Vec<Vec3>,
    /// Triangle list indices.
    pub indices: Vec<u32>,
}

impl DetailMesh {
    /// Creates a mesh from vertices and triangle indices.
    #[must_use]
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Returns true if the mesh has no vertices.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Centre of the axis-aligned bounding box, or zero for an empty mesh.
    #[must_use]
    pub fn aabb_center(&self) -> Vec3 {
        let Some(first) = self.vertices.first() else {
            return Vec3::ZERO;
        };
        let (min, max) = self
            .vertices
            .iter()
            .fold((*first, *first), |(min, max), v| (min.min(*v), max.max(*v)));
        (min + max) * 0.5
    }

    /// Returns a copy moved so its bounding-box centre sits at the origin,
    /// together with the removed offset.
    ///
    /// Adding the offset to an instance position puts the recentred mesh
    /// exactly where the original mesh would have been drawn.
    #[must_use]
    pub fn recentred(&self) -> (Self, Vec3) {
        let center = self.aabb_center();
        let vertices = self.vertices.iter().map(|v| *v - center).collect();
        (Self::new(vertices, self.indices.clone()), center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recentre_moves_box_to_origin() {
        let mesh = DetailMesh::new(
            vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 4.0, 6.0)],
            vec![],
        );
        let (centred, offset) = mesh.recentred();

        assert_eq!(offset, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(centred.vertices[0], Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(centred.aabb_center(), Vec3::ZERO);
    }

    #[test]
    fn test_empty_mesh_center() {
        assert_eq!(DetailMesh::default().aabb_center(), Vec3::ZERO);
    }
}
