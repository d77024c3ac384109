//! Model bounds used to size and anchor the proxy quad.

use glam::Vec3;

use crate::error::{LodError, LodResult};

/// Extents of a recentred detailed mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelBounds {
    /// Highest vertex y.
    pub height_positive: f32,
    /// Lowest vertex y.
    pub height_negative: f32,
    /// Largest vertex distance from the origin.
    pub side_max: f32,
    /// Vertical midpoint, on the y axis.
    pub center: Vec3,
    /// Bounding radius. The proxy quad edge is `2 * max_size`.
    pub max_size: f32,
}

impl ModelBounds {
    /// Measures a set of recentred vertices.
    ///
    /// # Errors
    ///
    /// [`LodError::MissingMesh`] for an empty slice and
    /// [`LodError::DegenerateMesh`] if the radius is zero or not finite.
    pub fn from_vertices(vertices: &[Vec3]) -> LodResult<Self> {
        if vertices.is_empty() {
            return Err(LodError::MissingMesh);
        }

        let mut height_positive = f32::MIN;
        let mut height_negative = f32::MAX;
        let mut side_max_sq = 0.0_f32;

        for v in vertices {
            height_positive = height_positive.max(v.y);
            height_negative = height_negative.min(v.y);
            side_max_sq = side_max_sq.max(v.length_squared());
        }

        let side_max = side_max_sq.sqrt();
        let center = Vec3::new(0.0, (height_positive + height_negative) * 0.5, 0.0);
        let max_size = side_max
            .max(height_positive - center.y)
            .max(center.y - height_negative);

        if !max_size.is_finite() || max_size <= 0.0 {
            return Err(LodError::DegenerateMesh { max_size });
        }

        Ok(Self {
            height_positive,
            height_negative,
            side_max,
            center,
            max_size,
        })
    }

    /// Offset applied to far positions in ground-anchored mode.
    #[inline]
    #[must_use]
    pub fn ground_offset(&self) -> Vec3 {
        Vec3::new(0.0, -self.max_size, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_box_bounds() {
        let vertices = [
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, -1.0, 0.0),
        ];
        let bounds = ModelBounds::from_vertices(&vertices).unwrap();

        assert!((bounds.height_positive - 1.0).abs() < 1e-6);
        assert!((bounds.height_negative + 1.0).abs() < 1e-6);
        assert!((bounds.side_max - 3.0_f32.sqrt()).abs() < 1e-6);
        assert_eq!(bounds.center, Vec3::ZERO);
        assert!((bounds.max_size - 3.0_f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_thin_pole_bounds() {
        let vertices = [Vec3::new(0.0, -5.0, 0.0), Vec3::new(0.0, 5.0, 0.0)];
        let bounds = ModelBounds::from_vertices(&vertices).unwrap();
        assert!((bounds.max_size - 5.0).abs() < 1e-6);
        assert_eq!(bounds.ground_offset(), Vec3::new(0.0, -5.0, 0.0));
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(matches!(
            ModelBounds::from_vertices(&[]),
            Err(LodError::MissingMesh)
        ));
        assert!(matches!(
            ModelBounds::from_vertices(&[Vec3::ZERO, Vec3::ZERO]),
            Err(LodError::DegenerateMesh { .. })
        ));
    }
}
