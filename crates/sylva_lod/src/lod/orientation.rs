//! Facing rotations for far proxies.

use glam::{Mat3, Quat, Vec3};
use rayon::prelude::*;
use rayon::ThreadPool;

/// World up used for every proxy.
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Rotation mapping local `+Z` onto `forward`, keeping local `+Y` as close
/// to `up` as possible.
///
/// A zero-length `forward` yields the identity. When `forward` is parallel
/// to `up` the shortest arc from `+Z` is used instead.
#[must_use]
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let Some(f) = forward.try_normalize() else {
        return Quat::IDENTITY;
    };
    let Some(x) = up.cross(f).try_normalize() else {
        return Quat::from_rotation_arc(Vec3::Z, f);
    };
    let y = f.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, f)).normalize()
}

/// Writes one facing rotation per far position, in parallel.
///
/// # Arguments
///
/// * `positions` - Far positions (ground offset already applied)
/// * `rotations` - Output, same length as `positions`
/// * `viewer` - Viewer position
pub fn orient_far(pool: &ThreadPool, positions: &[Vec3], rotations: &mut [Quat], viewer: Vec3) {
    debug_assert_eq!(positions.len(), rotations.len());

    pool.install(|| {
        rotations
            .par_iter_mut()
            .zip(positions.par_iter())
            .for_each(|(rotation, position)| {
                *rotation = look_rotation(*position - viewer, WORLD_UP);
            });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::ProxyQuad;

    fn pool() -> ThreadPool {
        rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap()
    }

    #[test]
    fn test_forward_maps_to_direction() {
        let direction = Vec3::new(3.0, 1.0, -4.0);
        let rotation = look_rotation(direction, WORLD_UP);

        assert!((rotation * Vec3::Z).abs_diff_eq(direction.normalize(), 1e-5));
        // Up stays in the plane spanned by forward and world up
        assert!((rotation * Vec3::Y).y > 0.0);
    }

    #[test]
    fn test_proxy_normal_faces_viewer() {
        let viewer = Vec3::new(0.0, 1.7, 0.0);
        let instance = Vec3::new(0.0, 1.7, 25.0);
        let rotation = look_rotation(instance - viewer, WORLD_UP);

        let facing = rotation * ProxyQuad::NORMAL;
        let to_viewer = (viewer - instance).normalize();
        assert!(facing.abs_diff_eq(to_viewer, 1e-5));
    }

    #[test]
    fn test_degenerate_directions() {
        assert_eq!(look_rotation(Vec3::ZERO, WORLD_UP), Quat::IDENTITY);

        let straight_up = look_rotation(Vec3::new(0.0, 8.0, 0.0), WORLD_UP);
        assert!((straight_up * Vec3::Z).abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn test_orient_far_parallel() {
        let positions: Vec<Vec3> = (0..1000)
            .map(|i| Vec3::new(i as f32, 0.0, 50.0))
            .collect();
        let mut rotations = vec![Quat::IDENTITY; positions.len()];

        orient_far(&pool(), &positions, &mut rotations, Vec3::ZERO);

        for (position, rotation) in positions.iter().zip(&rotations) {
            assert!((*rotation * Vec3::Z).abs_diff_eq(position.normalize(), 1e-4));
        }
    }
}
