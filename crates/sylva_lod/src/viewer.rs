//! Viewer and light state sampled once per frame.

use glam::{Quat, Vec3};

use crate::lod::{look_rotation, WORLD_UP};

/// Default near clip distance of the snapshot camera.
pub const DEFAULT_NEAR_CLIP: f32 = 0.3;

/// The camera the LOD decisions are made for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewer {
    /// World position.
    pub position: Vec3,
    /// World rotation; local `+Z` is forward.
    pub rotation: Quat,
    /// Near clip distance, used to place the snapshot camera.
    pub near_clip: f32,
}

impl Viewer {
    /// Creates a viewer with the default near clip.
    #[must_use]
    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            near_clip: DEFAULT_NEAR_CLIP,
        }
    }

    /// Creates a viewer at `position` looking at `target`.
    #[must_use]
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        Self::new(position, look_rotation(target - position, WORLD_UP))
    }

    /// View direction.
    #[inline]
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

/// Everything a renderer reads from the scene each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SceneView {
    /// Main camera.
    pub viewer: Viewer,
    /// Directional light rotation, if the scene has one.
    pub light: Option<Quat>,
}

impl SceneView {
    /// Creates a view without a light.
    #[must_use]
    pub const fn new(viewer: Viewer) -> Self {
        Self {
            viewer,
            light: None,
        }
    }

    /// Adds a directional light.
    #[must_use]
    pub const fn with_light(mut self, light: Quat) -> Self {
        self.light = Some(light);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looking_at() {
        let viewer = Viewer::looking_at(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0));
        assert!(viewer.forward().abs_diff_eq(Vec3::X, 1e-5));
    }
}
