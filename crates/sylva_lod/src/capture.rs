//! # Proxy Texture Capture
//!
//! Decides when the proxy texture must be re-rendered. The render itself
//! belongs to the host.
//!
//! A capture fires when the camera has turned past its threshold since the
//! last capture, or otherwise when the light has turned past its own
//! (larger) threshold. The reference rotation only moves when a capture
//! fires, so slow drift triggers exactly one capture once it adds up.

use glam::{Quat, Vec3};

use crate::config::ProxyTypeConfig;
use crate::host::CaptureRequest;
use crate::mesh::{DetailMesh, MaterialId, ModelBounds};
use crate::viewer::SceneView;

/// Angular change detector for camera and light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureTrigger {
    camera_threshold: f32,
    light_threshold: f32,
    last_camera: Quat,
    last_light: Option<Quat>,
}

impl CaptureTrigger {
    /// Creates a trigger from thresholds in degrees.
    #[must_use]
    pub fn new(camera_threshold_deg: f32, light_threshold_deg: f32) -> Self {
        Self {
            camera_threshold: camera_threshold_deg.to_radians(),
            light_threshold: light_threshold_deg.to_radians(),
            last_camera: Quat::IDENTITY,
            last_light: None,
        }
    }

    /// Creates a trigger from a type's configuration.
    #[must_use]
    pub fn from_config(config: &ProxyTypeConfig) -> Self {
        Self::new(config.camera_angle_threshold_deg, config.light_angle_threshold_deg)
    }

    /// Records the current rotations as captured.
    pub fn reset(&mut self, view: &SceneView) {
        self.last_camera = view.viewer.rotation;
        self.last_light = view.light;
    }

    /// Returns true if a capture is due, and records it as taken.
    pub fn check(&mut self, view: &SceneView) -> bool {
        let camera = view.viewer.rotation;
        if self.last_camera.angle_between(camera) > self.camera_threshold {
            self.last_camera = camera;
            return true;
        }

        let Some(light) = view.light else {
            return false;
        };
        let turned = self
            .last_light
            .map_or(true, |last| last.angle_between(light) > self.light_threshold);
        if turned {
            self.last_light = Some(light);
        }
        turned
    }
}

/// Builds the snapshot request for the current view.
///
/// The snapshot camera looks along the viewer's forward direction and sits
/// far enough back from the model centre to clear its bounding radius.
#[must_use]
pub fn capture_request<'a>(
    mesh: &'a DetailMesh,
    materials: &'a [MaterialId],
    bounds: &ModelBounds,
    view: &SceneView,
    resolution: u32,
) -> CaptureRequest<'a> {
    let forward = view.viewer.forward();
    let eye: Vec3 = bounds.center - forward * (bounds.max_size + view.viewer.near_clip);

    CaptureRequest {
        mesh,
        materials,
        eye,
        rotation: view.viewer.rotation,
        forward,
        ortho_half_size: bounds.max_size,
        resolution,
        light: view.light,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::Viewer;

    fn view_yaw(degrees: f32) -> SceneView {
        SceneView::new(Viewer::new(Vec3::ZERO, Quat::from_rotation_y(degrees.to_radians())))
    }

    #[test]
    fn test_small_turns_accumulate_into_one_capture() {
        let mut trigger = CaptureTrigger::new(2.0, 5.0);
        trigger.reset(&view_yaw(0.0));

        assert!(!trigger.check(&view_yaw(1.0)));
        assert!(!trigger.check(&view_yaw(1.9)));
        assert!(trigger.check(&view_yaw(2.5)));
        // Reference moved to 2.5 degrees
        assert!(!trigger.check(&view_yaw(3.0)));
    }

    #[test]
    fn test_large_turn_captures_once() {
        let mut trigger = CaptureTrigger::new(2.0, 5.0);
        trigger.reset(&view_yaw(0.0));

        assert!(trigger.check(&view_yaw(30.0)));
        assert!(!trigger.check(&view_yaw(30.0)));
    }

    #[test]
    fn test_light_threshold() {
        let mut trigger = CaptureTrigger::new(2.0, 5.0);
        let base = view_yaw(0.0).with_light(Quat::IDENTITY);
        trigger.reset(&base);

        let slight = view_yaw(0.0).with_light(Quat::from_rotation_x(3_f32.to_radians()));
        assert!(!trigger.check(&slight));

        let strong = view_yaw(0.0).with_light(Quat::from_rotation_x(6_f32.to_radians()));
        assert!(trigger.check(&strong));
        assert!(!trigger.check(&strong));
    }

    #[test]
    fn test_request_geometry() {
        let mesh = DetailMesh::new(
            vec![Vec3::new(0.0, -1.0, 0.0), Vec3::new(0.0, 3.0, 0.0)],
            vec![],
        );
        let (mesh, _) = mesh.recentred();
        let bounds = ModelBounds::from_vertices(&mesh.vertices).unwrap();
        let view = SceneView::new(Viewer::new(Vec3::new(5.0, 5.0, 5.0), Quat::IDENTITY));

        let request = capture_request(&mesh, &[], &bounds, &view, 64);

        assert!(request.forward.abs_diff_eq(Vec3::Z, 1e-6));
        let expected_eye = bounds.center - Vec3::Z * (bounds.max_size + view.viewer.near_clip);
        assert!(request.eye.abs_diff_eq(expected_eye, 1e-6));
        assert!((request.ortho_half_size - 2.0).abs() < 1e-6);
    }
}
