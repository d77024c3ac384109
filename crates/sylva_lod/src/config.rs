//! # Proxy Type Configuration
//!
//! Per-object-type tuning. The struct is serde-ready; the registry reads it
//! from the `[types.lod]` table of its configuration file.
//!
//! Every field has a default, so an empty table is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::error::{LodError, LodResult};

/// Largest accepted proxy texture edge, in pixels.
pub const MAX_TEXTURE_RESOLUTION: u32 = 4096;

/// Default number of far instances merged into one batch group.
pub const DEFAULT_GROUP_CAPACITY: usize = 15_000;

/// Configuration for one object type's proxy renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyTypeConfig {
    /// Distance at which an instance switches to its proxy.
    pub lod_distance: f32,
    /// Keep the proxy's base at the instance origin instead of centring it.
    pub ground_anchored: bool,
    /// Detailed meshes and proxy batches cast shadows.
    pub cast_shadows: bool,
    /// Detailed meshes receive shadows. Proxies never do.
    pub receive_shadows: bool,
    /// Edge length of the square proxy texture.
    pub texture_resolution: u32,
    /// Maximum far instances per batch group.
    pub group_capacity: usize,
    /// Squared viewer movement that triggers a rebuild.
    pub camera_move_epsilon: f32,
    /// Camera rotation (degrees) that triggers a texture capture.
    pub camera_angle_threshold_deg: f32,
    /// Light rotation (degrees) that triggers a texture capture.
    pub light_angle_threshold_deg: f32,
}

impl ProxyTypeConfig {
    /// Creates the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lod_distance: 10.0,
            ground_anchored: false,
            cast_shadows: true,
            receive_shadows: true,
            texture_resolution: 128,
            group_capacity: DEFAULT_GROUP_CAPACITY,
            camera_move_epsilon: 1.0,
            camera_angle_threshold_deg: 2.0,
            light_angle_threshold_deg: 5.0,
        }
    }

    /// Squared LOD switch distance used by the classifier.
    #[inline]
    #[must_use]
    pub fn lod_distance_sq(&self) -> f32 {
        self.lod_distance * self.lod_distance
    }

    /// Checks every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`LodError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> LodResult<()> {
        if !self.lod_distance.is_finite() || self.lod_distance <= 0.0 {
            return Err(LodError::InvalidConfig(format!(
                "lod_distance must be positive and finite, got {}",
                self.lod_distance
            )));
        }
        if self.group_capacity == 0 {
            return Err(LodError::InvalidConfig(
                "group_capacity must be at least 1".to_string(),
            ));
        }
        if self.texture_resolution == 0 || self.texture_resolution > MAX_TEXTURE_RESOLUTION {
            return Err(LodError::InvalidConfig(format!(
                "texture_resolution must be in 1..={MAX_TEXTURE_RESOLUTION}, got {}",
                self.texture_resolution
            )));
        }
        if !self.camera_move_epsilon.is_finite() || self.camera_move_epsilon < 0.0 {
            return Err(LodError::InvalidConfig(format!(
                "camera_move_epsilon must be non-negative, got {}",
                self.camera_move_epsilon
            )));
        }
        for (name, value) in [
            ("camera_angle_threshold_deg", self.camera_angle_threshold_deg),
            ("light_angle_threshold_deg", self.light_angle_threshold_deg),
        ] {
            if !value.is_finite() || !(0.0..=180.0).contains(&value) {
                return Err(LodError::InvalidConfig(format!(
                    "{name} must be within 0..=180 degrees, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for ProxyTypeConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ProxyTypeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.group_capacity, 15_000);
        assert!((config.lod_distance_sq() - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let zero_capacity = ProxyTypeConfig {
            group_capacity: 0,
            ..ProxyTypeConfig::default()
        };
        assert!(matches!(zero_capacity.validate(), Err(LodError::InvalidConfig(_))));

        let negative = ProxyTypeConfig {
            lod_distance: -1.0,
            ..ProxyTypeConfig::default()
        };
        assert!(matches!(negative.validate(), Err(LodError::InvalidConfig(_))));

        let no_texture = ProxyTypeConfig {
            texture_resolution: 0,
            ..ProxyTypeConfig::default()
        };
        assert!(matches!(no_texture.validate(), Err(LodError::InvalidConfig(_))));

        let wide_angle = ProxyTypeConfig {
            light_angle_threshold_deg: 181.0,
            ..ProxyTypeConfig::default()
        };
        assert!(matches!(wide_angle.validate(), Err(LodError::InvalidConfig(_))));
    }
}
