//! Camera framing constants.

use serde::{Deserialize, Serialize};

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

/// How the perspective camera frames the mesh.
///
/// In landscape windows the camera keeps `min_y_ratio` world units visible
/// above the center; in portrait windows it keeps `min_x_ratio` units visible
/// to the side instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
#[serde(default)]
pub struct CameraFraming {
    /// Vertical field of view in degrees (default: 45)
    pub fov_degrees: f32,
    /// Half-height kept visible in landscape (default: 0.9)
    pub min_y_ratio: f32,
    /// Half-width kept visible in portrait (default: 0.7)
    pub min_x_ratio: f32,
    /// Near clip distance (default: 0.1)
    pub near: f32,
    /// Far clip distance (default: 1000)
    pub far: f32,
}

impl Default for CameraFraming {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            min_y_ratio: 0.9,
            min_x_ratio: 0.7,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraFraming {
    /// Vertical field of view in radians.
    pub fn fov_radians(&self) -> f32 {
        self.fov_degrees.to_radians()
    }

    /// Half-height of the view at the framed depth for the given aspect ratio.
    pub fn visible_half_height(&self, aspect: f32) -> f32 {
        if aspect >= 1.0 {
            self.min_y_ratio
        } else {
            self.min_x_ratio / aspect.max(f32::EPSILON)
        }
    }

    /// Camera distance from a plane at `front_z` so the framed extent fits.
    pub fn camera_distance(&self, aspect: f32, front_z: f32) -> f32 {
        self.visible_half_height(aspect) / (self.fov_radians() / 2.0).tan() + front_z
    }
}
