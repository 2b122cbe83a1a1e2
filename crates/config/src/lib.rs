//! Shared configuration for Mochi
//!
//! This crate is the single source of truth for the tunable simulation
//! parameters, the camera framing constants, and the display settings shared
//! by the solver core and the desktop binary.

use serde::{Deserialize, Serialize};

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

mod camera;
mod simulation;

pub use camera::CameraFraming;
pub use simulation::{FalloffCurve, Quality, RotationShaping, SimulationConfig};

/// Default window width in pixels
pub const DEFAULT_WIDTH: u32 = 1280;

/// Default window height in pixels
pub const DEFAULT_HEIGHT: u32 = 800;

/// Default scale factor (1.0 = no scaling)
pub const DEFAULT_SCALE: f32 = 1.0;

/// Upper bound applied to the device pixel ratio in high quality.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Display configuration for window and rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
pub struct DisplayConfig {
    /// Window width in logical pixels
    pub width: u32,
    /// Window height in logical pixels
    pub height: u32,
    /// Scale factor for DPI scaling
    pub scale: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            scale: DEFAULT_SCALE,
        }
    }
}

impl DisplayConfig {
    /// Create a new display config with the given dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scale: DEFAULT_SCALE,
        }
    }

    /// Track a window resize given in logical pixels.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(0.0).round() as u32;
        self.height = height.max(0.0).round() as u32;
    }

    /// Width over height, falling back to 1.0 for a collapsed window.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }

    /// Get scaled width (for physical pixel calculations)
    pub fn scaled_width(&self) -> u32 {
        (self.width as f32 * self.scale) as u32
    }

    /// Get scaled height (for physical pixel calculations)
    pub fn scaled_height(&self) -> u32 {
        (self.height as f32 * self.scale) as u32
    }

    /// Apply the pixel ratio a quality level asks for.
    pub fn apply_quality(&mut self, quality: Quality, device_pixel_ratio: f32) {
        self.scale = quality.pixel_ratio(device_pixel_ratio);
    }
}
