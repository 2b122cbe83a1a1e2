//! Tunable simulation parameters.
//!
//! Values are configurable and should not be treated as magic numbers. Every
//! field can be changed while the simulation runs; none of them affects the
//! size of any solver buffer.

use serde::{Deserialize, Serialize};

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

use crate::MAX_PIXEL_RATIO;

/// Rendering/solver quality level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// Device pixel density (capped) and the higher relaxation count
    #[default]
    High,
    /// Pixel density 1 and the lower relaxation count
    Medium,
}

impl Quality {
    /// Parse from environment variable MOCHI_QUALITY
    pub fn from_env() -> Self {
        std::env::var("MOCHI_QUALITY")
            .map(|name| Self::from_name(&name))
            .unwrap_or_default()
    }

    /// `medium` selects medium; anything else falls back to high.
    pub fn from_name(name: &str) -> Self {
        match name {
            "medium" => Self::Medium,
            _ => Self::High,
        }
    }

    /// Number of constraint-relaxation iterations per frame.
    pub fn relaxation_iterations(&self, config: &SimulationConfig) -> usize {
        match self {
            Quality::High => config.max_iterations,
            Quality::Medium => config.min_iterations,
        }
    }

    /// Pixel ratio the renderer should use for the given device ratio.
    pub fn pixel_ratio(&self, device_pixel_ratio: f32) -> f32 {
        match self {
            Quality::High => device_pixel_ratio.min(MAX_PIXEL_RATIO),
            Quality::Medium => 1.0,
        }
    }

    /// The other quality level.
    pub fn toggled(&self) -> Self {
        match self {
            Quality::High => Quality::Medium,
            Quality::Medium => Quality::High,
        }
    }
}

/// Attenuation of the pointer pull with distance from the grabbed vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum FalloffCurve {
    /// Linear falloff: strength = 1 - distance/radius
    Linear = 0,
    /// Smooth falloff: hermite interpolation
    #[default]
    Smooth = 1,
    /// Sharp falloff: quadratic decay
    Sharp = 2,
    /// Constant: full strength within radius
    Constant = 3,
}

impl FalloffCurve {
    /// Calculate falloff strength at a given normalized distance (0.0 = center, 1.0 = edge).
    pub fn evaluate(&self, normalized_distance: f64) -> f64 {
        let d = normalized_distance.clamp(0.0, 1.0);
        match self {
            FalloffCurve::Linear => 1.0 - d,
            FalloffCurve::Smooth => {
                let t = 1.0 - d;
                t * t * (3.0 - 2.0 * t)
            }
            FalloffCurve::Sharp => {
                let t = 1.0 - d;
                t * t
            }
            FalloffCurve::Constant => 1.0,
        }
    }
}

/// Reshaping of the raw drag angle into the twist applied to the mesh.
///
/// The angle between the gesture's start and current directions is divided
/// by pi, raised to `exponent`, multiplied by `gain`, and capped at
/// `max_angle` radians. These are tuned by feel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationShaping {
    pub exponent: f32,
    pub gain: f32,
    pub max_angle: f32,
}

impl Default for RotationShaping {
    fn default() -> Self {
        Self {
            exponent: 2.5,
            gain: 2.0,
            max_angle: std::f32::consts::FRAC_PI_2,
        }
    }
}

impl RotationShaping {
    /// Map a raw angle in `0..=pi` to the applied twist angle.
    pub fn shape(&self, raw_angle: f32) -> f32 {
        let normalized = (raw_angle / std::f32::consts::PI).clamp(0.0, 1.0);
        (normalized.powf(self.exponent) * self.gain).min(self.max_angle)
    }
}

/// Simulation configuration resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
#[serde(default)]
pub struct SimulationConfig {
    /// Quality level (default: High)
    pub quality: Quality,
    /// Radius around the grabbed vertex affected by the pointer pull (default: 0.13)
    pub cursor_radius: f32,
    /// Attenuation of the pointer pull inside the radius (default: Smooth)
    pub cursor_falloff: FalloffCurve,
    /// Spring strength pulling vertices toward their rest shape (default: 25)
    pub tension: f32,
    /// Velocity damping (default: 60)
    pub damping: f32,
    /// Vertex mass; divides both tension and damping (default: 12)
    pub mass: f32,
    /// Relaxation iterations at medium quality (default: 40)
    pub min_iterations: usize,
    /// Relaxation iterations at high quality (default: 60)
    pub max_iterations: usize,
    /// Distance of the drag plane beyond the mesh's far extent (default: 0.2)
    pub pull_length: f32,
    /// Twist angle reshaping (default: exponent 2.5, gain 2, cap pi/2)
    pub rotation: RotationShaping,
    /// Longest frame delta fed to the integrator, in seconds (default: 1/30)
    pub max_delta: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            cursor_radius: 0.13,
            cursor_falloff: FalloffCurve::default(),
            tension: 25.0,
            damping: 60.0,
            mass: 12.0,
            min_iterations: 40,
            max_iterations: 60,
            pull_length: 0.2,
            rotation: RotationShaping::default(),
            max_delta: 1.0 / 30.0,
        }
    }
}

impl SimulationConfig {
    pub const CURSOR_RADIUS_RANGE: (f32, f32) = (0.08, 0.16);
    pub const TENSION_RANGE: (f32, f32) = (5.0, 100.0);
    pub const DAMPING_RANGE: (f32, f32) = (20.0, 100.0);

    /// Relaxation iterations for the current quality level.
    pub fn relaxation_iterations(&self) -> usize {
        self.quality.relaxation_iterations(self)
    }

    /// Copy of this config with every tunable clamped into its supported range.
    pub fn clamped(&self) -> Self {
        let (r_min, r_max) = Self::CURSOR_RADIUS_RANGE;
        let (t_min, t_max) = Self::TENSION_RANGE;
        let (d_min, d_max) = Self::DAMPING_RANGE;
        Self {
            cursor_radius: self.cursor_radius.clamp(r_min, r_max),
            tension: self.tension.clamp(t_min, t_max),
            damping: self.damping.clamp(d_min, d_max),
            mass: self.mass.max(f32::EPSILON),
            min_iterations: self.min_iterations.min(self.max_iterations),
            max_delta: self.max_delta.max(0.0),
            ..self.clone()
        }
    }
}
