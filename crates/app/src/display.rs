//! Window size and pixel ratio bookkeeping

use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResolution};
use mochi_config::{DisplayConfig, Quality, SimulationConfig};

/// Apply the pixel ratio a quality level asks for to the window.
///
/// The device ratio comes from the base scale factor, which ignores any
/// override set by an earlier call.
pub fn apply_pixel_ratio(
    display: &mut DisplayConfig,
    quality: Quality,
    resolution: &mut WindowResolution,
) {
    display.apply_quality(quality, resolution.base_scale_factor());
    resolution.set_scale_factor_override(Some(display.scale));
}

/// Seed the display config from the primary window and apply the
/// configured quality.
pub fn init_display(
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut display: ResMut<DisplayConfig>,
    config: Res<SimulationConfig>,
) {
    let Ok(mut window) = windows.single_mut() else {
        warn!("No primary window; keeping default display size");
        return;
    };
    display.resize(window.width(), window.height());
    apply_pixel_ratio(&mut display, config.quality, &mut window.resolution);
    // `display` is shadowed by tracing's macro-internal import
    let shown: &DisplayConfig = &display;
    info!(
        "Display {}x{} at pixel ratio {} ({}x{} physical)",
        shown.width,
        shown.height,
        shown.scale,
        shown.scaled_width(),
        shown.scaled_height()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_toggle_round_trips_pixel_ratio() {
        let mut resolution = WindowResolution::new(1280, 800);
        resolution.set_scale_factor(3.0);
        let mut display = DisplayConfig::default();

        apply_pixel_ratio(&mut display, Quality::High, &mut resolution);
        assert_eq!(display.scale, mochi_config::MAX_PIXEL_RATIO);
        assert_eq!(resolution.scale_factor(), mochi_config::MAX_PIXEL_RATIO);

        apply_pixel_ratio(&mut display, Quality::Medium, &mut resolution);
        assert_eq!(display.scale, 1.0);
        assert_eq!(resolution.scale_factor(), 1.0);

        // Back to high reads the device ratio, not the medium override
        apply_pixel_ratio(&mut display, Quality::High, &mut resolution);
        assert_eq!(resolution.scale_factor(), mochi_config::MAX_PIXEL_RATIO);
        assert_eq!(resolution.base_scale_factor(), 3.0);
    }

    #[test]
    fn test_low_density_device_keeps_its_ratio() {
        let mut resolution = WindowResolution::new(1280, 800);
        resolution.set_scale_factor(1.5);
        let mut display = DisplayConfig::default();

        apply_pixel_ratio(&mut display, Quality::High, &mut resolution);
        assert_eq!(display.scale, 1.5);
        assert_eq!(resolution.scale_factor(), 1.5);
    }
}
