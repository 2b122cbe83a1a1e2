//! Input handling - turns Bevy mouse, touch and keyboard input into
//! pointer events for the frame driver.

use bevy::input::touch::{TouchInput, TouchPhase};
use bevy::input::InputSystems;
use bevy::prelude::*;
use bevy::window::{CursorLeft, CursorMoved, PrimaryWindow};
use mochi_config::{DisplayConfig, SimulationConfig};
use softbody::{PointerEvent, PointerSource};

use crate::display::apply_pixel_ratio;
use crate::scene::Simulation;

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        // Run in PreUpdate so the step in Update sees this frame's input
        app.add_systems(
            PreUpdate,
            (forward_mouse, forward_touch, handle_hotkeys)
                .chain()
                .after(InputSystems)
                .run_if(resource_exists::<Simulation>),
        );

        info!("Input plugin initialized");
    }
}

fn to_screen(position: Vec2) -> softbody::glam::Vec2 {
    softbody::glam::Vec2::new(position.x, position.y)
}

fn forward_mouse(
    buttons: Res<ButtonInput<MouseButton>>,
    mut cursor_moved: MessageReader<CursorMoved>,
    mut cursor_left: MessageReader<CursorLeft>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut simulation: ResMut<Simulation>,
) {
    for event in cursor_moved.read() {
        simulation.driver.handle_event(PointerEvent::Move {
            position: to_screen(event.position),
        });
    }

    if buttons.just_pressed(MouseButton::Left) {
        let cursor = windows.single().ok().and_then(|w| w.cursor_position());
        if let Some(position) = cursor {
            simulation.driver.handle_event(PointerEvent::Press {
                position: to_screen(position),
                source: PointerSource::Mouse,
            });
        }
    }

    if buttons.just_released(MouseButton::Left) {
        simulation.driver.handle_event(PointerEvent::Release);
    }

    if cursor_left.read().last().is_some() {
        simulation.driver.handle_event(PointerEvent::Cancel);
    }
}

/// Only the first finger of a single-touch gesture drives the pointer.
fn forward_touch(
    mut touch_events: MessageReader<TouchInput>,
    touches: Res<Touches>,
    mut primary: Local<Option<u64>>,
    mut simulation: ResMut<Simulation>,
) {
    for event in touch_events.read() {
        match event.phase {
            TouchPhase::Started => {
                let active = touches.iter().count();
                if primary.is_some() {
                    // A second finger ends the gesture
                    *primary = None;
                    simulation.driver.handle_event(PointerEvent::Cancel);
                } else {
                    // The controller ignores multi-touch presses
                    if active == 1 {
                        *primary = Some(event.id);
                    }
                    simulation.driver.handle_event(PointerEvent::Press {
                        position: to_screen(event.position),
                        source: PointerSource::Touch { touches: active },
                    });
                }
            }
            TouchPhase::Moved if *primary == Some(event.id) => {
                simulation.driver.handle_event(PointerEvent::Move {
                    position: to_screen(event.position),
                });
            }
            TouchPhase::Ended if *primary == Some(event.id) => {
                *primary = None;
                simulation.driver.handle_event(PointerEvent::Release);
            }
            TouchPhase::Canceled if *primary == Some(event.id) => {
                *primary = None;
                simulation.driver.handle_event(PointerEvent::Cancel);
            }
            _ => {}
        }
    }
}

/// Q toggles quality, R returns the body to rest.
fn handle_hotkeys(
    keys: Res<ButtonInput<KeyCode>>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut config: ResMut<SimulationConfig>,
    mut display: ResMut<DisplayConfig>,
    mut simulation: ResMut<Simulation>,
) {
    if keys.just_pressed(KeyCode::KeyQ) {
        config.quality = config.quality.toggled();
        match windows.single_mut() {
            Ok(mut window) => {
                apply_pixel_ratio(&mut display, config.quality, &mut window.resolution);
            }
            Err(_) => display.apply_quality(config.quality, 1.0),
        }
        // `display` is shadowed by tracing's macro-internal import
        let shown: &DisplayConfig = &display;
        info!(
            "Quality {:?}: {} relaxation iterations, pixel ratio {} ({}x{} physical)",
            config.quality,
            config.relaxation_iterations(),
            shown.scale,
            shown.scaled_width(),
            shown.scaled_height()
        );
    }

    if keys.just_pressed(KeyCode::KeyR) {
        simulation.driver.reset();
        info!("Soft body reset to rest shape");
    }
}
