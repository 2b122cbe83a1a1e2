//! Mochi - a squishy soft body cylinder you can grab and pull

use std::sync::Arc;

use bevy::prelude::*;
use bevy::window::WindowResolution;
use mochi_config::{DisplayConfig, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use softbody::mesh::{capped_cylinder, CylinderParams};
use softbody::SoftbodyModel;

mod config;
mod display;
mod input;
mod scene;

use config::MochiConfig;
use scene::{ScenePlugin, SoftbodyModelResource};

fn main() -> AppExit {
    // Bevy's log plugin is not up yet, so report config problems on stderr
    let config = MochiConfig::load().unwrap_or_else(|err| {
        eprintln!("{err}; using default configuration");
        MochiConfig::default()
    });

    let model = match SoftbodyModel::build(capped_cylinder(&CylinderParams::default())) {
        Ok(model) => Arc::new(model),
        Err(err) => {
            eprintln!("Failed to build soft body model: {err}");
            return AppExit::error();
        }
    };

    // Display configuration - size and pixel ratio are filled in from the
    // window at startup
    let display_config = DisplayConfig::default();

    let window_config = Window {
        title: "Mochi".into(),
        resolution: WindowResolution::new(DEFAULT_WIDTH, DEFAULT_HEIGHT),
        present_mode: bevy::window::PresentMode::AutoVsync,
        ..default()
    };

    let mut app = App::new();

    app.insert_resource(display_config)
        .insert_resource(config.simulation)
        .insert_resource(config.camera)
        .insert_resource(SoftbodyModelResource(model))
        .insert_resource(ClearColor(Color::srgb(0.96, 0.93, 0.88)));

    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(window_config),
                ..default()
            })
            .set(bevy::log::LogPlugin {
                level: bevy::log::Level::INFO,
                ..default()
            }),
    );

    app.add_plugins(ScenePlugin)
        .add_plugins(input::InputPlugin)
        .run()
}
