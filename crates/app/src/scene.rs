//! Scene setup and the per-frame soft body step
//!
//! The soft body mesh is a regular Bevy mesh asset whose positions and
//! normals are overwritten every frame from the frame driver's output.

use std::sync::Arc;

use bevy::asset::RenderAssetUsages;
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::light::GlobalAmbientLight;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use bevy::window::WindowResized;
use mochi_config::{CameraFraming, DisplayConfig, SimulationConfig};
use softbody::{FrameDriver, FrameOutput, FrameSink, PerspectiveView, SoftbodyModel};

use crate::display::init_display;

/// The preprocessed model, inserted before startup.
#[derive(Resource, Clone)]
pub struct SoftbodyModelResource(pub Arc<SoftbodyModel>);

/// Live simulation: the frame driver, the view it picks through, and the
/// mesh asset it writes into.
#[derive(Resource)]
pub struct Simulation {
    pub driver: FrameDriver,
    pub view: PerspectiveView,
    pub mesh: Handle<Mesh>,
}

/// Marker for the scene camera
#[derive(Component)]
pub struct MainCamera;

/// Marker for the deforming mesh entity
#[derive(Component)]
pub struct SoftbodyMesh;

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (init_display, setup_scene).chain())
            .add_systems(
                Update,
                (reframe_on_resize, sync_config, step_simulation)
                    .chain()
                    .run_if(resource_exists::<Simulation>),
            );
    }
}

fn to_bevy(v: softbody::glam::Vec3) -> Vec3 {
    Vec3::from_array(v.to_array())
}

fn viewport(display: &DisplayConfig) -> softbody::glam::Vec2 {
    softbody::glam::Vec2::new(display.width as f32, display.height as f32)
}

fn camera_transform(view: &PerspectiveView) -> Transform {
    Transform::from_translation(to_bevy(view.position)).looking_at(to_bevy(view.target), Vec3::Y)
}

fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    model: Res<SoftbodyModelResource>,
    config: Res<SimulationConfig>,
    framing: Res<CameraFraming>,
    display: Res<DisplayConfig>,
    mut exit: MessageWriter<AppExit>,
) {
    let model = Arc::clone(&model.0);
    let driver = match FrameDriver::new(Arc::clone(&model), &config, viewport(&display)) {
        Ok(driver) => driver,
        Err(err) => {
            error!("Failed to start soft body solver: {}", err);
            exit.write(AppExit::error());
            return;
        }
    };

    let view = PerspectiveView::framed(display.aspect(), &model.mesh().bounds(), &framing);

    // Camera with the same framing the pointer picks through
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: view.fov_y,
            near: view.near,
            far: view.far,
            ..default()
        }),
        camera_transform(&view),
        Tonemapping::Reinhard,
        MainCamera,
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 8000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::default().looking_to(Vec3::new(-0.4, -0.6, -1.0), Vec3::Y),
    ));
    commands.insert_resource(GlobalAmbientLight {
        color: Color::WHITE,
        brightness: 400.0,
        ..default()
    });

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
    );
    write_attributes(&mut mesh, &driver.solver().positions(), &driver.solver().normals());
    mesh.insert_indices(Indices::U32(model.mesh().indices()));
    let mesh = meshes.add(mesh);

    commands.spawn((
        Mesh3d(mesh.clone()),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb_u8(0xcc, 0x3f, 0x28),
            perceptual_roughness: 0.45,
            ..default()
        })),
        Transform::default(),
        SoftbodyMesh,
        Name::new("Soft body"),
    ));

    commands.insert_resource(Simulation { driver, view, mesh });
    info!("Soft body scene initialized");
}

/// Re-derive the camera distance and picking viewport from the window size.
fn reframe_on_resize(
    mut resized: MessageReader<WindowResized>,
    framing: Res<CameraFraming>,
    mut display: ResMut<DisplayConfig>,
    mut simulation: ResMut<Simulation>,
    mut cameras: Query<&mut Transform, With<MainCamera>>,
) {
    let Some(event) = resized.read().last() else {
        return;
    };
    display.resize(event.width, event.height);

    let bounds = simulation.driver.solver().model().mesh().bounds();
    let view = PerspectiveView::framed(display.aspect(), &bounds, &framing);
    simulation.view = view;
    simulation.driver.set_viewport(viewport(&display));

    for mut transform in cameras.iter_mut() {
        *transform = camera_transform(&view);
    }
    // `display` is shadowed by tracing's macro-internal import
    let shown: &DisplayConfig = &display;
    debug!(
        "Reframed for {}x{} ({}x{} physical)",
        shown.width,
        shown.height,
        shown.scaled_width(),
        shown.scaled_height()
    );
}

/// Push tunables into the driver whenever the config resource changes.
fn sync_config(config: Res<SimulationConfig>, mut simulation: ResMut<Simulation>) {
    if config.is_changed() {
        simulation.driver.apply_config(&config);
    }
}

/// Replace a mesh's position and normal attributes.
fn write_attributes(
    mesh: &mut Mesh,
    positions: &[softbody::glam::Vec3],
    normals: &[softbody::glam::Vec3],
) {
    let positions: &[[f32; 3]] = bytemuck::cast_slice(positions);
    let normals: &[[f32; 3]] = bytemuck::cast_slice(normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions.to_vec());
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals.to_vec());
}

/// Writes a finished frame into a Bevy mesh.
struct MeshUpload<'a> {
    mesh: &'a mut Mesh,
}

impl FrameSink for MeshUpload<'_> {
    fn present(&mut self, frame: FrameOutput<'_>) {
        write_attributes(self.mesh, frame.positions, frame.normals);
    }
}

fn step_simulation(
    time: Res<Time>,
    mut simulation: ResMut<Simulation>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    let Simulation { driver, view, mesh } = &mut *simulation;
    let Some(mut target) = meshes.get_mut(&*mesh) else {
        return;
    };
    let mut sink = MeshUpload { mesh: &mut *target };
    let report = driver.frame(time.elapsed_secs_f64(), view, &mut sink);
    tracing::trace!(
        "frame {}: dt {:.4}, {} iterations, offset {}",
        report.frame, report.delta, report.iterations, report.pointer_offset
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::mesh::VertexAttributeValues;
    use softbody::glam::Vec3 as SimVec3;
    use softbody::{FrameReport, PointerPhase};

    #[test]
    fn test_mesh_upload_writes_frame_attributes() {
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
        );
        let positions = [SimVec3::new(1.0, 2.0, 3.0), SimVec3::new(-4.0, 0.5, 0.0)];
        let normals = [SimVec3::Z, SimVec3::NEG_X];
        let report = FrameReport {
            frame: 7,
            delta: 1.0 / 60.0,
            iterations: 60,
            pointer_offset: false,
            phase: PointerPhase::Idle,
            grabbed: None,
        };

        MeshUpload { mesh: &mut mesh }.present(FrameOutput {
            positions: &positions,
            normals: &normals,
            report,
        });

        match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
            Some(VertexAttributeValues::Float32x3(values)) => {
                assert_eq!(values, &vec![[1.0, 2.0, 3.0], [-4.0, 0.5, 0.0]]);
            }
            other => panic!("unexpected positions {other:?}"),
        }
        match mesh.attribute(Mesh::ATTRIBUTE_NORMAL) {
            Some(VertexAttributeValues::Float32x3(values)) => {
                assert_eq!(values, &vec![[0.0, 0.0, 1.0], [-1.0, 0.0, 0.0]]);
            }
            other => panic!("unexpected normals {other:?}"),
        }
    }
}
