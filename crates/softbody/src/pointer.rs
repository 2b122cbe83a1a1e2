//! Pointer gesture tracking and grab resolution.
//!
//! One pointer at a time. A press starts a gesture in the seeking phase;
//! each update casts the pointer ray against the undeformed mesh until it
//! hits, at which point the nearest vertex of the hit face is grabbed and
//! the gesture follows the ray's crossing with a fixed drag plane in front
//! of the mesh. Release, cancel or leaving the canvas end the gesture.

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use mochi_config::{RotationShaping, SimulationConfig};
use tracing::{debug, trace};

use crate::mesh::VertexId;
use crate::model::SoftbodyModel;
use crate::raycast::raycast_mesh;
use crate::solver::PointerInput;
use crate::view::{normalize_screen, Plane, ScreenRay};

/// Below this the rotation axis is treated as undefined.
const MIN_AXIS_LENGTH: f32 = 1e-6;

/// Device that produced a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSource {
    Mouse,
    /// Touch press with the number of touches active at that moment
    Touch { touches: usize },
}

/// Raw input, positions in pixels from the top-left of the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Press { position: Vec2, source: PointerSource },
    Move { position: Vec2 },
    Release,
    /// Touch cancel or the pointer leaving the canvas
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    /// No gesture
    Idle,
    /// Pressed, not over the mesh yet
    Seeking,
    /// A vertex is grabbed
    Dragging,
}

/// State of one press-drag-release gesture.
#[derive(Debug, Clone, Copy)]
struct Gesture {
    grabbed: Option<VertexId>,
    /// Pixels
    screen: Vec2,
    start: Vec3,
    current: Vec3,
}

/// Turns pointer events into a grabbed vertex, a target and a twist.
#[derive(Debug)]
pub struct PointerController {
    model: Arc<SoftbodyModel>,
    viewport: Vec2,
    plane: Plane,
    rotation: RotationShaping,
    pull_length: f32,
    gesture: Option<Gesture>,
    needs_update: bool,
    grab_transform: Mat4,
}

impl PointerController {
    pub fn new(model: Arc<SoftbodyModel>, config: &SimulationConfig, viewport: Vec2) -> Self {
        let plane = drag_plane(&model, config.pull_length);
        Self {
            model,
            viewport,
            plane,
            rotation: config.rotation,
            pull_length: config.pull_length,
            gesture: None,
            needs_update: false,
            grab_transform: Mat4::IDENTITY,
        }
    }

    pub fn set_config(&mut self, config: &SimulationConfig) {
        if config.pull_length != self.pull_length {
            self.pull_length = config.pull_length;
            self.plane = drag_plane(&self.model, config.pull_length);
        }
        self.rotation = config.rotation;
    }

    /// Canvas size in pixels, used to normalize pointer positions.
    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    pub fn handle_event(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Press { position, source } => {
                if let PointerSource::Touch { touches } = source {
                    if touches != 1 {
                        return;
                    }
                }
                self.gesture = Some(Gesture {
                    grabbed: None,
                    screen: position,
                    start: Vec3::ZERO,
                    current: Vec3::ZERO,
                });
            }
            PointerEvent::Move { position } => {
                if let Some(gesture) = &mut self.gesture {
                    gesture.screen = position;
                }
            }
            PointerEvent::Release | PointerEvent::Cancel => {
                if let Some(VertexId(vertex)) = self.grabbed() {
                    debug!("released vertex {}", vertex);
                }
                self.gesture = None;
                self.grab_transform = Mat4::IDENTITY;
            }
        }
    }

    /// Resolve the pointer against the current view. Runs once per frame.
    pub fn update<R: ScreenRay + ?Sized>(&mut self, view: &R) {
        self.needs_update = false;

        if let Some(gesture) = &mut self.gesture {
            let ndc = normalize_screen(gesture.screen, self.viewport);
            if let Some(ray) = view.ray_from_ndc(ndc) {
                let mesh = self.model.mesh();

                if gesture.grabbed.is_none() {
                    match raycast_mesh(&ray, mesh) {
                        Some(hit) => {
                            if let Some(start) = self.plane.intersect_ray(&ray) {
                                gesture.grabbed = Some(hit.nearest_vertex);
                                gesture.start = start;
                                debug!(
                                    "grabbed vertex {} (face {}) at {:?}",
                                    hit.nearest_vertex.0, hit.face, hit.point
                                );
                            }
                        }
                        None => trace!("pointer ray missed the mesh"),
                    }
                }

                if gesture.grabbed.is_some() {
                    if let Some(current) = self.plane.intersect_ray(&ray) {
                        gesture.current = current;
                    }
                    self.needs_update = true;
                }
            }
        }

        self.update_grab_transform();
    }

    fn update_grab_transform(&mut self) {
        let Some(gesture) = self.gesture.filter(|g| g.grabbed.is_some()) else {
            return;
        };

        let center = self.model.center();
        let from = (gesture.start - center).normalize_or_zero();
        let to = (gesture.current - center).normalize_or_zero();
        let axis = from.cross(to);

        self.grab_transform = if axis.length() < MIN_AXIS_LENGTH {
            Mat4::IDENTITY
        } else {
            let angle = self.rotation.shape(from.angle_between(to));
            Mat4::from_translation(center)
                * Mat4::from_axis_angle(axis.normalize(), angle)
                * Mat4::from_translation(-center)
        };
    }

    pub fn phase(&self) -> PointerPhase {
        match &self.gesture {
            None => PointerPhase::Idle,
            Some(Gesture { grabbed: None, .. }) => PointerPhase::Seeking,
            Some(_) => PointerPhase::Dragging,
        }
    }

    pub fn grabbed(&self) -> Option<VertexId> {
        self.gesture.and_then(|g| g.grabbed)
    }

    /// Current drag-plane point, while dragging.
    pub fn target(&self) -> Option<Vec3> {
        self.gesture
            .filter(|g| g.grabbed.is_some())
            .map(|g| g.current)
    }

    /// Drag-plane point recorded when the vertex was grabbed.
    pub fn start(&self) -> Option<Vec3> {
        self.gesture
            .filter(|g| g.grabbed.is_some())
            .map(|g| g.start)
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    pub fn grab_transform(&self) -> Mat4 {
        self.grab_transform
    }

    /// This frame's pointer contribution to the solver.
    pub fn input(&self) -> PointerInput {
        PointerInput {
            grabbed: self.grabbed(),
            target: self.target().unwrap_or(Vec3::ZERO),
            needs_update: self.needs_update,
            grab_transform: self.grab_transform,
        }
    }
}

/// Plane facing +Z, `pull_length` beyond the mesh's front.
fn drag_plane(model: &SoftbodyModel, pull_length: f32) -> Plane {
    let z = model.mesh().bounds().max.z + pull_length;
    Plane::new(Vec3::new(0.0, 0.0, z), Vec3::Z)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::mesh::octahedron;
    use crate::view::Ray;

    /// Orthographic view down -Z covering `[-half, half]^2`.
    pub(crate) struct OrthoView {
        pub half_extent: f32,
    }

    impl ScreenRay for OrthoView {
        fn ray_from_ndc(&self, ndc: Vec2) -> Option<Ray> {
            let xy = ndc * self.half_extent;
            Some(Ray::new(xy.extend(10.0), Vec3::NEG_Z))
        }
    }

    pub(crate) const VIEW: OrthoView = OrthoView { half_extent: 2.0 };
    pub(crate) const VIEWPORT: Vec2 = Vec2::new(200.0, 200.0);
    /// Lands on the upper +X face at (0.9, 0.02), nearest vertex 0
    pub(crate) const ON_VERTEX_0: Vec2 = Vec2::new(145.0, 99.0);
    /// (0, 0.9) in world space
    pub(crate) const ABOVE_CENTER: Vec2 = Vec2::new(100.0, 55.0);

    fn controller() -> PointerController {
        let model = Arc::new(SoftbodyModel::build(octahedron()).unwrap());
        PointerController::new(model, &SimulationConfig::default(), VIEWPORT)
    }

    fn press(position: Vec2) -> PointerEvent {
        PointerEvent::Press {
            position,
            source: PointerSource::Mouse,
        }
    }

    #[test]
    fn test_press_off_mesh_stays_seeking() {
        let mut pointer = controller();
        pointer.handle_event(press(Vec2::new(10.0, 10.0)));
        pointer.update(&VIEW);

        assert_eq!(pointer.phase(), PointerPhase::Seeking);
        assert_eq!(pointer.grabbed(), None);
        assert!(!pointer.needs_update());
        assert_eq!(pointer.grab_transform(), Mat4::IDENTITY);
    }

    #[test]
    fn test_press_on_mesh_grabs_nearest_vertex() {
        let mut pointer = controller();
        pointer.handle_event(press(ON_VERTEX_0));
        assert_eq!(pointer.phase(), PointerPhase::Seeking);

        pointer.update(&VIEW);
        assert_eq!(pointer.phase(), PointerPhase::Dragging);
        assert_eq!(pointer.grabbed(), Some(VertexId(0)));
        assert!(pointer.needs_update());

        // Drag plane sits at max z (1) + pull length (0.2)
        let start = pointer.start().unwrap();
        assert!((start - Vec3::new(0.9, 0.02, 1.2)).length() < 1e-5);
        assert_eq!(pointer.target(), Some(start));
    }

    #[test]
    fn test_seeking_grabs_once_pointer_reaches_mesh() {
        let mut pointer = controller();
        pointer.handle_event(press(Vec2::new(10.0, 10.0)));
        pointer.update(&VIEW);
        assert_eq!(pointer.phase(), PointerPhase::Seeking);

        pointer.handle_event(PointerEvent::Move {
            position: ON_VERTEX_0,
        });
        pointer.update(&VIEW);
        assert_eq!(pointer.grabbed(), Some(VertexId(0)));
    }

    #[test]
    fn test_drag_follows_plane_and_twists() {
        let mut pointer = controller();
        pointer.handle_event(press(ON_VERTEX_0));
        pointer.update(&VIEW);
        pointer.handle_event(PointerEvent::Move {
            position: ABOVE_CENTER,
        });
        pointer.update(&VIEW);

        let target = pointer.target().unwrap();
        assert!((target - Vec3::new(0.0, 0.9, 1.2)).length() < 1e-5);
        assert_eq!(pointer.grabbed(), Some(VertexId(0)));

        // Start and target subtend about 0.866 rad; shaped to about 0.08
        let rotated = pointer.grab_transform().transform_point3(Vec3::X);
        let angle = rotated.angle_between(Vec3::X);
        let expected = RotationShaping::default().shape(
            Vec3::new(0.9, 0.02, 1.2).angle_between(Vec3::new(0.0, 0.9, 1.2)),
        );
        assert!(angle > 0.0);
        assert!(angle <= expected + 1e-5);
        assert!(rotated.y > 0.0);
    }

    #[test]
    fn test_needs_update_resets_each_frame() {
        let mut pointer = controller();
        pointer.handle_event(press(ON_VERTEX_0));
        pointer.update(&VIEW);
        assert!(pointer.needs_update());

        pointer.handle_event(PointerEvent::Release);
        pointer.update(&VIEW);
        assert!(!pointer.needs_update());
        assert_eq!(pointer.phase(), PointerPhase::Idle);
        assert_eq!(pointer.grab_transform(), Mat4::IDENTITY);
        assert_eq!(pointer.input(), PointerInput::default());
    }

    #[test]
    fn test_cancel_from_seeking() {
        let mut pointer = controller();
        pointer.handle_event(press(Vec2::new(10.0, 10.0)));
        pointer.handle_event(PointerEvent::Cancel);
        assert_eq!(pointer.phase(), PointerPhase::Idle);
    }

    #[test]
    fn test_multi_touch_press_ignored() {
        let mut pointer = controller();
        pointer.handle_event(PointerEvent::Press {
            position: ON_VERTEX_0,
            source: PointerSource::Touch { touches: 2 },
        });
        assert_eq!(pointer.phase(), PointerPhase::Idle);

        pointer.handle_event(PointerEvent::Press {
            position: ON_VERTEX_0,
            source: PointerSource::Touch { touches: 1 },
        });
        pointer.update(&VIEW);
        assert_eq!(pointer.phase(), PointerPhase::Dragging);
    }

    #[test]
    fn test_move_without_press_is_ignored() {
        let mut pointer = controller();
        pointer.handle_event(PointerEvent::Move {
            position: ON_VERTEX_0,
        });
        pointer.update(&VIEW);
        assert_eq!(pointer.phase(), PointerPhase::Idle);
    }
}
