//! Solver pipeline orchestration.
//!
//! One frame runs a fixed sequence of full-grid passes:
//! 1. Integration (Verlet step toward the grab-transformed rest shape)
//! 2. Pointer offset, only while a vertex is being dragged
//! 3. Distance-constraint relaxation, repeated per the quality level
//! 4. Normal recomputation
//!
//! Every position pass reads `current` (and `previous`), writes `scratch`
//! once per split part, and then rotates buffer roles.

mod kernels;
mod pass;
mod state;

pub use pass::{dispatch_grid, dispatch_split, CellKernel};
pub use state::SolverState;

use std::sync::Arc;

use glam::{DVec3, Mat4, Vec3};
use mochi_config::SimulationConfig;
use tracing::{debug, trace, warn};

use crate::encoding::EncodedBuffers;
use crate::error::SolverError;
use crate::grid::GridBuffer;
use crate::mesh::VertexId;
use crate::model::SoftbodyModel;
use kernels::{Integrate, PointerOffset, Relax};

/// Everything the pointer contributes to one solver step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub grabbed: Option<VertexId>,
    /// World-space pointer position on the drag plane
    pub target: Vec3,
    /// Run the pointer-offset pass this frame
    pub needs_update: bool,
    /// Applied to the rest anchors during integration
    pub grab_transform: Mat4,
}

impl Default for PointerInput {
    fn default() -> Self {
        Self {
            grabbed: None,
            target: Vec3::ZERO,
            needs_update: false,
            grab_transform: Mat4::IDENTITY,
        }
    }
}

/// What one [`SolverPipeline::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepSummary {
    pub iterations: usize,
    pub pointer_offset: bool,
}

/// Owns the solver state and advances it one frame at a time.
#[derive(Debug)]
pub struct SolverPipeline {
    model: Arc<SoftbodyModel>,
    state: SolverState,
    config: SimulationConfig,
}

impl SolverPipeline {
    /// Validate the model's reference buffers and allocate state at rest.
    pub fn new(model: Arc<SoftbodyModel>, config: &SimulationConfig) -> Result<Self, SolverError> {
        validate(model.encoded())?;
        let state = SolverState::at_rest(&model.encoded().rest_split());
        debug!(
            "solver allocated: {} vertices, {}x{} grids, {} neighbor buffer(s)",
            model.vertex_count(),
            state.resolution(),
            state.resolution(),
            model.encoded().neighbor_buffer_count()
        );
        let mut pipeline = Self {
            model,
            state,
            config: config.clamped(),
        };
        pipeline.compute_normals();
        Ok(pipeline)
    }

    /// Put every vertex back at rest with zero velocity.
    pub fn reset(&mut self) {
        let rest = self.model.encoded().rest_split();
        self.state.current.clone_from(&rest);
        self.state.previous.clone_from(&rest);
        self.compute_normals();
        debug!("solver reset to rest positions");
    }

    /// Swap in new tunables. Buffers are untouched.
    pub fn set_config(&mut self, config: &SimulationConfig) {
        self.config = config.clamped();
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn model(&self) -> &Arc<SoftbodyModel> {
        &self.model
    }

    pub fn state(&self) -> &SolverState {
        &self.state
    }

    pub fn vertex_count(&self) -> usize {
        self.model.vertex_count()
    }

    /// Run the full per-frame sequence.
    pub fn step(&mut self, delta: f32, input: &PointerInput) -> StepSummary {
        self.integrate(delta, input.grab_transform);

        let mut pointer_offset = false;
        if input.needs_update {
            if let Some(grabbed) = input.grabbed {
                self.apply_pointer_offset(grabbed, input.target);
                pointer_offset = true;
            }
        }

        let iterations = self.config.relaxation_iterations();
        self.relax(iterations);
        self.compute_normals();

        StepSummary {
            iterations,
            pointer_offset,
        }
    }

    /// Integration pass. `delta` is clamped to the configured maximum.
    pub fn integrate(&mut self, delta: f32, grab_transform: Mat4) {
        let delta = f64::from(delta.clamp(0.0, self.config.max_delta));
        let mass = f64::from(self.config.mass);
        let spring = (f64::from(self.config.tension) * delta / mass).clamp(0.0, 1.0);
        let friction = (f64::from(self.config.damping) * delta / mass).clamp(0.0, 1.0);

        let encoded = self.model.encoded();
        let SolverState {
            current,
            previous,
            scratch,
            ..
        } = &mut self.state;
        let kernel = Integrate {
            current,
            previous,
            encoded,
            grab: grab_transform.as_dmat4(),
            spring,
            friction,
        };
        dispatch_split(&kernel, encoded.vertex_count(), current, scratch);
        self.state.rotate_after_integration();
    }

    /// Pointer-offset pass toward `target`, centered on `grabbed`.
    pub fn apply_pointer_offset(&mut self, grabbed: VertexId, target: Vec3) {
        if grabbed.index() >= self.vertex_count() {
            warn!(
                "pointer offset skipped: vertex {} outside 0..{}",
                grabbed.0,
                self.vertex_count()
            );
            return;
        }
        let SolverState {
            current, scratch, ..
        } = &mut self.state;
        let anchor = current.read(grabbed.index());
        let kernel = PointerOffset {
            current,
            grabbed: anchor,
            offset: target.as_dvec3() - anchor,
            radius: f64::from(self.config.cursor_radius),
            falloff: self.config.cursor_falloff,
        };
        dispatch_split(&kernel, self.model.vertex_count(), current, scratch);
        self.state.rotate_current();
        trace!("pointer offset: vertex {} toward {:?}", grabbed.0, target);
    }

    /// Run `iterations` strictly sequential relaxation sweeps.
    pub fn relax(&mut self, iterations: usize) {
        for _ in 0..iterations {
            self.relax_once();
        }
    }

    pub fn relax_once(&mut self) {
        let encoded = self.model.encoded();
        let SolverState {
            current, scratch, ..
        } = &mut self.state;
        let kernel = Relax { current, encoded };
        dispatch_split(&kernel, encoded.vertex_count(), current, scratch);
        self.state.rotate_current();
    }

    /// Normal pass over the current positions.
    pub fn compute_normals(&mut self) {
        let encoded = self.model.encoded();
        let SolverState {
            current, normals, ..
        } = &mut self.state;
        let current = &*current;
        dispatch_grid(
            |cell| kernels::ring_normal(current, encoded, cell),
            encoded.vertex_count(),
            normals,
        );
    }

    /// Full-precision current position of a vertex.
    pub fn position(&self, vertex: VertexId) -> DVec3 {
        self.state.current.read(vertex.index())
    }

    /// Place a vertex at `position` with zero velocity.
    pub fn set_position(&mut self, vertex: VertexId, position: DVec3) {
        self.state.current.write(vertex.index(), position);
        self.state.previous.write(vertex.index(), position);
    }

    /// Current positions reassembled for rendering.
    pub fn positions(&self) -> Vec<Vec3> {
        self.state.current.to_vec3(self.vertex_count())
    }

    pub fn normals(&self) -> Vec<Vec3> {
        let mut out = Vec::new();
        self.write_normals(&mut out);
        out
    }

    /// Refill `out` with the current positions, reusing its allocation.
    pub fn write_positions(&self, out: &mut Vec<Vec3>) {
        out.clear();
        out.extend((0..self.vertex_count()).map(|cell| self.state.current.read(cell).as_vec3()));
    }

    pub fn write_normals(&self, out: &mut Vec<Vec3>) {
        out.clear();
        out.extend(
            self.state.normals.cells()[..self.vertex_count()]
                .iter()
                .map(|n| n.truncate()),
        );
    }

    /// Summed squared deviation from rest length over all ring entries.
    pub fn constraint_violation(&self) -> f64 {
        kernels::constraint_violation(&self.state.current, self.model.encoded())
    }
}

/// Check that every reference buffer has the state's shape and that every
/// neighbor slot is either the sentinel or a valid vertex.
pub fn validate(encoded: &EncodedBuffers) -> Result<(), SolverError> {
    let expected = encoded.resolution();
    let check = |buffer: &'static str, grid: &GridBuffer| {
        if grid.resolution() == expected {
            Ok(())
        } else {
            Err(SolverError::ShapeMismatch {
                buffer,
                expected,
                actual: grid.resolution(),
            })
        }
    };

    check("rest_positions", encoded.rest_positions())?;

    let indices = encoded.neighbor_indices();
    let distances = encoded.neighbor_distances();
    if indices.len() != distances.len() {
        return Err(SolverError::NeighborBufferCount {
            indices: indices.len(),
            distances: distances.len(),
        });
    }
    for grid in distances {
        check("neighbor_distances", grid)?;
    }

    let vertex_count = encoded.vertex_count();
    for grid in indices {
        check("neighbor_indices", grid)?;
        for (cell, value) in grid.cells().iter().enumerate() {
            for neighbor in value.to_array() {
                if neighbor < 0.0 {
                    continue;
                }
                if neighbor as usize >= vertex_count || neighbor.fract() != 0.0 {
                    return Err(SolverError::NeighborOutOfRange {
                        cell,
                        neighbor: neighbor as i64,
                        vertex_count,
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{capped_cylinder, octahedron, CylinderParams, TriangleMesh};
    use glam::Vec4;

    const EPSILON: f64 = 1e-6;

    fn pipeline(mesh: TriangleMesh) -> SolverPipeline {
        let model = Arc::new(SoftbodyModel::build(mesh).unwrap());
        SolverPipeline::new(model, &SimulationConfig::default()).unwrap()
    }

    fn max_displacement(before: &[Vec3], after: &[Vec3]) -> f32 {
        before
            .iter()
            .zip(after)
            .map(|(a, b)| a.distance(*b))
            .fold(0.0, f32::max)
    }

    #[test]
    fn test_relaxation_at_rest_is_idempotent() {
        let mut solver = pipeline(octahedron());
        let before = solver.positions();
        solver.relax(60);
        assert!(max_displacement(&before, &solver.positions()) < EPSILON as f32);
        assert!(solver.constraint_violation() < EPSILON);
    }

    #[test]
    fn test_relaxation_converges_monotonically() {
        let mut solver = pipeline(octahedron());
        solver.set_position(VertexId(0), DVec3::new(1.2, 0.0, 0.0));

        let initial = solver.constraint_violation();
        assert!(initial > 0.0);

        let mut last = initial;
        for iteration in 0..40 {
            solver.relax_once();
            let violation = solver.constraint_violation();
            assert!(
                violation <= last + 1e-12,
                "iteration {iteration}: {violation} > {last}"
            );
            last = violation;
        }
        assert!(last < initial * 0.25);
    }

    #[test]
    fn test_relaxation_skips_sentinel_slots() {
        // Ring lengths 5, 6 and 12: most cells carry sentinel slots
        let params = CylinderParams {
            radial_segments: 12,
            height_segments: 3,
            cap_rings: 2,
            ..Default::default()
        };
        let mut solver = pipeline(capped_cylinder(&params));
        assert_eq!(solver.model().encoded().neighbor_buffer_count(), 3);

        let padding = solver.vertex_count();
        let resolution = solver.state().resolution() as usize;
        assert!(padding < resolution * resolution);

        let before = solver.positions();
        solver.relax(10);
        assert!(max_displacement(&before, &solver.positions()) < EPSILON as f32);
        // Padding cells are carried through untouched
        assert_eq!(solver.state().current.read(padding), DVec3::ZERO);
    }

    #[test]
    fn test_idle_step_keeps_rest_shape() {
        let mut solver = pipeline(octahedron());
        let before = solver.positions();
        for _ in 0..5 {
            let summary = solver.step(1.0 / 60.0, &PointerInput::default());
            assert!(!summary.pointer_offset);
            assert_eq!(summary.iterations, 60);
        }
        assert!(max_displacement(&before, &solver.positions()) < 1e-5);
    }

    #[test]
    fn test_integration_pulls_toward_rotated_anchor() {
        let mut solver = pipeline(octahedron());
        let grab = Mat4::from_rotation_z(0.2);
        solver.integrate(1.0 / 60.0, grab);

        // +X rotates toward +Y about the center
        let p = solver.position(VertexId(0));
        assert!(p.y > 0.0);
        assert!(p.z.abs() < EPSILON);
        // Previous now holds the old current
        assert_eq!(solver.state().previous.read(0), DVec3::X);
    }

    #[test]
    fn test_integration_carries_velocity() {
        let mut solver = pipeline(octahedron());
        solver.state.current.write(0, DVec3::new(1.1, 0.0, 0.0));
        solver.integrate(0.0, Mat4::IDENTITY);
        // No spring or friction with a zero step: pure Verlet
        assert!((solver.position(VertexId(0)).x - 1.2).abs() < EPSILON);
    }

    #[test]
    fn test_pointer_offset_respects_radius() {
        let mut solver = pipeline(octahedron());
        let target = Vec3::new(1.0, 0.5, 0.0);
        solver.apply_pointer_offset(VertexId(0), target);

        let moved = solver.position(VertexId(0));
        assert!((moved - target.as_dvec3()).length() < EPSILON);
        // Every other vertex is sqrt(2) or 2 away: outside the radius
        for v in 1..6 {
            assert_eq!(solver.position(VertexId(v)), octahedron().positions()[v as usize].as_dvec3());
        }
    }

    #[test]
    fn test_pointer_offset_falls_off_with_distance() {
        let params = CylinderParams::default();
        let mesh = capped_cylinder(&params);
        let rest: Vec<Vec3> = mesh.positions().to_vec();
        let mut solver = pipeline(mesh);
        let radius = f64::from(solver.config().cursor_radius);

        // Middle of the side wall, away from the caps
        let grabbed = params.height_segments / 2 * params.radial_segments;
        let origin = rest[grabbed as usize].as_dvec3();
        let pull = DVec3::new(0.0, 0.0, 0.5);
        solver.apply_pointer_offset(VertexId(grabbed), (origin + pull).as_vec3());

        let mut samples: Vec<(f64, f64)> = rest
            .iter()
            .enumerate()
            .map(|(v, p)| {
                let distance = p.as_dvec3().distance(origin);
                let moved = solver.position(VertexId(v as u32)).distance(p.as_dvec3());
                (distance, moved)
            })
            .collect();
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));

        assert_eq!(samples[0].0, 0.0);
        assert!((samples[0].1 - pull.length()).abs() < EPSILON);

        let partial = samples
            .iter()
            .filter(|&&(d, m)| d > 0.0 && d < radius && m > EPSILON && m < pull.length())
            .count();
        assert!(partial >= 4, "only {partial} vertices partially pulled");

        for pair in samples.windows(2) {
            assert!(
                pair[1].1 <= pair[0].1 + EPSILON,
                "vertex at {} moved {} but vertex at {} moved {}",
                pair[1].0,
                pair[1].1,
                pair[0].0,
                pair[0].1
            );
        }
        for &(distance, moved) in &samples {
            if distance >= radius {
                assert!(moved < EPSILON, "vertex at {distance} moved {moved}");
            }
        }
    }

    #[test]
    fn test_pointer_offset_ignores_unknown_vertex() {
        let mut solver = pipeline(octahedron());
        let before = solver.positions();
        solver.apply_pointer_offset(VertexId(6), Vec3::new(5.0, 5.0, 5.0));
        assert_eq!(solver.positions(), before);
    }

    #[test]
    fn test_normals_point_outward() {
        let solver = pipeline(octahedron());
        let positions = solver.positions();
        for (p, n) in positions.iter().zip(solver.normals()) {
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert!((n - *p).length() < 1e-5);
        }
        assert_eq!(solver.state().normals.cell(6), Vec4::ZERO);
    }

    #[test]
    fn test_reset_restores_rest() {
        let mut solver = pipeline(octahedron());
        solver.set_position(VertexId(2), DVec3::new(0.0, 3.0, 0.0));
        solver.step(1.0 / 60.0, &PointerInput::default());
        solver.reset();
        assert_eq!(solver.positions(), octahedron().positions());
    }

    #[test]
    fn test_validate_rejects_bad_buffers() {
        let model = SoftbodyModel::build(octahedron()).unwrap();

        let mut encoded = model.encoded().clone();
        encoded.neighbor_indices_mut()[0] = GridBuffer::zeroed(4);
        assert!(matches!(
            validate(&encoded),
            Err(SolverError::ShapeMismatch {
                buffer: "neighbor_indices",
                expected: 3,
                actual: 4
            })
        ));

        let mut encoded = model.encoded().clone();
        encoded.neighbor_indices_mut()[0].set(1, Vec4::new(0.0, 2.0, 9.0, -1.0));
        assert!(matches!(
            validate(&encoded),
            Err(SolverError::NeighborOutOfRange {
                cell: 1,
                neighbor: 9,
                ..
            })
        ));

        let mut encoded = model.encoded().clone();
        encoded.neighbor_indices_mut().push(GridBuffer::zeroed(3));
        assert!(matches!(
            validate(&encoded),
            Err(SolverError::NeighborBufferCount {
                indices: 2,
                distances: 1
            })
        ));
    }
}
