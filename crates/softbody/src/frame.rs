//! Per-frame sequencing.
//!
//! clock -> pointer update -> integration -> pointer offset (when dragging)
//! -> relaxation iterations -> normals -> hand-off to the renderer.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use mochi_config::SimulationConfig;
use tracing::info;

use crate::error::SolverError;
use crate::mesh::VertexId;
use crate::model::SoftbodyModel;
use crate::pointer::{PointerController, PointerEvent, PointerPhase};
use crate::solver::SolverPipeline;
use crate::view::ScreenRay;

/// Wall-clock frame timer.
///
/// The first tick yields zero; later ticks yield the time since the previous
/// tick clamped to `max_delta`, so a stall never produces a huge Verlet step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<f64>,
    elapsed: f64,
    max_delta: f32,
}

impl FrameClock {
    pub fn new(max_delta: f32) -> Self {
        Self {
            last: None,
            elapsed: 0.0,
            max_delta,
        }
    }

    /// Advance to `now` (seconds) and return the step to simulate.
    pub fn tick(&mut self, now: f64) -> f32 {
        let delta = match self.last {
            Some(last) => ((now - last).max(0.0) as f32).min(self.max_delta),
            None => 0.0,
        };
        self.last = Some(now);
        self.elapsed += f64::from(delta);
        delta
    }

    /// Simulated time so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn set_max_delta(&mut self, max_delta: f32) {
        self.max_delta = max_delta;
    }
}

/// Facts about one simulated frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub delta: f32,
    pub iterations: usize,
    pub pointer_offset: bool,
    pub phase: PointerPhase,
    pub grabbed: Option<VertexId>,
}

/// Positions and normals of every vertex after a frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameOutput<'a> {
    pub positions: &'a [Vec3],
    pub normals: &'a [Vec3],
    pub report: FrameReport,
}

/// Receives each finished frame; typically uploads it to a GPU mesh.
pub trait FrameSink {
    fn present(&mut self, frame: FrameOutput<'_>);
}

/// Drives the pointer controller and the solver once per display refresh.
#[derive(Debug)]
pub struct FrameDriver {
    clock: FrameClock,
    pointer: PointerController,
    solver: SolverPipeline,
    config: SimulationConfig,
    frame: u64,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
}

impl FrameDriver {
    pub fn new(
        model: Arc<SoftbodyModel>,
        config: &SimulationConfig,
        viewport: Vec2,
    ) -> Result<Self, SolverError> {
        let config = config.clamped();
        let solver = SolverPipeline::new(Arc::clone(&model), &config)?;
        let pointer = PointerController::new(model, &config, viewport);
        info!(
            "frame driver ready: {} vertices, quality {:?} ({} relaxation iterations)",
            solver.vertex_count(),
            config.quality,
            config.relaxation_iterations()
        );
        Ok(Self {
            clock: FrameClock::new(config.max_delta),
            pointer,
            solver,
            config,
            frame: 0,
            positions: Vec::new(),
            normals: Vec::new(),
        })
    }

    pub fn handle_event(&mut self, event: PointerEvent) {
        self.pointer.handle_event(event);
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.pointer.set_viewport(viewport);
    }

    /// Apply new tunables without touching any buffer.
    pub fn apply_config(&mut self, config: &SimulationConfig) {
        let config = config.clamped();
        if config.quality != self.config.quality {
            info!(
                "quality {:?} -> {:?} ({} relaxation iterations)",
                self.config.quality,
                config.quality,
                config.relaxation_iterations()
            );
        }
        self.clock.set_max_delta(config.max_delta);
        self.pointer.set_config(&config);
        self.solver.set_config(&config);
        self.config = config;
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Return every vertex to rest.
    pub fn reset(&mut self) {
        self.solver.reset();
    }

    pub fn pointer(&self) -> &PointerController {
        &self.pointer
    }

    pub fn solver(&self) -> &SolverPipeline {
        &self.solver
    }

    /// Simulate one frame at wall time `now` and hand the result to `sink`.
    pub fn frame<R, S>(&mut self, now: f64, view: &R, sink: &mut S) -> FrameReport
    where
        R: ScreenRay + ?Sized,
        S: FrameSink + ?Sized,
    {
        let delta = self.clock.tick(now);
        self.pointer.update(view);
        let input = self.pointer.input();
        let summary = self.solver.step(delta, &input);

        self.solver.write_positions(&mut self.positions);
        self.solver.write_normals(&mut self.normals);

        let report = FrameReport {
            frame: self.frame,
            delta,
            iterations: summary.iterations,
            pointer_offset: summary.pointer_offset,
            phase: self.pointer.phase(),
            grabbed: input.grabbed,
        };
        self.frame += 1;

        sink.present(FrameOutput {
            positions: &self.positions,
            normals: &self.normals,
            report,
        });
        report
    }
}
