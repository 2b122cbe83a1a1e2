//! The four solver kernels.

use glam::{DMat4, DVec3, Vec4};
use mochi_config::FalloffCurve;

use super::pass::CellKernel;
use crate::encoding::EncodedBuffers;
use crate::split::SplitBuffer;

/// Neighbor offsets shorter than this are skipped in relaxation.
const MIN_EDGE_LENGTH: f64 = 1e-12;

/// Verlet step with a spring toward the (grab-transformed) rest shape.
pub struct Integrate<'a> {
    pub current: &'a SplitBuffer,
    pub previous: &'a SplitBuffer,
    pub encoded: &'a EncodedBuffers,
    pub grab: DMat4,
    /// Fraction of the way toward the anchor covered this step, `0..=1`
    pub spring: f64,
    /// Fraction of the velocity removed this step, `0..=1`
    pub friction: f64,
}

impl CellKernel for Integrate<'_> {
    fn evaluate(&self, cell: usize) -> DVec3 {
        let current = self.current.read(cell);
        let velocity = current - self.previous.read(cell);
        let anchor = self.grab.transform_point3(self.encoded.rest_position(cell));
        current + velocity * (1.0 - self.friction) + (anchor - current) * self.spring
    }
}

/// Drag every vertex near the grabbed one by the grabbed vertex's offset to
/// the pointer, attenuated by distance.
pub struct PointerOffset<'a> {
    pub current: &'a SplitBuffer,
    /// Current position of the grabbed vertex
    pub grabbed: DVec3,
    /// Pointer target minus `grabbed`
    pub offset: DVec3,
    pub radius: f64,
    pub falloff: FalloffCurve,
}

impl CellKernel for PointerOffset<'_> {
    fn evaluate(&self, cell: usize) -> DVec3 {
        let p = self.current.read(cell);
        let distance = p.distance(self.grabbed);
        if distance < self.radius {
            p + self.offset * self.falloff.evaluate(distance / self.radius)
        } else {
            p
        }
    }
}

/// One Jacobi sweep of distance constraints.
///
/// Each valid neighbor contributes half of the correction that would restore
/// its rest distance; the vertex moves by the average contribution.
pub struct Relax<'a> {
    pub current: &'a SplitBuffer,
    pub encoded: &'a EncodedBuffers,
}

impl CellKernel for Relax<'_> {
    fn evaluate(&self, cell: usize) -> DVec3 {
        let p = self.current.read(cell);
        let mut correction = DVec3::ZERO;
        let mut count = 0usize;

        for (neighbor, rest) in self.encoded.neighbors(cell) {
            let d = self.current.read(neighbor) - p;
            let length = d.length();
            if length > MIN_EDGE_LENGTH {
                correction += d * (0.5 * (length - rest) / length);
            }
            count += 1;
        }

        if count == 0 {
            p
        } else {
            p + correction / count as f64
        }
    }
}

/// Area-weighted normal from the ring fan, `(n, 0)`.
pub fn ring_normal(current: &SplitBuffer, encoded: &EncodedBuffers, cell: usize) -> Vec4 {
    let p = current.read(cell);
    let mut ring = encoded
        .neighbors(cell)
        .map(|(neighbor, _)| current.read(neighbor) - p);
    let Some(first) = ring.next() else {
        return Vec4::ZERO;
    };

    let mut sum = DVec3::ZERO;
    let mut previous = first;
    for d in ring {
        sum += previous.cross(d);
        previous = d;
    }
    // Close the fan
    sum += previous.cross(first);
    sum.normalize_or_zero().as_vec3().extend(0.0)
}

/// Summed squared rest-length violation over every ring entry.
pub fn constraint_violation(current: &SplitBuffer, encoded: &EncodedBuffers) -> f64 {
    (0..encoded.vertex_count())
        .map(|cell| {
            let p = current.read(cell);
            encoded
                .neighbors(cell)
                .map(|(neighbor, rest)| {
                    let error = current.read(neighbor).distance(p) - rest;
                    error * error
                })
                .sum::<f64>()
        })
        .sum()
}
