//! Split-precision position buffers.
//!
//! Each position component is stored as two `f32` values: its integer part
//! `trunc(v)` and the remainder `v - trunc(v)`. Kernels reassemble both into
//! an `f64`, compute in double precision, and write back one part per pass.
//! Keeping the fractional part in `[0, 1)` in magnitude gives it the full
//! `f32` mantissa, which is what keeps slow drifts from being rounded away.

use glam::{DVec3, Vec3, Vec4};

use crate::grid::GridBuffer;

/// Which half of a split value a pass writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitPart {
    Integer,
    Fractional,
}

impl SplitPart {
    pub const BOTH: [SplitPart; 2] = [SplitPart::Integer, SplitPart::Fractional];

    /// This part of a scalar.
    pub fn extract(self, value: f64) -> f32 {
        let whole = value.trunc();
        match self {
            SplitPart::Integer => whole as f32,
            SplitPart::Fractional => (value - whole) as f32,
        }
    }

    /// This part of a position, packed as a cell with `w = 0`.
    pub fn extract_vec(self, value: DVec3) -> Vec4 {
        Vec4::new(
            self.extract(value.x),
            self.extract(value.y),
            self.extract(value.z),
            0.0,
        )
    }
}

/// Reassemble one cell from its two parts.
pub fn reassemble(integer: Vec4, fractional: Vec4) -> DVec3 {
    integer.truncate().as_dvec3() + fractional.truncate().as_dvec3()
}

/// A position grid held as integer and fractional halves of identical shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitBuffer {
    pub integer: GridBuffer,
    pub fractional: GridBuffer,
}

impl SplitBuffer {
    pub fn zeroed(resolution: u32) -> Self {
        Self {
            integer: GridBuffer::zeroed(resolution),
            fractional: GridBuffer::zeroed(resolution),
        }
    }

    /// Split `positions` into a grid; cells past the end stay zero.
    pub fn from_positions(resolution: u32, positions: &[DVec3]) -> Self {
        let mut buffer = Self::zeroed(resolution);
        for (cell, &p) in positions.iter().enumerate() {
            buffer.write(cell, p);
        }
        buffer
    }

    pub fn resolution(&self) -> u32 {
        self.integer.resolution()
    }

    pub fn len(&self) -> usize {
        self.integer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.integer.is_empty()
    }

    /// Full-precision value of a cell.
    pub fn read(&self, cell: usize) -> DVec3 {
        reassemble(self.integer.cell(cell), self.fractional.cell(cell))
    }

    /// Overwrite both halves of a cell.
    pub fn write(&mut self, cell: usize, value: DVec3) {
        self.integer.set(cell, SplitPart::Integer.extract_vec(value));
        self.fractional
            .set(cell, SplitPart::Fractional.extract_vec(value));
    }

    pub fn part(&self, part: SplitPart) -> &GridBuffer {
        match part {
            SplitPart::Integer => &self.integer,
            SplitPart::Fractional => &self.fractional,
        }
    }

    pub fn part_mut(&mut self, part: SplitPart) -> &mut GridBuffer {
        match part {
            SplitPart::Integer => &mut self.integer,
            SplitPart::Fractional => &mut self.fractional,
        }
    }

    /// The first `count` cells reassembled and narrowed for rendering.
    pub fn to_vec3(&self, count: usize) -> Vec<Vec3> {
        (0..count).map(|cell| self.read(cell).as_vec3()).collect()
    }
}
