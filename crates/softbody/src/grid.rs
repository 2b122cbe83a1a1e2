//! Square four-channel grid buffers.
//!
//! Cell `i` of a grid with resolution `R` sits at column `i % R`, row `i / R`.
//! A cell holds one vertex worth of data, so every pass addresses vertices
//! and cells interchangeably.

use glam::Vec4;

/// Side length of the smallest square grid holding `count` cells.
pub fn resolution_for(count: usize) -> u32 {
    let mut r = (count as f64).sqrt().ceil() as usize;
    // Float rounding can undershoot for very large counts
    while r * r < count {
        r += 1;
    }
    r.max(1) as u32
}

/// A `resolution x resolution` grid of RGBA-style cells.
#[derive(Debug, Clone, PartialEq)]
pub struct GridBuffer {
    resolution: u32,
    cells: Vec<Vec4>,
}

impl GridBuffer {
    /// Grid with every cell set to `value`.
    pub fn filled(resolution: u32, value: Vec4) -> Self {
        let len = resolution as usize * resolution as usize;
        Self {
            resolution,
            cells: vec![value; len],
        }
    }

    pub fn zeroed(resolution: u32) -> Self {
        Self::filled(resolution, Vec4::ZERO)
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Total number of cells, `resolution^2`.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, index: usize) -> Vec4 {
        self.cells[index]
    }

    pub fn set(&mut self, index: usize, value: Vec4) {
        self.cells[index] = value;
    }

    pub fn cells(&self) -> &[Vec4] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Vec4] {
        &mut self.cells
    }
}
