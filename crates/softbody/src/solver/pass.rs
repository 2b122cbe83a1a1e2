//! Per-cell pass dispatch.
//!
//! A kernel computes one cell from read-only inputs. Dispatch runs it over
//! every cell of the output grid in parallel; each invocation writes only
//! its own slot, so no synchronization is needed inside a pass.

use glam::{DVec3, Vec4};
use rayon::prelude::*;

use crate::grid::GridBuffer;
use crate::split::{SplitBuffer, SplitPart};

/// A pure function from a cell index to that cell's new position.
pub trait CellKernel: Sync {
    fn evaluate(&self, cell: usize) -> DVec3;
}

/// Run a position kernel into `output`, one pass per split part.
///
/// Cells at or beyond `vertex_count` copy `passthrough`.
pub fn dispatch_split<K: CellKernel>(
    kernel: &K,
    vertex_count: usize,
    passthrough: &SplitBuffer,
    output: &mut SplitBuffer,
) {
    for part in SplitPart::BOTH {
        let input = passthrough.part(part);
        output
            .part_mut(part)
            .cells_mut()
            .par_iter_mut()
            .enumerate()
            .for_each(|(cell, out)| {
                *out = if cell < vertex_count {
                    part.extract_vec(kernel.evaluate(cell))
                } else {
                    input.cell(cell)
                };
            });
    }
}

/// Run a plain (unsplit) kernel into `output`; padding cells are zeroed.
pub fn dispatch_grid<F>(kernel: F, vertex_count: usize, output: &mut GridBuffer)
where
    F: Fn(usize) -> Vec4 + Sync,
{
    output
        .cells_mut()
        .par_iter_mut()
        .enumerate()
        .for_each(|(cell, out)| {
            *out = if cell < vertex_count {
                kernel(cell)
            } else {
                Vec4::ZERO
            };
        });
}
