//! Double-buffered solver state.

use std::mem;

use crate::grid::GridBuffer;
use crate::split::SplitBuffer;

/// Split position buffers plus the normal grid.
///
/// Passes never write the buffer they read. A pass writes `scratch`, and the
/// roles are then reassigned by swapping the buffers, never by copying.
#[derive(Debug, Clone)]
pub struct SolverState {
    pub current: SplitBuffer,
    pub previous: SplitBuffer,
    pub scratch: SplitBuffer,
    /// `(x, y, z, 0)` unit normals, zero in padding cells
    pub normals: GridBuffer,
}

impl SolverState {
    /// State at rest: `current` and `previous` both hold `rest`.
    pub fn at_rest(rest: &SplitBuffer) -> Self {
        let resolution = rest.resolution();
        Self {
            current: rest.clone(),
            previous: rest.clone(),
            scratch: SplitBuffer::zeroed(resolution),
            normals: GridBuffer::zeroed(resolution),
        }
    }

    pub fn resolution(&self) -> u32 {
        self.current.resolution()
    }

    /// After integration: old current becomes previous, scratch becomes current.
    pub fn rotate_after_integration(&mut self) {
        mem::swap(&mut self.previous, &mut self.current);
        mem::swap(&mut self.current, &mut self.scratch);
    }

    /// After a pass that only replaces current.
    pub fn rotate_current(&mut self) {
        mem::swap(&mut self.current, &mut self.scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    fn marked(value: f64) -> SplitBuffer {
        SplitBuffer::from_positions(1, &[DVec3::splat(value)])
    }

    #[test]
    fn test_integration_rotation() {
        let mut state = SolverState::at_rest(&marked(1.0));
        state.previous = marked(0.0);
        state.scratch = marked(2.0);

        state.rotate_after_integration();
        assert_eq!(state.previous.read(0), DVec3::splat(1.0));
        assert_eq!(state.current.read(0), DVec3::splat(2.0));
        assert_eq!(state.scratch.read(0), DVec3::splat(0.0));
    }

    #[test]
    fn test_current_rotation_keeps_previous() {
        let mut state = SolverState::at_rest(&marked(1.0));
        state.scratch = marked(3.0);

        state.rotate_current();
        assert_eq!(state.current.read(0), DVec3::splat(3.0));
        assert_eq!(state.previous.read(0), DVec3::splat(1.0));
        assert_eq!(state.scratch.read(0), DVec3::splat(1.0));
    }
}
