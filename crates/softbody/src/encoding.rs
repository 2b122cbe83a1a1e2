//! Packing of rest positions and adjacency into grid buffers.
//!
//! Neighbor data is spread over as many grids as needed to hold the longest
//! ring, four entries per cell: channel `k` of neighbor grid `j` holds ring
//! entry `k + 4 * j`. Slots beyond a vertex's ring, and every slot of a
//! padding cell, hold [`NEIGHBOR_SENTINEL`] in both the index and the
//! distance grid.

use glam::{DVec3, Vec3, Vec4};

use crate::adjacency::AdjacencyRings;
use crate::error::EncodingError;
use crate::grid::{resolution_for, GridBuffer};
use crate::mesh::VertexId;
use crate::split::SplitBuffer;

/// Marks an empty neighbor slot.
pub const NEIGHBOR_SENTINEL: f32 = -1.0;

/// Ring entries per cell.
pub const SLOTS_PER_CELL: usize = 4;

/// Immutable reference buffers read by every solver pass.
#[derive(Debug, Clone)]
pub struct EncodedBuffers {
    vertex_count: usize,
    resolution: u32,
    /// `(x, y, z, 0)` per vertex, zero in padding cells
    rest_positions: GridBuffer,
    neighbor_indices: Vec<GridBuffer>,
    neighbor_distances: Vec<GridBuffer>,
}

impl EncodedBuffers {
    /// Encode positions and their adjacency rings.
    pub fn encode(positions: &[Vec3], rings: &AdjacencyRings) -> Result<Self, EncodingError> {
        let vertex_count = positions.len();
        if vertex_count == 0 {
            return Err(EncodingError::Empty);
        }
        if rings.vertex_count() != vertex_count {
            return Err(EncodingError::LengthMismatch {
                rings: rings.vertex_count(),
                vertices: vertex_count,
            });
        }

        let resolution = resolution_for(vertex_count);
        let buffer_count = rings.max_ring_len().div_ceil(SLOTS_PER_CELL);

        let mut rest_positions = GridBuffer::zeroed(resolution);
        for (cell, &p) in positions.iter().enumerate() {
            rest_positions.set(cell, p.extend(0.0));
        }

        let empty = Vec4::splat(NEIGHBOR_SENTINEL);
        let mut neighbor_indices = vec![GridBuffer::filled(resolution, empty); buffer_count];
        let mut neighbor_distances = vec![GridBuffer::filled(resolution, empty); buffer_count];

        for vertex in 0..vertex_count {
            let ring = rings.ring(VertexId(vertex as u32));
            for (slot, &neighbor) in ring.iter().enumerate() {
                if neighbor as usize >= vertex_count {
                    return Err(EncodingError::NeighborOutOfRange {
                        vertex,
                        neighbor,
                        vertex_count,
                    });
                }
                let buffer = slot / SLOTS_PER_CELL;
                let channel = slot % SLOTS_PER_CELL;
                let distance = positions[vertex].distance(positions[neighbor as usize]);

                neighbor_indices[buffer].cells_mut()[vertex][channel] = neighbor as f32;
                neighbor_distances[buffer].cells_mut()[vertex][channel] = distance;
            }
        }

        tracing::info!(
            "encoded {} vertices into {}x{} grids with {} neighbor buffer(s)",
            vertex_count,
            resolution,
            resolution,
            buffer_count
        );

        Ok(Self {
            vertex_count,
            resolution,
            rest_positions,
            neighbor_indices,
            neighbor_distances,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn rest_positions(&self) -> &GridBuffer {
        &self.rest_positions
    }

    pub fn neighbor_indices(&self) -> &[GridBuffer] {
        &self.neighbor_indices
    }

    pub fn neighbor_distances(&self) -> &[GridBuffer] {
        &self.neighbor_distances
    }

    #[cfg(test)]
    pub(crate) fn neighbor_indices_mut(&mut self) -> &mut Vec<GridBuffer> {
        &mut self.neighbor_indices
    }

    /// Number of neighbor index (and distance) grids.
    pub fn neighbor_buffer_count(&self) -> usize {
        self.neighbor_indices.len()
    }

    /// Rest position of a cell in double precision.
    pub fn rest_position(&self, cell: usize) -> DVec3 {
        self.rest_positions.cell(cell).truncate().as_dvec3()
    }

    /// Rest positions as a split buffer, for seeding solver state.
    pub fn rest_split(&self) -> SplitBuffer {
        let positions: Vec<DVec3> = (0..self.vertex_count)
            .map(|cell| self.rest_position(cell))
            .collect();
        SplitBuffer::from_positions(self.resolution, &positions)
    }

    /// Valid `(neighbor, rest distance)` pairs of a cell, in ring order.
    pub fn neighbors(&self, cell: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.neighbor_indices
            .iter()
            .zip(&self.neighbor_distances)
            .flat_map(move |(indices, distances)| {
                let idx = indices.cell(cell).to_array();
                let dist = distances.cell(cell).to_array();
                idx.into_iter().zip(dist)
            })
            .filter(|&(index, _)| index >= 0.0)
            .map(|(index, distance)| (index as usize, distance as f64))
    }
}
