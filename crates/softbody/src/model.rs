//! The immutable soft body model shared by the pointer controller and the
//! solver: rest mesh, adjacency rings and encoded reference buffers.

use glam::Vec3;

use crate::adjacency::AdjacencyRings;
use crate::encoding::EncodedBuffers;
use crate::error::ModelError;
use crate::mesh::TriangleMesh;

/// Output of the one-time preprocessing step.
///
/// Nothing writes to a model after [`SoftbodyModel::build`] returns, so it is
/// shared behind an `Arc` without locking.
#[derive(Debug, Clone)]
pub struct SoftbodyModel {
    mesh: TriangleMesh,
    rings: AdjacencyRings,
    encoded: EncodedBuffers,
}

impl SoftbodyModel {
    /// Build adjacency and reference buffers for a closed mesh.
    pub fn build(mesh: TriangleMesh) -> Result<Self, ModelError> {
        let rings = AdjacencyRings::build(&mesh)?;
        let encoded = EncodedBuffers::encode(mesh.positions(), &rings)?;
        Ok(Self {
            mesh,
            rings,
            encoded,
        })
    }

    /// Validate, weld and build from raw vertex and index data.
    pub fn from_raw(
        positions: Vec<Vec3>,
        indices: &[u32],
        weld_tolerance: f32,
    ) -> Result<Self, ModelError> {
        let mesh = TriangleMesh::from_indices(positions, indices)?.welded(weld_tolerance)?;
        Self::build(mesh)
    }

    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    pub fn rings(&self) -> &AdjacencyRings {
        &self.rings
    }

    pub fn encoded(&self) -> &EncodedBuffers {
        &self.encoded
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    /// Pivot for the grab rotation.
    pub fn center(&self) -> Vec3 {
        self.mesh.bounds().center()
    }
}
