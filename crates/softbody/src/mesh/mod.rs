//! Indexed triangle mesh consumed by the adjacency builder, the state encoder,
//! and pointer picking.
//!
//! The mesh is immutable after validation. Faces are vertex-index triples with
//! a consistent counter-clockwise winding when viewed from outside.

mod primitives;
mod weld;

pub use primitives::{capped_cylinder, octahedron, tetrahedron, CylinderParams};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::MeshError;

/// Type-safe vertex identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u32);

impl VertexId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Smallest box containing every point. Empty input yields a zero box.
    pub fn from_points(points: &[Vec3]) -> Self {
        let Some(&first) = points.first() else {
            return Self {
                min: Vec3::ZERO,
                max: Vec3::ZERO,
            };
        };
        points.iter().fold(
            Self {
                min: first,
                max: first,
            },
            |aabb, &p| Self {
                min: aabb.min.min(p),
                max: aabb.max.max(p),
            },
        )
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Validated triangle mesh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriangleMesh {
    positions: Vec<Vec3>,
    faces: Vec<[u32; 3]>,
    bounds: Aabb,
}

impl TriangleMesh {
    /// Build a mesh from positions and face triples.
    ///
    /// Every face index must be in range and no face may repeat a vertex.
    pub fn new(positions: Vec<Vec3>, faces: Vec<[u32; 3]>) -> Result<Self, MeshError> {
        if positions.is_empty() {
            return Err(MeshError::NoVertices);
        }
        if faces.is_empty() {
            return Err(MeshError::NoFaces);
        }

        let vertex_count = positions.len();
        for (face_idx, face) in faces.iter().enumerate() {
            for &index in face {
                if index as usize >= vertex_count {
                    return Err(MeshError::IndexOutOfRange {
                        face: face_idx,
                        index,
                        vertex_count,
                    });
                }
            }
            let [a, b, c] = *face;
            if a == b || a == c {
                return Err(MeshError::DegenerateFace {
                    face: face_idx,
                    index: a,
                });
            }
            if b == c {
                return Err(MeshError::DegenerateFace {
                    face: face_idx,
                    index: b,
                });
            }
        }

        let bounds = Aabb::from_points(&positions);
        Ok(Self {
            positions,
            faces,
            bounds,
        })
    }

    /// Build a mesh from geometry known to be valid (generated primitives).
    pub(crate) fn from_trusted(positions: Vec<Vec3>, faces: Vec<[u32; 3]>) -> Self {
        debug_assert!(Self::new(positions.clone(), faces.clone()).is_ok());
        let bounds = Aabb::from_points(&positions);
        Self {
            positions,
            faces,
            bounds,
        }
    }

    /// Build a mesh from a flat triangle index list (3 per triangle).
    pub fn from_indices(positions: Vec<Vec3>, indices: &[u32]) -> Result<Self, MeshError> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::IndexCount(indices.len()));
        }
        let faces = indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
            .collect();
        Self::new(positions, faces)
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn position(&self, vertex: VertexId) -> Vec3 {
        self.positions[vertex.index()]
    }

    /// Get the vertex positions for a face
    pub fn face_positions(&self, face: usize) -> (Vec3, Vec3, Vec3) {
        let [a, b, c] = self.faces[face];
        (
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        )
    }

    /// Flat index list, 3 per triangle, for handing to a renderer.
    pub fn indices(&self) -> Vec<u32> {
        self.faces.iter().flatten().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_range_index() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let result = TriangleMesh::new(positions, vec![[0, 1, 3]]);
        assert!(matches!(
            result,
            Err(MeshError::IndexOutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn test_rejects_degenerate_face() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let result = TriangleMesh::new(positions, vec![[0, 1, 1]]);
        assert!(matches!(result, Err(MeshError::DegenerateFace { .. })));
    }

    #[test]
    fn test_from_indices_requires_triples() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let result = TriangleMesh::from_indices(positions, &[0, 1]);
        assert!(matches!(result, Err(MeshError::IndexCount(2))));
    }

    #[test]
    fn test_bounds_and_indices() {
        let mesh = octahedron();
        let bounds = mesh.bounds();
        assert_eq!(bounds.min, Vec3::splat(-1.0));
        assert_eq!(bounds.max, Vec3::splat(1.0));
        assert_eq!(bounds.center(), Vec3::ZERO);
        assert_eq!(mesh.indices().len(), mesh.face_count() * 3);
    }
}
