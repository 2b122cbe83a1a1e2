//! Vertex welding.
//!
//! Exported meshes duplicate vertices along UV and normal seams. Without
//! welding those seams become open edges and the fan walk around a seam
//! vertex never returns to its first face, so positionally identical
//! vertices are merged before adjacency is built.

use glam::Vec3;
use std::collections::HashMap;

use super::TriangleMesh;
use crate::error::MeshError;

impl TriangleMesh {
    /// Merge vertices whose positions agree within `tolerance`.
    ///
    /// Surviving vertices keep their first-seen order. Faces that collapse to
    /// fewer than three distinct vertices are dropped.
    pub fn welded(&self, tolerance: f32) -> Result<Self, MeshError> {
        let scale = 1.0 / tolerance.max(f32::EPSILON);
        let quantize = |p: Vec3| -> [i64; 3] {
            [
                (p.x * scale).round() as i64,
                (p.y * scale).round() as i64,
                (p.z * scale).round() as i64,
            ]
        };

        let mut key_to_new: HashMap<[i64; 3], u32> = HashMap::new();
        let mut remap: Vec<u32> = Vec::with_capacity(self.positions.len());
        let mut positions: Vec<Vec3> = Vec::new();

        for &p in &self.positions {
            let next = positions.len() as u32;
            let new_index = *key_to_new.entry(quantize(p)).or_insert_with(|| {
                positions.push(p);
                next
            });
            remap.push(new_index);
        }

        let faces: Vec<[u32; 3]> = self
            .faces
            .iter()
            .map(|&[a, b, c]| {
                [
                    remap[a as usize],
                    remap[b as usize],
                    remap[c as usize],
                ]
            })
            .filter(|&[a, b, c]| a != b && b != c && a != c)
            .collect();

        let welded_count = self.positions.len() - positions.len();
        if welded_count > 0 {
            tracing::debug!(
                "welded {} duplicate vertices ({} unique of {} total), dropped {} degenerate faces",
                welded_count,
                positions.len(),
                self.positions.len(),
                self.faces.len() - faces.len()
            );
        }

        Self::new(positions, faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::octahedron;

    /// Octahedron with the +X vertex duplicated for the lower half, as an
    /// exporter would emit along a seam.
    fn seamed_octahedron() -> TriangleMesh {
        let base = octahedron();
        let mut positions = base.positions().to_vec();
        positions.push(Vec3::X);
        let faces = base
            .faces()
            .iter()
            .enumerate()
            .map(|(i, &face)| {
                if i >= 4 {
                    face.map(|v| if v == 0 { 6 } else { v })
                } else {
                    face
                }
            })
            .collect();
        TriangleMesh::new(positions, faces).unwrap()
    }

    #[test]
    fn test_weld_merges_seam() {
        let mesh = seamed_octahedron();
        assert_eq!(mesh.vertex_count(), 7);

        let welded = mesh.welded(1e-4).unwrap();
        assert_eq!(welded.vertex_count(), 6);
        assert_eq!(welded.face_count(), 8);
        assert_eq!(welded.faces(), octahedron().faces());
    }

    #[test]
    fn test_weld_drops_collapsed_faces() {
        let positions = vec![
            Vec3::ZERO,
            Vec3::new(0.00001, 0.0, 0.0),
            Vec3::Y,
            Vec3::X,
        ];
        let mesh = TriangleMesh::new(positions, vec![[0, 1, 2], [0, 3, 2]]).unwrap();
        let welded = mesh.welded(1e-3).unwrap();
        assert_eq!(welded.vertex_count(), 3);
        assert_eq!(welded.face_count(), 1);
    }

    #[test]
    fn test_weld_keeps_distinct_vertices() {
        let mesh = octahedron();
        let welded = mesh.welded(1e-4).unwrap();
        assert_eq!(welded.positions(), mesh.positions());
    }
}
