//! Closed, consistently wound primitives.
//!
//! The capped cylinder stands in for the loaded cylinder asset; the
//! tetrahedron and octahedron are the smallest closed meshes with uniform
//! valence and are used throughout the tests.

use glam::Vec3;
use std::f32::consts::TAU;

use super::TriangleMesh;

/// Regular tetrahedron inscribed in the cube [-1, 1]^3. Every vertex has valence 3.
pub fn tetrahedron() -> TriangleMesh {
    let positions = vec![
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(-1.0, -1.0, 1.0),
    ];
    let faces = vec![[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]];
    TriangleMesh::from_trusted(positions, faces)
}

/// Regular octahedron with vertices on the unit axes. Every vertex has valence 4.
///
/// Vertex order: +X, -X, +Y, -Y, +Z, -Z.
pub fn octahedron() -> TriangleMesh {
    let positions = vec![
        Vec3::X,
        Vec3::NEG_X,
        Vec3::Y,
        Vec3::NEG_Y,
        Vec3::Z,
        Vec3::NEG_Z,
    ];
    let faces = vec![
        // Upper half (+Z)
        [0, 2, 4],
        [2, 1, 4],
        [1, 3, 4],
        [3, 0, 4],
        // Lower half (-Z)
        [2, 0, 5],
        [1, 2, 5],
        [3, 1, 5],
        [0, 3, 5],
    ];
    TriangleMesh::from_trusted(positions, faces)
}

/// Dimensions and tessellation of a capped cylinder along the Z axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderParams {
    pub radius: f32,
    pub height: f32,
    /// Vertices around the circumference (at least 3)
    pub radial_segments: u32,
    /// Quad rows along the side (at least 1)
    pub height_segments: u32,
    /// Concentric rings per cap including the rim (at least 1)
    pub cap_rings: u32,
}

impl Default for CylinderParams {
    fn default() -> Self {
        Self {
            radius: 0.35,
            height: 1.4,
            radial_segments: 48,
            height_segments: 32,
            cap_rings: 4,
        }
    }
}

/// Closed cylinder centered on the origin, axis along Z, caps facing the camera axis.
///
/// Caps are built from concentric rings so that only the two cap centers
/// have a valence above six.
pub fn capped_cylinder(params: &CylinderParams) -> TriangleMesh {
    let segments = params.radial_segments.max(3);
    let rows = params.height_segments.max(1);
    let rings = params.cap_rings.max(1);
    let half_height = params.height * 0.5;

    let mut positions: Vec<Vec3> = Vec::new();
    let mut faces: Vec<[u32; 3]> = Vec::new();

    let angle = |k: u32| (k % segments) as f32 / segments as f32 * TAU;

    // Side rows, bottom (row 0) to top (row `rows`)
    for j in 0..=rows {
        let z = -half_height + params.height * j as f32 / rows as f32;
        for k in 0..segments {
            let (sin, cos) = angle(k).sin_cos();
            positions.push(Vec3::new(params.radius * cos, params.radius * sin, z));
        }
    }
    let side = |j: u32, k: u32| j * segments + k % segments;

    // Inner cap rings (the rim is the first/last side row)
    let inner_ring_start = |z: f32, positions: &mut Vec<Vec3>| -> u32 {
        let start = positions.len() as u32;
        for m in 1..rings {
            let r = params.radius * m as f32 / rings as f32;
            for k in 0..segments {
                let (sin, cos) = angle(k).sin_cos();
                positions.push(Vec3::new(r * cos, r * sin, z));
            }
        }
        start
    };
    let top_inner = inner_ring_start(half_height, &mut positions);
    let bottom_inner = inner_ring_start(-half_height, &mut positions);

    let top_center = positions.len() as u32;
    positions.push(Vec3::new(0.0, 0.0, half_height));
    let bottom_center = positions.len() as u32;
    positions.push(Vec3::new(0.0, 0.0, -half_height));

    // Side quads, outward facing
    for j in 0..rows {
        for k in 0..segments {
            let a = side(j, k);
            let b = side(j, k + 1);
            let c = side(j + 1, k + 1);
            let d = side(j + 1, k);
            faces.push([a, b, c]);
            faces.push([a, c, d]);
        }
    }

    // Ring m (1..=rings) of a cap; ring `rings` is the rim shared with the side
    let cap_ring = |inner_start: u32, rim_row: u32, m: u32, k: u32| -> u32 {
        if m == rings {
            side(rim_row, k)
        } else {
            inner_start + (m - 1) * segments + k % segments
        }
    };

    for (inner_start, rim_row, center, facing_up) in [
        (top_inner, rows, top_center, true),
        (bottom_inner, 0, bottom_center, false),
    ] {
        let mut push = |a: u32, b: u32, c: u32| {
            if facing_up {
                faces.push([a, b, c]);
            } else {
                faces.push([a, c, b]);
            }
        };

        for k in 0..segments {
            push(
                center,
                cap_ring(inner_start, rim_row, 1, k),
                cap_ring(inner_start, rim_row, 1, k + 1),
            );
        }
        for m in 1..rings {
            for k in 0..segments {
                let in_k = cap_ring(inner_start, rim_row, m, k);
                let in_k1 = cap_ring(inner_start, rim_row, m, k + 1);
                let out_k = cap_ring(inner_start, rim_row, m + 1, k);
                let out_k1 = cap_ring(inner_start, rim_row, m + 1, k + 1);
                push(in_k, out_k, out_k1);
                push(in_k, out_k1, in_k1);
            }
        }
    }

    TriangleMesh::from_trusted(positions, faces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Every directed edge appears once and its reverse appears once.
    fn assert_closed_and_consistent(mesh: &TriangleMesh) {
        let mut directed: HashMap<(u32, u32), usize> = HashMap::new();
        for &[a, b, c] in mesh.faces() {
            for edge in [(a, b), (b, c), (c, a)] {
                *directed.entry(edge).or_default() += 1;
            }
        }
        for (&(from, to), &count) in &directed {
            assert_eq!(count, 1, "edge {from}->{to} repeated");
            assert_eq!(directed.get(&(to, from)), Some(&1), "edge {from}->{to} unpaired");
        }
    }

    /// Face normals point away from the centroid for these convex shapes.
    fn assert_outward(mesh: &TriangleMesh) {
        let center = mesh.bounds().center();
        for face in 0..mesh.face_count() {
            let (a, b, c) = mesh.face_positions(face);
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid - center) > 0.0, "face {face} faces inward");
        }
    }

    #[test]
    fn test_tetrahedron_closed() {
        let mesh = tetrahedron();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 4);
        assert_closed_and_consistent(&mesh);
        assert_outward(&mesh);
    }

    #[test]
    fn test_octahedron_closed() {
        let mesh = octahedron();
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.face_count(), 8);
        assert_closed_and_consistent(&mesh);
        assert_outward(&mesh);
    }

    #[test]
    fn test_cylinder_closed() {
        let params = CylinderParams {
            radial_segments: 12,
            height_segments: 5,
            cap_rings: 3,
            ..Default::default()
        };
        let mesh = capped_cylinder(&params);
        // 6 side rows + 2 caps * 2 inner rings + 2 centers
        assert_eq!(mesh.vertex_count(), 12 * 6 + 2 * 2 * 12 + 2);
        assert_closed_and_consistent(&mesh);
        assert_outward(&mesh);

        let bounds = mesh.bounds();
        assert!((bounds.max.z - 0.7).abs() < 1e-6);
        assert!((bounds.min.z + 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_cylinder_single_ring_cap() {
        let params = CylinderParams {
            radial_segments: 6,
            height_segments: 1,
            cap_rings: 1,
            ..Default::default()
        };
        let mesh = capped_cylinder(&params);
        assert_eq!(mesh.vertex_count(), 6 * 2 + 2);
        assert_closed_and_consistent(&mesh);
    }
}
