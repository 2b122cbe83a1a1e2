//! Ray-mesh intersection for pointer picking.
//!
//! Picking always runs against the undeformed mesh, so this is a brute-force
//! Moller-Trumbore test over every face of the rest geometry.

use glam::Vec3;

use crate::mesh::{TriangleMesh, VertexId};
use crate::view::Ray;

/// Epsilon for floating point comparisons in ray intersection
const EPSILON: f32 = 1e-6;

/// Result of a ray-triangle intersection test
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    /// Distance along the ray to the intersection point
    pub t: f32,
    /// Barycentric coordinate u (weight for vertex 1)
    pub u: f32,
    /// Barycentric coordinate v (weight for vertex 2)
    pub v: f32,
}

/// Closest intersection of a ray with a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshHit {
    pub face: usize,
    pub point: Vec3,
    pub t: f32,
    /// Vertex of the hit face closest to `point`
    pub nearest_vertex: VertexId,
}

/// Moller-Trumbore ray-triangle intersection algorithm.
///
/// Returns the hit distance and barycentric coordinates if the ray intersects
/// the triangle. Both windings are accepted.
pub fn ray_triangle_intersection(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<TriangleHit> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let pvec = ray.direction.cross(edge2);
    let det = edge1.dot(pvec);

    // Ray parallel to the triangle plane
    if det.abs() < EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let tvec = ray.origin - v0;

    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = ray.direction.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(qvec) * inv_det;

    // Only accept hits in front of the ray
    if t < EPSILON {
        return None;
    }

    Some(TriangleHit { t, u, v })
}

/// Cast a ray against every face and return the closest hit.
pub fn raycast_mesh(ray: &Ray, mesh: &TriangleMesh) -> Option<MeshHit> {
    let mut closest_hit: Option<(TriangleHit, usize)> = None;

    for face in 0..mesh.face_count() {
        let (v0, v1, v2) = mesh.face_positions(face);

        if let Some(hit) = ray_triangle_intersection(ray, v0, v1, v2) {
            let dominated = match &closest_hit {
                Some((prev, _)) => hit.t >= prev.t,
                None => false,
            };
            if !dominated {
                closest_hit = Some((hit, face));
            }
        }
    }

    closest_hit.map(|(hit, face)| {
        let point = ray.at(hit.t);
        MeshHit {
            face,
            point,
            t: hit.t,
            nearest_vertex: nearest_face_vertex(mesh, face, point),
        }
    })
}

/// The vertex of `face` with the smallest straight-line distance to `point`.
pub fn nearest_face_vertex(mesh: &TriangleMesh, face: usize, point: Vec3) -> VertexId {
    let [a, b, c] = mesh.faces()[face];
    let distance = |v: u32| mesh.position(VertexId(v)).distance_squared(point);

    let mut best = a;
    for candidate in [b, c] {
        if distance(candidate) < distance(best) {
            best = candidate;
        }
    }
    VertexId(best)
}
