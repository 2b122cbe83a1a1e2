//! Ordered vertex adjacency rings.
//!
//! For every vertex the faces around it are walked as a fan, always turning
//! in the face-winding direction, and the neighbor crossed at each step is
//! appended to the vertex's ring. The walk stops when it arrives back at the
//! face it started from, so on a closed manifold mesh each ring lists every
//! neighbor exactly once, in cyclic order.
//!
//! Rings are stored in one arena (`neighbors`) addressed by per-vertex
//! offsets, with the rest length of each (vertex, neighbor) pair stored in a
//! parallel arena.

use std::collections::HashSet;

use crate::error::TopologyError;
use crate::mesh::{TriangleMesh, VertexId};

/// Smallest and largest ring length across all vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingStats {
    pub min: usize,
    pub max: usize,
}

/// One cyclic neighbor ring per vertex plus the rest length of every entry.
#[derive(Debug, Clone)]
pub struct AdjacencyRings {
    /// `offsets[v]..offsets[v + 1]` is the ring of vertex `v`
    offsets: Vec<u32>,
    neighbors: Vec<u32>,
    rest_lengths: Vec<f32>,
    stats: RingStats,
}

impl AdjacencyRings {
    /// Walk the face fan of every vertex of a closed, consistently wound mesh.
    pub fn build(mesh: &TriangleMesh) -> Result<Self, TopologyError> {
        let faces = mesh.faces();
        let vertex_count = mesh.vertex_count();

        // Each directed edge may belong to one face only, otherwise the
        // "face across this edge" lookup below is ambiguous
        let mut directed: HashSet<(u32, u32)> = HashSet::with_capacity(faces.len() * 3);
        for &[a, b, c] in faces {
            for (from, to) in [(a, b), (b, c), (c, a)] {
                if !directed.insert((from, to)) {
                    return Err(TopologyError::NonManifoldEdge { from, to });
                }
            }
        }

        let mut incident: Vec<Vec<usize>> = vec![Vec::new(); vertex_count];
        for (face_idx, face) in faces.iter().enumerate() {
            for &v in face {
                incident[v as usize].push(face_idx);
            }
        }

        let positions = mesh.positions();
        let mut offsets = Vec::with_capacity(vertex_count + 1);
        let mut neighbors = Vec::with_capacity(faces.len() * 3);
        let mut rest_lengths = Vec::with_capacity(faces.len() * 3);
        offsets.push(0);

        for (v, fan) in incident.iter().enumerate() {
            let vertex = v as u32;
            let &start = fan
                .first()
                .ok_or(TopologyError::IsolatedVertex { vertex })?;

            let ring_start = neighbors.len();
            let mut face = start;
            loop {
                let next = preceding_vertex(faces[face], vertex);
                neighbors.push(next);
                rest_lengths.push(positions[v].distance(positions[next as usize]));

                face = face_with_edge(faces, fan, vertex, next)
                    .ok_or(TopologyError::MissingSharedFace { vertex, next })?;

                let visited = neighbors.len() - ring_start;
                if face == start {
                    if visited != fan.len() {
                        return Err(TopologyError::IncompleteFan {
                            vertex,
                            visited,
                            incident: fan.len(),
                        });
                    }
                    break;
                }
                if visited >= fan.len() {
                    // Unreachable with unique directed edges; guards the loop
                    return Err(TopologyError::IncompleteFan {
                        vertex,
                        visited,
                        incident: fan.len(),
                    });
                }
            }
            offsets.push(neighbors.len() as u32);
        }

        let stats = ring_stats(&offsets);
        tracing::info!(
            "adjacency rings built for {} vertices: ring length min {}, max {}",
            vertex_count,
            stats.min,
            stats.max
        );

        Ok(Self {
            offsets,
            neighbors,
            rest_lengths,
            stats,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Ordered neighbors of a vertex.
    pub fn ring(&self, vertex: VertexId) -> &[u32] {
        &self.neighbors[self.range(vertex.index())]
    }

    /// Rest length to each neighbor, parallel to [`Self::ring`].
    pub fn rest_lengths(&self, vertex: VertexId) -> &[f32] {
        &self.rest_lengths[self.range(vertex.index())]
    }

    /// Iterate rings in vertex order.
    pub fn iter(&self) -> impl Iterator<Item = &[u32]> + '_ {
        self.offsets
            .windows(2)
            .map(|w| &self.neighbors[w[0] as usize..w[1] as usize])
    }

    pub fn stats(&self) -> RingStats {
        self.stats
    }

    /// Longest ring; decides how many neighbor buffers the encoder allocates.
    pub fn max_ring_len(&self) -> usize {
        self.stats.max
    }

    fn range(&self, v: usize) -> std::ops::Range<usize> {
        self.offsets[v] as usize..self.offsets[v + 1] as usize
    }
}

/// The vertex that comes just before `vertex` in the face's winding.
fn preceding_vertex([a, b, c]: [u32; 3], vertex: u32) -> u32 {
    if a == vertex {
        c
    } else if b == vertex {
        a
    } else {
        b
    }
}

/// The incident face that contains the directed edge `from -> to`.
fn face_with_edge(faces: &[[u32; 3]], fan: &[usize], from: u32, to: u32) -> Option<usize> {
    fan.iter().copied().find(|&f| {
        let [a, b, c] = faces[f];
        (a == from && b == to) || (b == from && c == to) || (c == from && a == to)
    })
}

fn ring_stats(offsets: &[u32]) -> RingStats {
    let lengths = offsets.windows(2).map(|w| (w[1] - w[0]) as usize);
    let (min, max) = lengths.fold((usize::MAX, 0), |(min, max), len| {
        (min.min(len), max.max(len))
    });
    RingStats {
        min: if min == usize::MAX { 0 } else { min },
        max,
    }
}
