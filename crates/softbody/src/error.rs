//! Error types for model construction and solver setup.
//!
//! All of these are fatal: they are raised once, before the first frame runs,
//! and indicate a malformed mesh or a preprocessing bug. A pointer ray that
//! misses the mesh is not an error and is reported as `None` instead.

use thiserror::Error;

/// Errors raised while validating raw mesh data.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("Mesh has no vertices")]
    NoVertices,
    #[error("Mesh has no faces")]
    NoFaces,
    #[error("Index count {0} not divisible by 3")]
    IndexCount(usize),
    #[error("Face {face} references vertex {index} but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        face: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("Face {face} is degenerate (repeats vertex {index})")]
    DegenerateFace { face: usize, index: u32 },
}

/// Errors raised while walking the face fan around each vertex.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("Vertex {vertex} has no incident faces")]
    IsolatedVertex { vertex: u32 },
    #[error("No face continues the fan of vertex {vertex} across edge {vertex} -> {next} (mesh is not closed)")]
    MissingSharedFace { vertex: u32, next: u32 },
    #[error("Directed edge {from} -> {to} appears in more than one face (non-manifold edge or inconsistent winding)")]
    NonManifoldEdge { from: u32, to: u32 },
    #[error("Fan of vertex {vertex} visits {visited} of its {incident} faces (non-manifold vertex)")]
    IncompleteFan {
        vertex: u32,
        visited: usize,
        incident: usize,
    },
}

/// Errors raised while packing positions and rings into grid buffers.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("Nothing to encode")]
    Empty,
    #[error("Ring count {rings} does not match vertex count {vertices}")]
    LengthMismatch { rings: usize, vertices: usize },
    #[error("Ring of vertex {vertex} references vertex {neighbor} outside 0..{vertex_count}")]
    NeighborOutOfRange {
        vertex: usize,
        neighbor: u32,
        vertex_count: usize,
    },
}

/// Errors raised when the solver is handed inconsistent buffers.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Buffer '{buffer}' has resolution {actual}, expected {expected}")]
    ShapeMismatch {
        buffer: &'static str,
        expected: u32,
        actual: u32,
    },
    #[error("Neighbor buffers: {indices} index buffers but {distances} distance buffers")]
    NeighborBufferCount { indices: usize, distances: usize },
    #[error("Cell {cell} names neighbor {neighbor} outside 0..{vertex_count}")]
    NeighborOutOfRange {
        cell: usize,
        neighbor: i64,
        vertex_count: usize,
    },
}

/// Any error that can abort building a [`crate::SoftbodyModel`].
#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}
