//! Soft body core for Mochi
//!
//! A closed triangle mesh is turned into per-vertex adjacency rings, packed
//! into square grid buffers with split-precision positions, and advanced
//! every frame by a fixed sequence of per-cell compute passes:
//! integration, pointer offset, distance-constraint relaxation and normals.
//!
//! Nothing here depends on a window or a renderer. The caller feeds pointer
//! events and a [`ScreenRay`] source to the [`FrameDriver`] and receives the
//! reassembled positions and normals through a [`FrameSink`].

pub mod adjacency;
pub mod encoding;
pub mod error;
pub mod frame;
pub mod grid;
pub mod mesh;
pub mod model;
pub mod pointer;
pub mod raycast;
pub mod solver;
pub mod split;
pub mod view;

pub use adjacency::{AdjacencyRings, RingStats};
pub use encoding::{EncodedBuffers, NEIGHBOR_SENTINEL};
pub use error::{EncodingError, MeshError, ModelError, SolverError, TopologyError};
pub use frame::{FrameClock, FrameDriver, FrameOutput, FrameReport, FrameSink};
pub use grid::GridBuffer;
pub use mesh::{Aabb, CylinderParams, TriangleMesh, VertexId};
pub use model::SoftbodyModel;
pub use pointer::{PointerController, PointerEvent, PointerPhase, PointerSource};
pub use solver::{PointerInput, SolverPipeline};
pub use split::{SplitBuffer, SplitPart};
pub use view::{PerspectiveView, Plane, Ray, ScreenRay};

pub use glam;
pub use mochi_config as config;
