//! Point cloud to shaded triangle mesh reconstruction.
//!
//! Points are projected onto the XY plane and triangulated; a grid hash maps
//! the returned coordinates back to point identity, face normals are summed
//! per vertex in memory-bounded batches, and every vertex is coloured by its
//! depth through a quantised ramp. The result is exposed both as owned Rust
//! buffers ([`reconstruct()`]) and through a C ABI ([`ffi`]).

pub mod bounds;
pub mod colour_map;
pub mod constants;
pub mod error;
pub mod ffi;
pub mod logging;
pub mod mesh;
pub mod normals;
pub mod reconstruct;
pub mod resolver;
pub mod settings;
pub mod spatial_index;
pub mod triangulation;

pub use bounds::PointCloudBounds;
pub use error::{ReconstructError, Result, Status};
pub use ffi::{Mesh, free_mesh, reconstruct_mesh};
pub use logging::{LogFn, LogSink, LogTag};
pub use mesh::{MeshBuffers, Point, Vec3f, Vertex};
pub use reconstruct::{reconstruct, reconstruct_points};
pub use settings::{Execution, ReconstructMode, ReconstructSettings};
pub use triangulation::{DelaunayTriangulator, PlanarPoint, PlanarTriangle, Triangulator};
