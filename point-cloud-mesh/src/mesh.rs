/// Output vertex layout and owned mesh buffers
use crate::bounds::PointCloudBounds;
use crate::colour_map::map_colour;
use crate::error::{Result, reserve};
use crate::settings::Execution;
use bytemuck::{Pod, Zeroable};
use rayon::prelude::*;

/// Three packed single-precision floats.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vec3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3f {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

impl From<[f32; 3]> for Vec3f {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Input point; identity is its position in the input slice.
pub type Point = Vec3f;

/// Interleaved vertex read by the host as position, normal, colour.
/// 36 bytes with no padding; the host keeps an identical description.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3f,
    pub normal: Vec3f,
    pub colour: Vec3f,
}

const _: () = assert!(std::mem::size_of::<Vertex>() == 36);
const _: () = assert!(std::mem::align_of::<Vertex>() == 4);

/// Reconstructed mesh owned on the Rust side.
/// Dropping it releases both buffers, so early returns never leak.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    /// One vertex per input point, in input order.
    pub vertices: Vec<Vertex>,
    /// Three indices per triangle.
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate triangles as index triplets
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }
}

/// Allocate the vertex buffer and fill recentred positions and depth colours.
/// Normals are left zeroed until accumulation finishes.
pub fn assemble_vertices(
    points: &[Point],
    bounds: &PointCloudBounds,
    execution: Execution,
) -> Result<Vec<Vertex>> {
    let mut vertices = Vec::new();
    reserve(&mut vertices, points.len(), "vertex buffer")?;
    vertices.resize(points.len(), Vertex::zeroed());

    let (cx, cy, cz) = bounds.centre();
    let fill = |(vertex, p): (&mut Vertex, &Point)| {
        vertex.position = Vec3f::new(p.x - cx, p.y - cy, p.z - cz);
        vertex.colour = *map_colour(bounds.depth_scalar(p.z));
    };

    match execution {
        Execution::Parallel => vertices.par_iter_mut().zip(points.par_iter()).for_each(fill),
        Execution::Sequential => vertices.iter_mut().zip(points.iter()).for_each(fill),
    }

    Ok(vertices)
}
