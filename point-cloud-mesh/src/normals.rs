/// Per-vertex normal accumulation with bounded scratch memory
use crate::constants::UP_NORMAL;
use crate::error::{Result, reserve};
use crate::mesh::{Vec3f, Vertex};
use crate::settings::Execution;
use glam::Vec3;
use rayon::prelude::*;
use std::ops::Range;
use std::sync::atomic::{AtomicU32, Ordering};

/// Global per-vertex accumulator of face normals.
/// Each component is an f32 stored as bits and summed with a CAS loop.
pub struct NormalAccumulator {
    components: Vec<AtomicU32>,
}

impl NormalAccumulator {
    /// Zeroed accumulator for `vertex_count` vertices
    pub fn new(vertex_count: usize) -> Result<Self> {
        let mut components = Vec::new();
        reserve(&mut components, vertex_count * 3, "normal accumulator")?;
        components.extend((0..vertex_count * 3).map(|_| AtomicU32::new(0.0f32.to_bits())));
        Ok(Self { components })
    }

    /// Add `n` to vertex `vertex`, one atomic add per component.
    pub fn add(&self, vertex: usize, n: Vec3) {
        let base = vertex * 3;
        atomic_add_f32(&self.components[base], n.x);
        atomic_add_f32(&self.components[base + 1], n.y);
        atomic_add_f32(&self.components[base + 2], n.z);
    }

    /// Accumulated (unnormalised) normal of a vertex
    pub fn get(&self, vertex: usize) -> Vec3 {
        let base = vertex * 3;
        let load = |i: usize| f32::from_bits(self.components[base + i].load(Ordering::Relaxed));
        Vec3::new(load(0), load(1), load(2))
    }

    /// Accumulate face normals of every triangle into its vertices.
    ///
    /// Vertices are split into batches of `batch_size`; each batch allocates a
    /// scratch buffer for its own range, rescans the whole index buffer, and
    /// merges the scratch into the accumulator. Scratch memory therefore stays
    /// at one batch per worker no matter how many triangles there are.
    pub fn accumulate(
        &self,
        vertices: &[Vertex],
        indices: &[u32],
        batch_size: usize,
        execution: Execution,
    ) -> Result<()> {
        let batches = batch_ranges(vertices.len(), batch_size);
        match execution {
            Execution::Parallel => batches
                .into_par_iter()
                .try_for_each(|range| self.accumulate_batch(vertices, indices, range)),
            Execution::Sequential => batches
                .into_iter()
                .try_for_each(|range| self.accumulate_batch(vertices, indices, range)),
        }
    }

    fn accumulate_batch(&self, vertices: &[Vertex], indices: &[u32], range: Range<usize>) -> Result<()> {
        let mut scratch = Vec::new();
        reserve(&mut scratch, range.len(), "normal scratch")?;
        scratch.resize(range.len(), Vec3::ZERO);

        for tri in indices.chunks_exact(3) {
            let corners = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if !corners.iter().any(|v| range.contains(v)) {
                continue;
            }
            let normal = face_normal(
                vertices[corners[0]].position,
                vertices[corners[1]].position,
                vertices[corners[2]].position,
            );
            for v in corners {
                if range.contains(&v) {
                    scratch[v - range.start] += normal;
                }
            }
        }

        for (offset, n) in scratch.into_iter().enumerate() {
            self.add(range.start + offset, n);
        }
        Ok(())
    }

    /// Write unit normals into `vertices`, defaulting to up where nothing accumulated.
    pub fn normalise_into(&self, vertices: &mut [Vertex], execution: Execution) {
        let write = |(i, vertex): (usize, &mut Vertex)| {
            vertex.normal = unit_or_up(self.get(i));
        };
        match execution {
            Execution::Parallel => vertices.par_iter_mut().enumerate().for_each(write),
            Execution::Sequential => vertices.iter_mut().enumerate().for_each(write),
        }
    }
}

/// Split [0, count) into consecutive ranges of at most `batch_size`
pub fn batch_ranges(count: usize, batch_size: usize) -> Vec<Range<usize>> {
    let batch_size = batch_size.max(1);
    (0..count)
        .step_by(batch_size)
        .map(|start| start..(start + batch_size).min(count))
        .collect()
}

/// Area-weighted face normal, flipped so it never points below the plane.
pub fn face_normal(a: Vec3f, b: Vec3f, c: Vec3f) -> Vec3 {
    let a = Vec3::new(a.x, a.y, a.z);
    let ab = Vec3::new(b.x, b.y, b.z) - a;
    let ac = Vec3::new(c.x, c.y, c.z) - a;
    let n = ab.cross(ac);
    if n.z < 0.0 { -n } else { n }
}

fn unit_or_up(n: Vec3) -> Vec3f {
    let len = n.length();
    if len > 0.0 && len.is_finite() {
        let u = n / len;
        Vec3f::new(u.x, u.y, u.z)
    } else {
        Vec3f::from(UP_NORMAL)
    }
}

fn atomic_add_f32(cell: &AtomicU32, value: f32) {
    // The closure always returns Some, so the update cannot fail.
    let _ = cell.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
        Some((f32::from_bits(bits) + value).to_bits())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f32, y: f32, z: f32) -> Vertex {
        Vertex {
            position: Vec3f::new(x, y, z),
            ..Default::default()
        }
    }

    /// Small tent: a ridge along y with two sloped faces and one isolated vertex
    fn tent() -> (Vec<Vertex>, Vec<u32>) {
        let vertices = vec![
            vertex(0.0, 0.0, 0.0),
            vertex(2.0, 0.0, 0.0),
            vertex(1.0, 0.0, 1.0),
            vertex(1.0, 2.0, 1.0),
            vertex(0.0, 2.0, 0.0),
            vertex(2.0, 2.0, 0.0),
            vertex(9.0, 9.0, 9.0),
        ];
        let indices = vec![0, 2, 3, 0, 3, 4, 2, 1, 5, 2, 5, 3];
        (vertices, indices)
    }

    fn normals(batch: usize, execution: Execution) -> Vec<Vertex> {
        let (mut vertices, indices) = tent();
        let acc = NormalAccumulator::new(vertices.len()).unwrap();
        acc.accumulate(&vertices, &indices, batch, execution).unwrap();
        acc.normalise_into(&mut vertices, execution);
        vertices
    }

    #[test]
    fn batches_cover_range_exactly() {
        assert_eq!(batch_ranges(10, 4), vec![0..4, 4..8, 8..10]);
        assert_eq!(batch_ranges(3, 256_000), vec![0..3]);
        assert!(batch_ranges(0, 4).is_empty());
        assert_eq!(batch_ranges(2, 0), vec![0..1, 1..2]);
    }

    #[test]
    fn face_normal_points_up_for_either_winding() {
        let a = Vec3f::new(0.0, 0.0, 0.0);
        let b = Vec3f::new(1.0, 0.0, 0.0);
        let c = Vec3f::new(0.0, 1.0, 0.0);
        assert_eq!(face_normal(a, b, c), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(face_normal(a, c, b), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn referenced_vertices_get_unit_normals() {
        let vertices = normals(256_000, Execution::Sequential);
        for v in &vertices[..6] {
            assert!((v.normal.length() - 1.0).abs() < 1e-5, "{:?}", v.normal);
            assert!(v.normal.z > 0.0);
        }
        assert_eq!(vertices[6].normal, Vec3f::from(UP_NORMAL));
    }

    #[test]
    fn slope_vertices_follow_their_faces() {
        let vertices = normals(256_000, Execution::Sequential);
        let s = std::f32::consts::FRAC_1_SQRT_2;
        let (left, right) = (vertices[0].normal, vertices[1].normal);
        assert!((left.x + s).abs() < 1e-6 && left.y.abs() < 1e-6 && (left.z - s).abs() < 1e-6);
        assert!((right.x - s).abs() < 1e-6 && right.y.abs() < 1e-6 && (right.z - s).abs() < 1e-6);
    }

    #[test]
    fn batch_size_and_execution_do_not_change_results() {
        let reference = normals(256_000, Execution::Sequential);
        for batch in [1, 2, 3, 5] {
            for execution in [Execution::Sequential, Execution::Parallel] {
                assert_eq!(normals(batch, execution), reference);
            }
        }
    }

    #[test]
    fn flat_faces_default_to_up() {
        let mut vertices = vec![
            vertex(0.0, 0.0, 0.0),
            vertex(1.0, 0.0, 0.0),
            vertex(1.0, 1.0, 0.0),
            vertex(0.0, 1.0, 0.0),
        ];
        let indices = [0, 1, 2, 0, 2, 3];
        let acc = NormalAccumulator::new(4).unwrap();
        acc.accumulate(&vertices, &indices, 2, Execution::Parallel).unwrap();
        acc.normalise_into(&mut vertices, Execution::Parallel);
        for v in &vertices {
            assert_eq!(v.normal, Vec3f::from(UP_NORMAL));
        }
    }

    #[test]
    fn atomic_adds_sum_components() {
        let acc = NormalAccumulator::new(2).unwrap();
        (0..1000).into_par_iter().for_each(|_| acc.add(1, Vec3::new(1.0, 2.0, 0.5)));
        assert_eq!(acc.get(1), Vec3::new(1000.0, 2000.0, 500.0));
        assert_eq!(acc.get(0), Vec3::ZERO);
    }
}
