/// C ABI entry points: reconstruct into a caller-owned Mesh and release it again.
use crate::error::{ReconstructError, Status};
use crate::logging::{LogFn, LogSink};
use crate::mesh::{MeshBuffers, Point, Vertex};
use crate::reconstruct::reconstruct;
use crate::settings::{ReconstructMode, ReconstructSettings};
use crate::triangulation::DelaunayTriangulator;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr;

/// Output aggregate shared with the host.
///
/// Buffers are only ever populated by [`reconstruct_mesh`] and must only be
/// freed through [`free_mesh`]. `index_count` is the number of indices, three
/// per triangle.
#[repr(C)]
#[derive(Debug)]
pub struct Mesh {
    pub vertices: *mut Vertex,
    pub indices: *mut u32,
    pub vertex_count: u32,
    pub index_count: u32,
}

impl Mesh {
    /// Empty mesh: null buffers, zero counts
    pub const fn empty() -> Self {
        Self {
            vertices: ptr::null_mut(),
            indices: ptr::null_mut(),
            vertex_count: 0,
            index_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_null() && self.indices.is_null()
    }

    /// Hand both buffers over to the host-visible aggregate
    fn take_ownership(&mut self, buffers: MeshBuffers) {
        let MeshBuffers { vertices, indices } = buffers;
        self.vertex_count = vertices.len() as u32;
        self.index_count = indices.len() as u32;
        self.vertices = Box::into_raw(vertices.into_boxed_slice()) as *mut Vertex;
        self.indices = Box::into_raw(indices.into_boxed_slice()) as *mut u32;
    }

    /// Reclaim and drop both buffers, leaving the mesh empty.
    ///
    /// # Safety
    /// Non-null pointers must come from [`Mesh::take_ownership`] with the
    /// matching counts and must not have been released before.
    unsafe fn release(&mut self) {
        if !self.vertices.is_null() {
            let slice = ptr::slice_from_raw_parts_mut(self.vertices, self.vertex_count as usize);
            drop(unsafe { Box::from_raw(slice) });
        }
        if !self.indices.is_null() {
            let slice = ptr::slice_from_raw_parts_mut(self.indices, self.index_count as usize);
            drop(unsafe { Box::from_raw(slice) });
        }
        *self = Mesh::empty();
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Mesh::empty()
    }
}

/// Reconstruct a colored, normal-shaded triangle mesh from `point_count` points.
///
/// `mode` and `tolerance` are reserved and ignored. `out_mesh` is written only
/// on success; on failure it is left exactly as the caller passed it.
///
/// # Safety
/// `points` must be null or valid for `point_count` reads, `out_mesh` must be
/// null or point to a writable [`Mesh`], and `log` must be null or a function
/// safe to call with a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn reconstruct_mesh(
    points: *const Point,
    point_count: u32,
    mode: u32,
    tolerance: f64,
    out_mesh: *mut Mesh,
    log: Option<LogFn>,
) -> Status {
    if out_mesh.is_null() {
        return ReconstructError::NullOutput.status();
    }
    if points.is_null() || (point_count as usize) < crate::constants::MIN_POINTS {
        return ReconstructError::TooFewPoints(point_count as usize).status();
    }

    // SAFETY: non-null and valid for `point_count` reads per the contract above.
    let points = unsafe { std::slice::from_raw_parts(points, point_count as usize) };
    let sink = LogSink::from_foreign(log);
    let mode = ReconstructMode::from_raw(mode).unwrap_or_else(|| {
        tracing::debug!(mode, "unknown reconstruct mode ignored");
        ReconstructMode::default()
    });
    let settings = ReconstructSettings {
        mode,
        tolerance,
        ..ReconstructSettings::default()
    };

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        reconstruct(points, &settings, &DelaunayTriangulator, &sink)
    }))
    .unwrap_or(Err(ReconstructError::Panicked))
    .and_then(|buffers| match u32::try_from(buffers.indices.len()) {
        Ok(_) => Ok(buffers),
        Err(_) => Err(ReconstructError::Alloc("index buffer")),
    });

    match outcome {
        Ok(buffers) => {
            // SAFETY: checked non-null above; the caller guarantees it is writable.
            unsafe { (*out_mesh).take_ownership(buffers) };
            Status::Ok
        }
        Err(err) => {
            tracing::debug!(%err, "reconstruct_mesh failed");
            err.status()
        }
    }
}

/// Release buffers produced by [`reconstruct_mesh`] and reset the mesh.
/// Null meshes and already empty meshes are a no-op, so repeated calls are safe.
///
/// # Safety
/// `mesh` must be null or point to a [`Mesh`] that is empty or was filled by
/// [`reconstruct_mesh`] and not modified since.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn free_mesh(mesh: *mut Mesh) {
    if let Some(mesh) = unsafe { mesh.as_mut() } {
        unsafe { mesh.release() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_round_trip() {
        let buffers = MeshBuffers {
            vertices: vec![Vertex::default(); 3],
            indices: vec![0, 1, 2],
        };
        let mut mesh = Mesh::empty();
        mesh.take_ownership(buffers);
        assert!(!mesh.is_empty());
        assert_eq!((mesh.vertex_count, mesh.index_count), (3, 3));

        unsafe { free_mesh(&mut mesh) };
        assert!(mesh.is_empty());
        assert_eq!((mesh.vertex_count, mesh.index_count), (0, 0));
    }

    #[test]
    fn free_null_is_noop() {
        unsafe { free_mesh(ptr::null_mut()) };
    }
}
