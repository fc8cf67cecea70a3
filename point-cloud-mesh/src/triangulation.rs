/// Planar triangulation engine seam
use crate::error::{Result, reserve};

/// Projected (x, y) coordinate
pub type PlanarPoint = [f32; 2];

/// Triangle described by coordinates rather than indices
pub type PlanarTriangle = [PlanarPoint; 3];

/// External geometry engine producing triangles over projected points.
///
/// Implementations must return coordinates exactly as they were given (no
/// snapping); vertices that drift out of their grid cell cannot be resolved
/// back to a point and their triangle is dropped. Output order and
/// duplicates are unconstrained.
pub trait Triangulator: Send + Sync {
    fn triangulate(&self, points: &[PlanarPoint]) -> Result<Vec<PlanarTriangle>>;
}

/// Delaunay triangulation backed by the `delaunator` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct DelaunayTriangulator;

impl Triangulator for DelaunayTriangulator {
    fn triangulate(&self, points: &[PlanarPoint]) -> Result<Vec<PlanarTriangle>> {
        let mut sites = Vec::new();
        reserve(&mut sites, points.len(), "triangulation input")?;
        sites.extend(points.iter().map(|[x, y]| delaunator::Point {
            x: f64::from(*x),
            y: f64::from(*y),
        }));

        let triangulation = delaunator::triangulate(&sites);

        let mut triangles = Vec::new();
        reserve(&mut triangles, triangulation.triangles.len() / 3, "triangulation output")?;
        // Coordinates are copied from the input, never read back from the f64 sites.
        triangles.extend(
            triangulation
                .triangles
                .chunks_exact(3)
                .map(|t| [points[t[0]], points[t[1]], points[t[2]]]),
        );
        Ok(triangles)
    }
}
