/// Recovery of point indices from coordinate triangles
use crate::error::{ReconstructError, Result, reserve};
use crate::spatial_index::SpatialIndex;
use crate::triangulation::PlanarTriangle;

/// Counts of triangles dropped during resolution
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolveStats {
    pub kept: usize,
    pub unresolved: usize,
    pub degenerate: usize,
}

/// Map every triangle corner back to a point index through the spatial index.
///
/// Triangles with a corner that finds no point, or with two corners sharing
/// one point, are skipped. Survivors keep their encounter order, three
/// indices each. An empty result is an error: nothing usable was produced.
pub fn resolve_triangles(
    triangles: &[PlanarTriangle],
    index: &SpatialIndex,
) -> Result<(Vec<u32>, ResolveStats)> {
    let mut indices = Vec::new();
    reserve(&mut indices, triangles.len() * 3, "index buffer")?;
    let mut stats = ResolveStats::default();

    for tri in triangles {
        let [a, b, c] = tri.map(|[x, y]| index.lookup(x, y));
        let (Some(a), Some(b), Some(c)) = (a, b, c) else {
            stats.unresolved += 1;
            continue;
        };
        if a == b || b == c || c == a {
            stats.degenerate += 1;
            continue;
        }
        indices.extend_from_slice(&[a, b, c]);
        stats.kept += 1;
    }

    if indices.is_empty() {
        return Err(ReconstructError::NoTriangles);
    }
    Ok((indices, stats))
}
