/// Planar grid hashing from coordinates back to point identity
use crate::bounds::PointCloudBounds;
use crate::error::{ReconstructError, Result, reserve};
use crate::mesh::Point;
use std::collections::HashMap;

/// Marker for an unoccupied dense cell
const EMPTY_CELL: u32 = u32::MAX;

/// Integer cell coordinate (column, row)
pub type CellKey = (i64, i64);

/// Lookup capability shared by the dense and sparse backings.
/// Read-only after build, so concurrent queries need no locking.
pub trait CellLookup: Send + Sync {
    /// Index of the first point stored in `key`, if any
    fn get(&self, key: CellKey) -> Option<u32>;

    /// Number of occupied cells
    fn occupied(&self) -> usize;
}

/// Flat row-major grid covering the whole bounding box.
pub struct DenseGrid {
    width: u64,
    height: u64,
    cells: Vec<u32>,
}

impl DenseGrid {
    fn build(points: &[Point], layout: &GridLayout) -> Result<Self> {
        let len = usize::try_from(layout.width * layout.height)
            .map_err(|_| ReconstructError::Alloc("spatial grid"))?;
        let mut cells = Vec::new();
        reserve(&mut cells, len, "spatial grid")?;
        cells.resize(len, EMPTY_CELL);

        let mut grid = Self {
            width: layout.width,
            height: layout.height,
            cells,
        };
        for (i, p) in points.iter().enumerate() {
            // Every point inside the bounds has a cell; anything else means
            // the layout was not sized from these points.
            let pos = grid
                .slot(layout.key(p.x, p.y))
                .ok_or(ReconstructError::DegenerateBounds)?;
            // First observed point keeps the cell.
            if grid.cells[pos] == EMPTY_CELL {
                grid.cells[pos] = i as u32;
            }
        }
        Ok(grid)
    }

    fn slot(&self, (ix, iy): CellKey) -> Option<usize> {
        if ix < 0 || iy < 0 || ix as u64 >= self.width || iy as u64 >= self.height {
            return None;
        }
        Some((ix as u64 + iy as u64 * self.width) as usize)
    }
}

impl CellLookup for DenseGrid {
    fn get(&self, key: CellKey) -> Option<u32> {
        let pos = self.slot(key)?;
        match self.cells[pos] {
            EMPTY_CELL => None,
            index => Some(index),
        }
    }

    fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| **c != EMPTY_CELL).count()
    }
}

/// Hash map keyed by cell for boxes too large to grid densely.
pub struct SparseGrid {
    cells: HashMap<CellKey, u32>,
}

impl SparseGrid {
    fn build(points: &[Point], layout: &GridLayout) -> Result<Self> {
        let mut cells = HashMap::new();
        cells
            .try_reserve(points.len())
            .map_err(|_| ReconstructError::Alloc("spatial hash map"))?;
        for (i, p) in points.iter().enumerate() {
            cells.entry(layout.key(p.x, p.y)).or_insert(i as u32);
        }
        Ok(Self { cells })
    }
}

impl CellLookup for SparseGrid {
    fn get(&self, key: CellKey) -> Option<u32> {
        self.cells.get(&key).copied()
    }

    fn occupied(&self) -> usize {
        self.cells.len()
    }
}

/// Grid origin, resolution and extent derived from the bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub min_x: f64,
    pub min_y: f64,
    pub inv_cell: f64,
    pub width: u64,
    pub height: u64,
}

impl GridLayout {
    /// Size the grid for `bounds`, failing when it cannot span any cell.
    pub fn new(bounds: &PointCloudBounds, cell_size: f64) -> Result<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(ReconstructError::DegenerateBounds);
        }
        let inv_cell = 1.0 / cell_size;
        let (span_x, span_y, _) = bounds.dimensions();
        let width = cells_along(span_x, inv_cell).ok_or(ReconstructError::DegenerateBounds)?;
        let height = cells_along(span_y, inv_cell).ok_or(ReconstructError::DegenerateBounds)?;

        Ok(Self {
            min_x: f64::from(bounds.min_x),
            min_y: f64::from(bounds.min_y),
            inv_cell,
            width,
            height,
        })
    }

    /// Total cell count, `None` when it overflows 64 bits
    pub fn cell_count(&self) -> Option<u64> {
        self.width.checked_mul(self.height)
    }

    /// Cell containing a planar coordinate, rounded to the nearest cell centre
    pub fn key(&self, x: f32, y: f32) -> CellKey {
        (
            ((f64::from(x) - self.min_x) * self.inv_cell).round() as i64,
            ((f64::from(y) - self.min_y) * self.inv_cell).round() as i64,
        )
    }
}

/// Cells needed to cover `span` along one axis, computed in 64 bits
fn cells_along(span: f64, inv_cell: f64) -> Option<u64> {
    let cells = (span * inv_cell).ceil();
    if !cells.is_finite() || cells < 0.0 || cells >= u64::MAX as f64 {
        return None;
    }
    let cells = (cells as u64).checked_add(1)?;
    (cells > 0).then_some(cells)
}

/// Which backing the index chose at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backing {
    Dense,
    Sparse,
}

/// Coordinate to point-index map with first-write-wins collisions.
pub struct SpatialIndex {
    layout: GridLayout,
    backing: Backing,
    cells: Box<dyn CellLookup>,
}

impl SpatialIndex {
    /// Build the index, choosing a flat grid when the cell count fits `capacity`.
    pub fn build(
        points: &[Point],
        bounds: &PointCloudBounds,
        cell_size: f64,
        capacity: u64,
    ) -> Result<Self> {
        let layout = GridLayout::new(bounds, cell_size)?;
        let dense = layout.cell_count().is_some_and(|cells| cells <= capacity);

        let (backing, cells): (Backing, Box<dyn CellLookup>) = if dense {
            (Backing::Dense, Box::new(DenseGrid::build(points, &layout)?))
        } else {
            (Backing::Sparse, Box::new(SparseGrid::build(points, &layout)?))
        };

        Ok(Self {
            layout,
            backing,
            cells,
        })
    }

    /// Index of the canonical point for the cell holding (x, y)
    pub fn lookup(&self, x: f32, y: f32) -> Option<u32> {
        self.cells.get(self.layout.key(x, y))
    }

    pub fn backing(&self) -> Backing {
        self.backing
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn occupied(&self) -> usize {
        self.cells.occupied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Execution;

    fn index(points: &[Point], cell_size: f64, capacity: u64) -> SpatialIndex {
        let bounds = PointCloudBounds::scan(points, Execution::Sequential);
        SpatialIndex::build(points, &bounds, cell_size, capacity).unwrap()
    }

    fn scatter() -> Vec<Point> {
        (0..200)
            .map(|i| {
                let f = i as f32;
                Point::new((f * 0.731).fract() * 3.0, (f * 0.377).fract() * 2.0, f)
            })
            .collect()
    }

    #[test]
    fn layout_spans_box() {
        let points = [Point::new(0.0, 0.0, 0.0), Point::new(1.0, 0.5, 0.0)];
        let bounds = PointCloudBounds::scan(&points, Execution::Sequential);
        let layout = GridLayout::new(&bounds, 0.25).unwrap();
        assert_eq!((layout.width, layout.height), (5, 3));
        assert_eq!(layout.cell_count(), Some(15));
        assert_eq!(layout.key(1.0, 0.5), (4, 2));
        assert_eq!(layout.key(0.13, 0.0), (1, 0));
    }

    #[test]
    fn single_point_is_one_cell() {
        let points = [Point::new(2.0, 2.0, 0.0)];
        let bounds = PointCloudBounds::scan(&points, Execution::Sequential);
        let layout = GridLayout::new(&bounds, 1e-4).unwrap();
        assert_eq!((layout.width, layout.height), (1, 1));
    }

    #[test]
    fn non_finite_bounds_are_degenerate() {
        let points = [Point::new(0.0, 0.0, 0.0), Point::new(f32::INFINITY, 1.0, 0.0)];
        let bounds = PointCloudBounds::scan(&points, Execution::Sequential);
        assert!(matches!(
            SpatialIndex::build(&points, &bounds, 1e-4, 1 << 31),
            Err(ReconstructError::DegenerateBounds)
        ));
        let empty = PointCloudBounds::new();
        assert!(GridLayout::new(&empty, 1e-4).is_err());
    }

    #[test]
    fn backing_follows_capacity() {
        let points = scatter();
        assert_eq!(index(&points, 0.01, 1 << 31).backing(), Backing::Dense);
        assert_eq!(index(&points, 0.01, 100).backing(), Backing::Sparse);
    }

    #[test]
    fn every_point_resolves_to_its_cell_representative() {
        let points = scatter();
        for capacity in [1 << 31, 0] {
            let idx = index(&points, 1e-3, capacity);
            for p in &points {
                let found = idx.lookup(p.x, p.y).expect("inserted point must resolve");
                let first = points
                    .iter()
                    .position(|q| idx.layout().key(q.x, q.y) == idx.layout().key(p.x, p.y))
                    .unwrap();
                assert_eq!(found as usize, first);
            }
        }
    }

    #[test]
    fn first_write_wins_on_collision() {
        let points = [
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
            Point::new(1.004, 1.004, 5.0),
        ];
        for capacity in [1 << 31, 0] {
            let idx = index(&points, 0.01, capacity);
            assert_eq!(idx.lookup(1.004, 1.004), Some(1));
            assert_eq!(idx.lookup(1.0, 1.0), Some(1));
            assert_eq!(idx.occupied(), 2);
        }
    }

    #[test]
    fn dense_and_sparse_agree() {
        let points = scatter();
        let dense = index(&points, 1e-3, 1 << 31);
        let sparse = index(&points, 1e-3, 0);
        assert_eq!(dense.occupied(), sparse.occupied());
        for p in &points {
            assert_eq!(dense.lookup(p.x, p.y), sparse.lookup(p.x, p.y));
        }
    }

    #[test]
    fn far_edge_points_resolve_in_both_backings() {
        // 16777217 is not an f32, so the single precision span would round
        // down to 16777216 and undersize the grid by one cell.
        for swap in [false, true] {
            let raw = [(-1.0, 0.0), (16_777_216.0, 0.0), (8_000_000.0, 0.0)];
            let points: Vec<Point> = raw
                .iter()
                .map(|&(a, b)| if swap { Point::new(b, a, 0.0) } else { Point::new(a, b, 0.0) })
                .collect();
            let dense = index(&points, 2.0, 1 << 31);
            let sparse = index(&points, 2.0, 0);
            assert_eq!(dense.backing(), Backing::Dense);
            let long_side = if swap { dense.layout().height } else { dense.layout().width };
            assert_eq!(long_side, 8_388_610);
            for (i, p) in points.iter().enumerate() {
                assert_eq!(dense.lookup(p.x, p.y), Some(i as u32));
                assert_eq!(sparse.lookup(p.x, p.y), Some(i as u32));
            }
            assert_eq!(dense.occupied(), 3);
        }
    }

    #[test]
    fn misses_report_none() {
        let points = [Point::new(0.0, 0.0, 0.0), Point::new(1.0, 1.0, 0.0)];
        for capacity in [1 << 31, 0] {
            let idx = index(&points, 0.1, capacity);
            assert_eq!(idx.lookup(0.5, 0.5), None);
            assert_eq!(idx.lookup(-3.0, 0.0), None);
            assert_eq!(idx.lookup(0.0, 7.0), None);
        }
    }
}
