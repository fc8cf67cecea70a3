/// Point cloud coordinate bounds tracking and depth normalisation
use crate::mesh::Point;
use crate::settings::Execution;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Points scanned per chunk when bounds are computed in parallel
const BOUNDS_CHUNK: usize = 25_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointCloudBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl PointCloudBounds {
    /// Create new bounds initialised to infinity values
    pub fn new() -> Self {
        Self {
            min_x: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            min_y: f32::INFINITY,
            max_y: f32::NEG_INFINITY,
            min_z: f32::INFINITY,
            max_z: f32::NEG_INFINITY,
        }
    }

    /// Scan every point once and return its axis-aligned box.
    /// Min/max is order independent, so both executions give identical bounds.
    pub fn scan(points: &[Point], execution: Execution) -> Self {
        let local = |chunk: &[Point]| {
            let mut bounds = PointCloudBounds::new();
            for p in chunk {
                bounds.update(p.x, p.y, p.z);
            }
            bounds
        };

        match execution {
            Execution::Parallel => points
                .par_chunks(BOUNDS_CHUNK)
                .map(local)
                .reduce_with(PointCloudBounds::merge)
                .unwrap_or_else(PointCloudBounds::new),
            Execution::Sequential => local(points),
        }
    }

    /// Update bounds with a new point
    pub fn update(&mut self, x: f32, y: f32, z: f32) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    /// Union of two boxes
    pub fn merge(mut self, other: Self) -> Self {
        self.min_x = self.min_x.min(other.min_x);
        self.max_x = self.max_x.max(other.max_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_y = self.max_y.max(other.max_y);
        self.min_z = self.min_z.min(other.min_z);
        self.max_z = self.max_z.max(other.max_z);
        self
    }

    /// Get world space dimensions.
    /// Widened to f64 first; an f32 difference can round below the true span.
    pub fn dimensions(&self) -> (f64, f64, f64) {
        (
            f64::from(self.max_x) - f64::from(self.min_x),
            f64::from(self.max_y) - f64::from(self.min_y),
            f64::from(self.max_z) - f64::from(self.min_z),
        )
    }

    /// Box centre, used to recentre output positions
    pub fn centre(&self) -> (f32, f32, f32) {
        (
            0.5 * (self.min_x + self.max_x),
            0.5 * (self.min_y + self.max_y),
            0.5 * (self.min_z + self.max_z),
        )
    }

    /// Normalise Z coordinate to 0-1 range.
    /// A flat cloud maps every point to 0 so it colours uniformly.
    pub fn depth_scalar(&self, z: f32) -> f32 {
        let range = f64::from(self.max_z) - f64::from(self.min_z);
        if range > 0.0 {
            ((f64::from(z) - f64::from(self.min_z)) / range) as f32
        } else {
            0.0
        }
    }
}

impl Default for PointCloudBounds {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud() -> Vec<Point> {
        vec![
            Point::new(1.0, -2.0, 0.5),
            Point::new(-3.0, 4.0, 2.5),
            Point::new(0.0, 0.0, -1.5),
        ]
    }

    #[test]
    fn scan_finds_extremes() {
        let bounds = PointCloudBounds::scan(&cloud(), Execution::Sequential);
        assert_eq!((bounds.min_x, bounds.max_x), (-3.0, 1.0));
        assert_eq!((bounds.min_y, bounds.max_y), (-2.0, 4.0));
        assert_eq!((bounds.min_z, bounds.max_z), (-1.5, 2.5));
        assert_eq!(bounds.dimensions(), (4.0, 6.0, 4.0));
        assert_eq!(bounds.centre(), (-1.0, 1.0, 0.5));
    }

    #[test]
    fn dimensions_keep_spans_f32_cannot_hold() {
        let mut bounds = PointCloudBounds::new();
        bounds.update(-1.0, 0.0, 0.0);
        bounds.update(16_777_216.0, 0.0, 0.0);
        assert_eq!(bounds.dimensions().0, 16_777_217.0);
    }

    #[test]
    fn parallel_scan_matches_sequential() {
        let points: Vec<Point> = (0..60_000)
            .map(|i| {
                let f = i as f32;
                Point::new((f * 0.37).sin() * 10.0, (f * 0.11).cos() * 5.0, f * 1e-3)
            })
            .collect();
        assert_eq!(
            PointCloudBounds::scan(&points, Execution::Parallel),
            PointCloudBounds::scan(&points, Execution::Sequential)
        );
    }

    #[test]
    fn depth_scalar_spans_unit_range() {
        let bounds = PointCloudBounds::scan(&cloud(), Execution::Sequential);
        assert_eq!(bounds.depth_scalar(-1.5), 0.0);
        assert_eq!(bounds.depth_scalar(2.5), 1.0);
        assert!((bounds.depth_scalar(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn flat_cloud_has_zero_depth() {
        let mut bounds = PointCloudBounds::new();
        bounds.update(0.0, 0.0, 3.0);
        bounds.update(1.0, 1.0, 3.0);
        assert_eq!(bounds.depth_scalar(3.0), 0.0);
    }
}
