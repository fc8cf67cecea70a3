/// JSON summary written next to the reconstructed mesh.
use point_cloud_mesh::{MeshBuffers, PointCloudBounds, ReconstructSettings};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Source file extent in its own coordinate system.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SourceBounds {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl From<las::Bounds> for SourceBounds {
    fn from(bounds: las::Bounds) -> Self {
        Self {
            min: [bounds.min.x, bounds.min.y, bounds.min.z],
            max: [bounds.max.x, bounds.max.y, bounds.max.z],
        }
    }
}

/// Reconstruction record for downstream tooling.
/// Mesh positions are recentred, so `local_origin` plus the local bounds centre
/// recovers the source coordinates of the mesh origin.
#[derive(Serialize, Deserialize, Debug)]
pub struct MeshSummary {
    pub source_file: String,
    pub mesh_file: String,
    pub point_count: usize,
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// Offset subtracted from source coordinates before reconstruction.
    pub local_origin: [f64; 3],
    pub source_bounds: SourceBounds,
    /// Bounds of the shifted single precision points.
    pub local_bounds: PointCloudBounds,
    pub settings: ReconstructSettings,
}

impl MeshSummary {
    pub fn new(
        source_file: &Path,
        mesh_file: &Path,
        source_bounds: SourceBounds,
        local_bounds: PointCloudBounds,
        mesh: &MeshBuffers,
        settings: &ReconstructSettings,
    ) -> Self {
        Self {
            source_file: source_file.display().to_string(),
            mesh_file: mesh_file.display().to_string(),
            point_count: mesh.vertex_count(),
            vertex_count: mesh.vertex_count(),
            triangle_count: mesh.triangle_count(),
            local_origin: source_bounds.min,
            source_bounds,
            local_bounds,
            settings: settings.clone(),
        }
    }

    /// Save summary as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        println!("Saved {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use point_cloud_mesh::Vertex;

    #[test]
    fn summary_serialises_counts_and_origin() {
        let mesh = MeshBuffers {
            vertices: vec![Vertex::default(); 4],
            indices: vec![0, 1, 2, 0, 2, 3],
        };
        let source = SourceBounds {
            min: [1000.0, 2000.0, 10.0],
            max: [1001.0, 2001.0, 12.0],
        };
        let mut local = PointCloudBounds::new();
        local.update(0.0, 0.0, 0.0);
        local.update(1.0, 1.0, 2.0);

        let summary = MeshSummary::new(
            Path::new("site.laz"),
            Path::new("site_mesh.ply"),
            source,
            local,
            &mesh,
            &ReconstructSettings::default(),
        );
        let json: serde_json::Value = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["vertex_count"], 4);
        assert_eq!(json["triangle_count"], 2);
        assert_eq!(json["local_origin"][1], 2000.0);
        assert_eq!(json["local_bounds"]["max_z"], 2.0);
        assert_eq!(json["settings"]["normal_batch_size"], 256_000);
    }
}
