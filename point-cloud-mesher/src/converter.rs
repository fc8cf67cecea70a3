/// Point cloud file to triangle mesh conversion workflow.
use crate::laz::{create_reader, log_file_info};
use crate::ply_writer::write_mesh_ply;
use crate::summary::{MeshSummary, SourceBounds};
use indicatif::{ProgressBar, ProgressStyle};
use point_cloud_mesh::{
    DelaunayTriangulator, Execution, LogSink, Point, PointCloudBounds, ReconstructSettings,
    reconstruct,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Converts a single LAS/LAZ file into a PLY mesh plus JSON summary.
pub struct MeshConverter {
    /// Source point cloud file path.
    input_path: PathBuf,
    /// Output path prefix without extension.
    output_stem: String,
    settings: ReconstructSettings,
}

impl MeshConverter {
    /// Create converter for one input file.
    /// Settings come from an optional JSON file; missing fields keep their defaults.
    pub fn new(
        input_path: &str,
        output_stem: &str,
        settings_path: Option<&str>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let input_path = PathBuf::from(input_path);
        if !input_path.exists() {
            return Err(format!("Input file does not exist: {}", input_path.display()).into());
        }

        let settings = match settings_path {
            Some(path) => load_settings(Path::new(path))?,
            None => ReconstructSettings::default(),
        };

        Ok(Self {
            input_path,
            output_stem: output_stem.to_string(),
            settings,
        })
    }

    /// Load points, reconstruct the mesh and write both output files.
    pub fn convert(&self) -> Result<(), Box<dyn std::error::Error>> {
        println!("Converting {} to mesh", self.input_path.display());
        log_file_info(&self.input_path)?;

        let (points, source_bounds) = self.load_points()?;
        let local_bounds = PointCloudBounds::scan(&points, Execution::Parallel);
        self.print_bounds(&local_bounds);

        let log = LogSink::from_fn(|line| println!("{line}"));
        let mesh = reconstruct(&points, &self.settings, &DelaunayTriangulator, &log)?;

        let mesh_path = PathBuf::from(format!("{}_mesh.ply", self.output_stem));
        write_mesh_ply(&mesh_path, &mesh)?;
        println!("Saved {}", mesh_path.display());

        let summary = MeshSummary::new(
            &self.input_path,
            &mesh_path,
            source_bounds,
            local_bounds,
            &mesh,
            &self.settings,
        );
        summary.save(Path::new(&format!("{}_mesh.json", self.output_stem)))?;

        println!("Mesh complete:");
        println!("  Vertices: {}", mesh.vertex_count());
        println!("  Triangles: {}", mesh.triangle_count());
        Ok(())
    }

    /// Read every point, shifted so the header minimum becomes the origin.
    /// Shifting in double precision keeps georeferenced coordinates exact in f32.
    fn load_points(&self) -> Result<(Vec<Point>, SourceBounds), Box<dyn std::error::Error>> {
        let mut reader = create_reader(&self.input_path)?;
        let total_points = reader.header().number_of_points() as usize;
        let source_bounds = SourceBounds::from(reader.header().bounds());
        let [ox, oy, oz] = source_bounds.min;

        let pb = ProgressBar::new(total_points as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.cyan/blue}] {pos}/{len} points ({percent}%) {msg}")?
                .progress_chars("▉▊▋▌▍▎▏ "),
        );
        pb.set_message("Loading points");

        let mut points = Vec::with_capacity(total_points);
        for (idx, point_result) in reader.points().enumerate() {
            let point = point_result?;
            points.push(Point::new(
                (point.x - ox) as f32,
                (point.y - oy) as f32,
                (point.z - oz) as f32,
            ));

            if idx % 50_000 == 0 {
                pb.set_position(idx as u64);
            }
        }
        pb.finish_with_message("Points loaded");
        tracing::info!(points = points.len(), "point cloud loaded");

        Ok((points, source_bounds))
    }

    /// Print local coordinate bounds for validation.
    fn print_bounds(&self, bounds: &PointCloudBounds) {
        println!("Local bounds:");
        println!("  X: {:.3} to {:.3}", bounds.min_x, bounds.max_x);
        println!("  Y: {:.3} to {:.3}", bounds.min_y, bounds.max_y);
        println!("  Z: {:.3} to {:.3} (depth)", bounds.min_z, bounds.max_z);
    }
}

/// Parse reconstruction settings from JSON.
fn load_settings(path: &Path) -> Result<ReconstructSettings, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let settings = parse_settings(&text)?;
    tracing::info!(?settings, "settings loaded from {}", path.display());
    Ok(settings)
}

fn parse_settings(text: &str) -> serde_json::Result<ReconstructSettings> {
    serde_json::from_str(text)
}
