use las::Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Create LAS file reader for point cloud access.
/// Handles both .las and .laz compressed formats.
pub fn create_reader(file_path: &Path) -> Result<Reader, Box<dyn std::error::Error>> {
    let file = File::open(file_path)?;
    let buf_reader = BufReader::new(file);
    Ok(Reader::new(buf_reader)?)
}

/// Print the header fields that matter for meshing.
/// Bounds are the source extent; points are shifted by its minimum on load.
pub fn log_file_info(file_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let reader = create_reader(file_path)?;
    let header = reader.header();
    let bounds = header.bounds();

    println!(
        "{}: LAS {}.{}, {} points",
        file_path.display(),
        header.version().major,
        header.version().minor,
        header.number_of_points()
    );
    println!(
        "  Source extent: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
        bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
    );
    Ok(())
}
