/// Binary little-endian PLY output for reconstructed meshes.
use point_cloud_mesh::{MeshBuffers, Vec3f};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Write mesh to a PLY file on disk.
/// Buffered so the per-vertex records do not hit the file one by one.
pub fn write_mesh_ply(path: &Path, mesh: &MeshBuffers) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_ply(&mut writer, mesh)?;
    writer.flush()?;
    Ok(())
}

/// Serialise mesh as binary PLY to any writer.
/// Vertices carry position, normal and 8-bit colour; faces are triangle index lists.
pub fn write_ply<W: Write>(writer: &mut W, mesh: &MeshBuffers) -> io::Result<()> {
    write!(
        writer,
        "ply\n\
         format binary_little_endian 1.0\n\
         comment generated by point-cloud-mesher\n\
         element vertex {}\n\
         property float x\n\
         property float y\n\
         property float z\n\
         property float nx\n\
         property float ny\n\
         property float nz\n\
         property uchar red\n\
         property uchar green\n\
         property uchar blue\n\
         element face {}\n\
         property list uchar uint vertex_indices\n\
         end_header\n",
        mesh.vertex_count(),
        mesh.triangle_count()
    )?;

    for vertex in &mesh.vertices {
        for value in [
            vertex.position.x,
            vertex.position.y,
            vertex.position.z,
            vertex.normal.x,
            vertex.normal.y,
            vertex.normal.z,
        ] {
            writer.write_all(&value.to_le_bytes())?;
        }
        writer.write_all(&colour_bytes(&vertex.colour))?;
    }

    for triangle in mesh.triangles() {
        writer.write_all(&[3u8])?;
        for index in triangle {
            writer.write_all(&index.to_le_bytes())?;
        }
    }

    Ok(())
}

/// Quantise a unit-range colour to 8 bits per channel
fn colour_bytes(colour: &Vec3f) -> [u8; 3] {
    let quantise = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [quantise(colour.x), quantise(colour.y), quantise(colour.z)]
}
