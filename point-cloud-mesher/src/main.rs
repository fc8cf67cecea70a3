/// Point cloud to triangle mesh converter main entry point
mod converter;
mod laz;
mod ply_writer;
mod summary;

use converter::MeshConverter;
use std::env;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <input.laz> [settings.json]", args[0]);
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_stem = input_path.trim_end_matches(".laz").trim_end_matches(".las");

    let converter = MeshConverter::new(input_path, output_stem, args.get(2).map(String::as_str))?;
    converter.convert()?;

    Ok(())
}
