// CLI entry point: render one cross section of a sample cloud to a PNG

use fieldslice::{Axis, PaletteId, SliceSession, SliceSpec};
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!(
            "Usage: {} <mesh.stl> <samples.txt> [axis=z] [value=0] [resolution=64] [out=slice.png]",
            args[0]
        );
        std::process::exit(2);
    }

    let mesh_path = PathBuf::from(&args[1]);
    let samples_path = PathBuf::from(&args[2]);
    let axis: Axis = args.get(3).map(String::as_str).unwrap_or("z").parse()?;
    let value: f64 = args.get(4).map(String::as_str).unwrap_or("0").parse()?;
    let resolution: u32 = args.get(5).map(String::as_str).unwrap_or("64").parse()?;
    let out_path = PathBuf::from(args.get(6).map(String::as_str).unwrap_or("slice.png"));

    let mut session = SliceSession::default();

    // Step 1: Load mesh
    log::info!("Step 1: Loading mesh from {:?}", mesh_path);
    session.load_mesh_file(&mesh_path)?;
    let mesh = session.mesh().expect("mesh just loaded");
    log::info!("  Triangles: {}", mesh.num_triangles());
    log::info!("  Dimensions: {:?}", mesh.dimensions());
    log::info!("  Display scale: {:.4}", session.transform().scale);

    // Step 2: Load samples
    log::info!("Step 2: Loading samples from {:?}", samples_path);
    let text = std::fs::read_to_string(&samples_path)?;
    session.load_samples(&text)?;
    log::info!("  Samples: {}", session.sample_count());
    log::info!("  Value range: {:?}", session.value_range());

    // Step 3: Render slice
    log::info!(
        "Step 3: Rendering {}={} at {}x{}",
        axis.label(),
        value,
        resolution,
        resolution
    );
    let spec = SliceSpec {
        axis,
        value,
        resolution,
    };
    let raster = session.render(&spec, PaletteId::BlueYellowRed);

    match raster.value_range {
        Some((min, max)) => log::info!("  Slice value range: {:.4} .. {:.4}", min, max),
        None => log::warn!("  Slice does not intersect any data (fully transparent)"),
    }

    // Step 4: Write image
    let image = image::RgbaImage::from_raw(raster.width, raster.height, raster.to_rgba_bytes())
        .expect("raster buffer matches its dimensions");
    image.save(&out_path)?;
    log::info!("  Written to {:?}", out_path);

    log::info!("✓ Slice complete");
    Ok(())
}
