//! Initial pose estimation for a drone image dataset
//!
//! Reads a dataset description (camera model, resolution and per-image telemetry)
//! and writes the per-image affine and rotation transforms used to seed stitching.
//!
//! **Usage:**
//! ```bash
//! # Place every image relative to the dataset's bounding-box centre
//! cargo run --bin pose_init -- \
//!   --input samples/dataset_fc7203.yaml \
//!   --output output/poses.yaml
//!
//! # Reuse a known mosaic origin
//! cargo run --bin pose_init -- \
//!   --input samples/dataset_fc7203.yaml \
//!   --output output/poses.yaml \
//!   --origin-easting 500000.0 --origin-northing 4982950.0
//! ```

use clap::Parser;
use drone_pose_init::camera;
use drone_pose_init::util;
use drone_pose_init::DatasetFile;
use log::info;
use std::path::PathBuf;
use std::time::Instant;

/// Telemetry-based initial pose estimation tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the dataset YAML file
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Path of the pose YAML file to write
    #[arg(short = 'o', long, default_value = "output/poses.yaml")]
    output: PathBuf,

    /// Mosaic origin easting in UTM metres (requires --origin-northing)
    #[arg(long, requires = "origin_northing")]
    origin_easting: Option<f64>,

    /// Mosaic origin northing in UTM metres (requires --origin-easting)
    #[arg(long, requires = "origin_easting")]
    origin_northing: Option<f64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();

    println!("🛩️  DRONE POSE INITIALIZATION");
    println!("=============================");
    println!("Input file: {:?}", cli.input);
    println!("Output file: {:?}", cli.output);
    println!("Known cameras: {}", camera::registered_models().join(", "));
    println!();

    let input_path = cli.input.to_str().ok_or("Invalid input path string")?;
    let output_path = cli.output.to_str().ok_or("Invalid output path string")?;

    let mut dataset_file = DatasetFile::load_from_yaml(input_path)?;
    if let (Some(easting), Some(northing)) = (cli.origin_easting, cli.origin_northing) {
        info!("Overriding mosaic origin with ({easting:.3}, {northing:.3})");
        dataset_file.config.mosaic_origin_easting = Some(easting);
        dataset_file.config.mosaic_origin_northing = Some(northing);
    }

    let start = Instant::now();
    let dataset = dataset_file.build()?;
    let elapsed = start.elapsed();
    info!(
        "✅ Placed {} images in {:.2} ms",
        dataset.len(),
        elapsed.as_secs_f64() * 1000.0
    );

    util::display_dataset_summary(&dataset);
    util::export_poses_yaml(&dataset, output_path)?;

    println!();
    println!("💾 Poses written to {output_path}");

    Ok(())
}
