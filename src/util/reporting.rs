//! Reporting and export of initial image poses.
//!
//! Console output mirrors a per-image table; the YAML export carries the records
//! consumed by the stitcher, in input order.

use crate::dataset::{ImagePose, PoseDataset};
use crate::geodesy::UtmZone;
use crate::placement::MosaicOrigin;
use nalgebra::{Matrix3, Matrix4};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

use super::{ensure_parent_dir, UtilError};

/// Per-image record handed to the stitching stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseReport {
    pub image_id: String,
    pub affine_transform: Matrix3<f64>,
    pub rotation_transform: Matrix4<f64>,
    pub gsd_width: f64,
    pub gsd_height: f64,
}

impl From<&ImagePose> for PoseReport {
    fn from(pose: &ImagePose) -> Self {
        PoseReport {
            image_id: pose.image_id.clone(),
            affine_transform: pose.placement.affine_transform,
            rotation_transform: pose.placement.rotation_transform,
            gsd_width: pose.placement.gsd_width,
            gsd_height: pose.placement.gsd_height,
        }
    }
}

#[derive(Serialize)]
struct PoseExport<'a> {
    zone: UtmZone,
    origin: MosaicOrigin,
    images: &'a [PoseReport],
}

/// Display a summary table of a placed dataset.
pub fn display_dataset_summary(dataset: &PoseDataset) {
    let origin = dataset.origin();
    println!("\n📍 INITIAL POSES");
    println!("================");
    println!(
        "Images: {} | Zone: {} | Origin: ({:.3}, {:.3})",
        dataset.len(),
        dataset.zone(),
        origin.easting,
        origin.northing
    );
    println!(
        "{:<24} | {:>14} | {:>14} | {:>8} | {:>8} | {:>10} | {:>10}",
        "Image", "Easting (m)", "Northing (m)", "GSD w", "GSD h", "Pixel x", "Pixel y"
    );
    println!(
        "{:-<24}-+-{:-<14}-+-{:-<14}-+-{:-<8}-+-{:-<8}-+-{:-<10}-+-{:-<10}",
        "", "", "", "", "", "", ""
    );

    for pose in dataset.poses() {
        println!(
            "{:<24} | {:>14.3} | {:>14.3} | {:>8.4} | {:>8.4} | {:>10.1} | {:>10.1}",
            pose.image_id,
            pose.ground_projection.ground_easting,
            pose.ground_projection.ground_northing,
            pose.placement.gsd_width,
            pose.placement.gsd_height,
            pose.placement.pixel_x,
            pose.placement.pixel_y
        );
    }
}

/// Write the stitcher records of `dataset` to a YAML file.
pub fn export_poses_yaml(dataset: &PoseDataset, path: &str) -> Result<(), UtilError> {
    ensure_parent_dir(path)?;

    let images: Vec<PoseReport> = dataset.poses().iter().map(PoseReport::from).collect();
    let export = PoseExport {
        zone: dataset.zone(),
        origin: dataset.origin(),
        images: &images,
    };

    let yaml = serde_yaml::to_string(&export)?;
    let mut file = File::create(path)
        .map_err(|e| UtilError::IOError(format!("Failed to create pose file: {e}")))?;
    file.write_all(yaml.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Resolution;
    use crate::dataset::{DatasetBuilder, Telemetry};
    use std::fs;

    fn sample_dataset() -> PoseDataset {
        let telemetry: Vec<Telemetry> = (0..3)
            .map(|i| Telemetry {
                image_id: format!("IMG_{i:04}.JPG"),
                latitude: 45.0 + i as f64 * 1e-4,
                longitude: 3.0,
                relative_altitude_m: 30.0,
                flight_yaw_deg: 10.0,
                flight_pitch_deg: 0.0,
                flight_roll_deg: 0.0,
                gimbal_yaw_deg: 0.0,
                gimbal_pitch_deg: -90.0,
                gimbal_roll_deg: 0.0,
            })
            .collect();
        DatasetBuilder::new(
            "FC330",
            Resolution {
                width: 4000,
                height: 3000,
            },
        )
        .unwrap()
        .build(&telemetry)
        .unwrap()
    }

    #[test]
    fn test_report_from_pose() {
        let dataset = sample_dataset();
        let pose = &dataset.poses()[1];
        let report = PoseReport::from(pose);
        assert_eq!(report.image_id, "IMG_0001.JPG");
        assert_eq!(report.affine_transform, pose.placement.affine_transform);
        assert_eq!(report.rotation_transform, pose.placement.rotation_transform);
        assert_eq!(report.gsd_width, pose.placement.gsd_width);
    }

    #[test]
    fn test_export_poses_yaml() {
        let dataset = sample_dataset();
        display_dataset_summary(&dataset);

        let path = "output/test_poses.yaml";
        export_poses_yaml(&dataset, path).unwrap();

        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("IMG_0000.JPG"));
        assert!(contents.contains("IMG_0002.JPG"));
        assert!(contents.contains("gsd_width"));

        fs::remove_file(path).ok();
    }
}
