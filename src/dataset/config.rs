//! Dataset configuration and its YAML file form.
//!
//! A dataset file looks like:
//!
//! ```yaml
//! camera_model: FC7203
//! resolution:
//!   width: 4000
//!   height: 3000
//! # optional, both or neither
//! mosaic_origin_easting: 500000.0
//! mosaic_origin_northing: 4982950.0
//! images:
//!   - image_id: DJI_0001.JPG
//!     latitude: 45.0
//!     longitude: 3.0
//!     relative_altitude_m: 10.0
//!     flight_yaw_deg: 0.0
//!     flight_pitch_deg: 0.0
//!     flight_roll_deg: 0.0
//!     gimbal_yaw_deg: 0.0
//!     gimbal_pitch_deg: -90.0
//!     gimbal_roll_deg: 0.0
//! ```

use super::{DatasetBuilder, PoseDataset, PoseInitError, Telemetry};
use crate::camera::Resolution;
use crate::placement::MosaicOrigin;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;

/// Tunable behaviour of the dataset builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Explicit mosaic origin easting, in UTM metres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mosaic_origin_easting: Option<f64>,
    /// Explicit mosaic origin northing, in UTM metres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mosaic_origin_northing: Option<f64>,
}

impl DatasetConfig {
    /// The explicit origin, if configured.
    ///
    /// # Errors
    ///
    /// Returns [`PoseInitError::Config`] if only one coordinate is set or a
    /// coordinate is not finite.
    pub fn origin(&self) -> Result<Option<MosaicOrigin>, PoseInitError> {
        match (self.mosaic_origin_easting, self.mosaic_origin_northing) {
            (None, None) => Ok(None),
            (Some(easting), Some(northing)) => {
                if !easting.is_finite() || !northing.is_finite() {
                    return Err(PoseInitError::Config(format!(
                        "mosaic origin must be finite, got ({easting}, {northing})"
                    )));
                }
                Ok(Some(MosaicOrigin { easting, northing }))
            }
            _ => Err(PoseInitError::Config(
                "mosaic origin needs both easting and northing".to_string(),
            )),
        }
    }
}

/// On-disk description of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetFile {
    pub camera_model: String,
    pub resolution: Resolution,
    #[serde(flatten)]
    pub config: DatasetConfig,
    pub images: Vec<Telemetry>,
}

impl DatasetFile {
    /// Loads a dataset description from a YAML file.
    pub fn load_from_yaml(path: &str) -> Result<Self, PoseInitError> {
        let contents = fs::read_to_string(path)?;
        let file: DatasetFile = serde_yaml::from_str(&contents)?;
        info!(
            "Loaded {} images of camera {} from {path}",
            file.images.len(),
            file.camera_model
        );
        Ok(file)
    }

    /// Saves the dataset description to a YAML file.
    pub fn save_to_yaml(&self, path: &str) -> Result<(), PoseInitError> {
        let yaml = serde_yaml::to_string(self)?;
        if let Some(parent) = std::path::Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Builds the dataset described by this file.
    pub fn build(&self) -> Result<PoseDataset, PoseInitError> {
        DatasetBuilder::new(&self.camera_model, self.resolution)?
            .with_config(self.config)
            .build(&self.images)
    }
}
