//! Two-phase construction of the initial image poses of a dataset.
//!
//! The builder moves through three states:
//!
//! 1. [`DatasetBuilder`]: camera, resolution and configuration are known.
//! 2. [`ProjectedDataset`]: every image has been projected to the ground
//!    (phase 1), zone consistency has been checked and the mosaic origin is fixed.
//! 3. [`PoseDataset`]: every image has been placed in the mosaic (phase 2). This
//!    state is immutable.
//!
//! Per-image work within each phase runs in parallel with `rayon`; the only
//! synchronisation point is the origin fold between the two phases. Any per-image
//! failure aborts the whole build.

use crate::attitude::{self, Attitude, ComposedAttitude};
use crate::camera::{self, CameraError, CameraModel, Resolution};
use crate::geodesy::{self, UtmZone};
use crate::ground::{self, GeometryError, GroundProjection};
use crate::gsd::GroundSampleDistance;
use crate::placement::{self, MosaicOrigin, MosaicPlacement};
use log::{debug, info};
use nalgebra::{Matrix3, Matrix4, Rotation3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub mod config;

pub use config::{DatasetConfig, DatasetFile};

/// Image id reported for failures that concern the whole dataset rather than one image.
pub const DATASET_SCOPE: &str = "<dataset>";

/// Errors raised while building a dataset.
///
/// Every per-image variant names the offending image. Camera and resolution
/// failures are shared by all images and use [`DATASET_SCOPE`] instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PoseInitError {
    #[error("Unknown camera model: {model}")]
    UnknownCameraModel { model: String },
    #[error("Image {image_id} lies in UTM zone {found}, expected {expected}")]
    ZoneMismatch {
        image_id: String,
        expected: UtmZone,
        found: UtmZone,
    },
    #[error("Image {image_id}: optical axis does not meet the ground (n.d = {n_dot_d:e})")]
    DegenerateGeometry { image_id: String, n_dot_d: f64 },
    #[error("Image {image_id}: invalid telemetry: {reason}")]
    InvalidTelemetry { image_id: String, reason: String },
    #[error("Dataset contains no images")]
    EmptyDataset,
    #[error("Image id {image_id} appears more than once")]
    DuplicateImageId { image_id: String },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("IO Error: {0}")]
    IOError(String),
    #[error("Failed to load YAML: {0}")]
    YamlError(String),
}

impl PoseInitError {
    fn invalid_telemetry(image_id: &str, reason: impl ToString) -> Self {
        PoseInitError::InvalidTelemetry {
            image_id: image_id.to_string(),
            reason: reason.to_string(),
        }
    }

    fn from_geometry(image_id: &str, err: GeometryError) -> Self {
        match err {
            GeometryError::DegenerateGeometry { n_dot_d } => PoseInitError::DegenerateGeometry {
                image_id: image_id.to_string(),
                n_dot_d,
            },
            GeometryError::InvalidParams(reason) => Self::invalid_telemetry(image_id, reason),
        }
    }
}

impl From<CameraError> for PoseInitError {
    fn from(err: CameraError) -> Self {
        match err {
            CameraError::UnknownCameraModel(model) => PoseInitError::UnknownCameraModel { model },
            CameraError::InvalidParams(reason) => Self::invalid_telemetry(DATASET_SCOPE, reason),
        }
    }
}

impl From<std::io::Error> for PoseInitError {
    fn from(err: std::io::Error) -> Self {
        PoseInitError::IOError(err.to_string())
    }
}

impl From<serde_yaml::Error> for PoseInitError {
    fn from(err: serde_yaml::Error) -> Self {
        PoseInitError::YamlError(err.to_string())
    }
}

/// Per-image telemetry, already normalised to degrees and metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub image_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Altitude above the take-off point, used as height above the ground plane.
    pub relative_altitude_m: f64,
    pub flight_yaw_deg: f64,
    pub flight_pitch_deg: f64,
    pub flight_roll_deg: f64,
    pub gimbal_yaw_deg: f64,
    /// Raw gimbal pitch; `-90` points the camera straight down.
    ///
    /// A raw `0` is not nadir: after the +90 offset the optical axis is
    /// horizontal and the image fails with [`PoseInitError::DegenerateGeometry`].
    pub gimbal_pitch_deg: f64,
    pub gimbal_roll_deg: f64,
}

impl Telemetry {
    pub fn flight_attitude(&self) -> Attitude {
        Attitude::new(
            self.flight_yaw_deg,
            self.flight_pitch_deg,
            self.flight_roll_deg,
        )
    }

    pub fn gimbal_attitude(&self) -> Attitude {
        Attitude::new(
            self.gimbal_yaw_deg,
            self.gimbal_pitch_deg,
            self.gimbal_roll_deg,
        )
    }

    /// Checks that all fields are finite and the altitude is positive.
    pub fn validate(&self) -> Result<(), PoseInitError> {
        if self.image_id.is_empty() {
            return Err(PoseInitError::invalid_telemetry("", "image id is empty"));
        }
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(PoseInitError::invalid_telemetry(
                &self.image_id,
                format!(
                    "position must be finite, got ({}, {})",
                    self.latitude, self.longitude
                ),
            ));
        }
        if !self.relative_altitude_m.is_finite() || self.relative_altitude_m <= 0.0 {
            return Err(PoseInitError::invalid_telemetry(
                &self.image_id,
                format!(
                    "relative altitude must be finite and positive, got {}",
                    self.relative_altitude_m
                ),
            ));
        }
        if !self.flight_attitude().is_finite() || !self.gimbal_attitude().is_finite() {
            return Err(PoseInitError::invalid_telemetry(
                &self.image_id,
                "attitude angles must be finite",
            ));
        }
        Ok(())
    }
}

/// Phase-1 result for one image.
#[derive(Debug, Clone)]
struct ProjectedImage {
    telemetry: Telemetry,
    attitude: ComposedAttitude,
    projection: GroundProjection,
    gsd: GroundSampleDistance,
}

fn project_image(
    telemetry: &Telemetry,
    camera: &CameraModel,
    resolution: &Resolution,
) -> Result<ProjectedImage, PoseInitError> {
    telemetry.validate()?;
    let id = telemetry.image_id.as_str();

    let utm = geodesy::project(telemetry.latitude, telemetry.longitude)
        .map_err(|e| PoseInitError::invalid_telemetry(id, e))?;
    let attitude = attitude::compose(&telemetry.flight_attitude(), &telemetry.gimbal_attitude());
    let offset = ground::ground_offset(&attitude.image_frame, telemetry.relative_altitude_m)
        .map_err(|e| PoseInitError::from_geometry(id, e))?;
    let projection = GroundProjection::new(&utm, &offset);
    let gsd = GroundSampleDistance::from_camera(telemetry.relative_altitude_m, camera, resolution)
        .map_err(|e| PoseInitError::invalid_telemetry(id, e))?;

    debug!(
        "{id}: utm ({:.3}, {:.3}) zone {}, ground ({:.3}, {:.3}), gsd {:.4}x{:.4} cm/px",
        projection.utm_easting,
        projection.utm_northing,
        projection.utm_zone,
        projection.ground_easting,
        projection.ground_northing,
        gsd.width,
        gsd.height
    );

    Ok(ProjectedImage {
        telemetry: telemetry.clone(),
        attitude,
        projection,
        gsd,
    })
}

/// Verifies that all images share the zone of the first one.
fn check_zones(images: &[ProjectedImage]) -> Result<UtmZone, PoseInitError> {
    let expected = images
        .first()
        .map(|image| image.projection.utm_zone)
        .ok_or(PoseInitError::EmptyDataset)?;

    match images
        .iter()
        .find(|image| image.projection.utm_zone != expected)
    {
        Some(image) => Err(PoseInitError::ZoneMismatch {
            image_id: image.telemetry.image_id.clone(),
            expected,
            found: image.projection.utm_zone,
        }),
        None => Ok(expected),
    }
}

fn check_unique_ids(telemetry: &[Telemetry]) -> Result<(), PoseInitError> {
    let mut seen = HashSet::with_capacity(telemetry.len());
    for record in telemetry {
        if !seen.insert(record.image_id.as_str()) {
            return Err(PoseInitError::DuplicateImageId {
                image_id: record.image_id.clone(),
            });
        }
    }
    Ok(())
}

/// Entry state: camera, image resolution and configuration of a dataset.
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    camera: CameraModel,
    resolution: Resolution,
    config: DatasetConfig,
}

impl DatasetBuilder {
    /// Creates a builder for images taken by the registered camera `camera_model_id`.
    ///
    /// # Errors
    ///
    /// * [`PoseInitError::UnknownCameraModel`] if the camera is not registered.
    /// * [`PoseInitError::InvalidTelemetry`] scoped to [`DATASET_SCOPE`] if a sensor
    ///   dimension, the focal length or a pixel dimension is not positive.
    pub fn new(camera_model_id: &str, resolution: Resolution) -> Result<Self, PoseInitError> {
        Self::with_camera(camera::lookup(camera_model_id)?, resolution)
    }

    /// Creates a builder from an explicit camera description.
    pub fn with_camera(camera: CameraModel, resolution: Resolution) -> Result<Self, PoseInitError> {
        camera.validate_params()?;
        resolution.validate()?;
        Ok(DatasetBuilder {
            camera,
            resolution,
            config: DatasetConfig::default(),
        })
    }

    pub fn with_config(mut self, config: DatasetConfig) -> Self {
        self.config = config;
        self
    }

    /// Phase 1: projects every image to the ground and fixes the mosaic origin.
    ///
    /// The origin is taken from the configuration when given, otherwise it is the
    /// midpoint of the bounding box of all ground points.
    pub fn project(self, telemetry: &[Telemetry]) -> Result<ProjectedDataset, PoseInitError> {
        if telemetry.is_empty() {
            return Err(PoseInitError::EmptyDataset);
        }
        check_unique_ids(telemetry)?;
        let configured_origin = self.config.origin()?;

        info!(
            "Projecting {} images ({:?}, {}x{} px)",
            telemetry.len(),
            self.camera,
            self.resolution.width,
            self.resolution.height
        );

        let camera = self.camera;
        let resolution = self.resolution;
        let images = telemetry
            .par_iter()
            .map(|record| project_image(record, &camera, &resolution))
            .collect::<Result<Vec<_>, _>>()?;

        let zone = check_zones(&images)?;

        let origin = match configured_origin {
            Some(origin) => origin,
            None => {
                let projections: Vec<GroundProjection> =
                    images.iter().map(|image| image.projection).collect();
                MosaicOrigin::from_bounds(&projections).ok_or(PoseInitError::EmptyDataset)?
            }
        };
        info!(
            "Mosaic origin: ({:.3}, {:.3}) in zone {zone}",
            origin.easting, origin.northing
        );

        Ok(ProjectedDataset {
            camera,
            resolution,
            zone,
            origin,
            images,
        })
    }

    /// Runs both phases.
    pub fn build(self, telemetry: &[Telemetry]) -> Result<PoseDataset, PoseInitError> {
        Ok(self.project(telemetry)?.place())
    }
}

/// Phase-1 state: ground projections and mosaic origin are known.
#[derive(Debug, Clone)]
pub struct ProjectedDataset {
    camera: CameraModel,
    resolution: Resolution,
    zone: UtmZone,
    origin: MosaicOrigin,
    images: Vec<ProjectedImage>,
}

impl ProjectedDataset {
    pub fn origin(&self) -> MosaicOrigin {
        self.origin
    }

    pub fn zone(&self) -> UtmZone {
        self.zone
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Ground projections, in input order.
    pub fn projections(&self) -> impl Iterator<Item = (&str, &GroundProjection)> {
        self.images
            .iter()
            .map(|image| (image.telemetry.image_id.as_str(), &image.projection))
    }

    /// Phase 2: places every image relative to the fixed origin.
    pub fn place(self) -> PoseDataset {
        let ProjectedDataset {
            camera,
            resolution,
            zone,
            origin,
            images,
        } = self;

        let poses: Vec<ImagePose> = images
            .into_par_iter()
            .map(|image| {
                let placement = placement::place(
                    &image.projection,
                    &image.gsd,
                    &origin,
                    &resolution,
                    &image.attitude.image_frame,
                );
                ImagePose {
                    image_id: image.telemetry.image_id,
                    ground_projection: image.projection,
                    attitude: image.attitude.attitude,
                    placement,
                }
            })
            .collect();

        info!("Placed {} images", poses.len());

        PoseDataset {
            camera,
            resolution,
            zone,
            origin,
            poses,
        }
    }
}

/// Final per-image record handed to the stitcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePose {
    pub image_id: String,
    pub ground_projection: GroundProjection,
    /// Pure flight-times-gimbal attitude, without the image-frame reflection.
    pub attitude: Rotation3<f64>,
    pub placement: MosaicPlacement,
}

impl ImagePose {
    pub fn affine_transform(&self) -> &Matrix3<f64> {
        &self.placement.affine_transform
    }

    pub fn rotation_transform(&self) -> &Matrix4<f64> {
        &self.placement.rotation_transform
    }

    pub fn gsd(&self) -> GroundSampleDistance {
        GroundSampleDistance {
            width: self.placement.gsd_width,
            height: self.placement.gsd_height,
        }
    }
}

/// Ready state: all images placed. Immutable.
#[derive(Debug, Clone, Serialize)]
pub struct PoseDataset {
    camera: CameraModel,
    resolution: Resolution,
    zone: UtmZone,
    origin: MosaicOrigin,
    poses: Vec<ImagePose>,
}

impl PoseDataset {
    /// Image poses, in the order of the input telemetry.
    pub fn poses(&self) -> &[ImagePose] {
        &self.poses
    }

    pub fn get(&self, image_id: &str) -> Option<&ImagePose> {
        self.poses.iter().find(|pose| pose.image_id == image_id)
    }

    pub fn origin(&self) -> MosaicOrigin {
        self.origin
    }

    pub fn zone(&self) -> UtmZone {
        self.zone
    }

    pub fn camera(&self) -> &CameraModel {
        &self.camera
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn into_poses(self) -> Vec<ImagePose> {
        self.poses
    }
}
