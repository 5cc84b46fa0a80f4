//! Drone Pose Initialization
//!
//! Estimates the initial pose of each image in a drone survey from its telemetry,
//! ahead of feature-based stitching. For every image the library:
//! - projects the GPS position into WGS84 UTM
//! - composes the flight and gimbal attitudes into a camera rotation
//! - casts the optical axis onto the ground plane
//! - derives the ground sample distance from the camera model
//! - places the image on a shared mosaic canvas as a 3x3 affine transform
//!
//! The entry point is [`dataset::DatasetBuilder`]; results are collected in an
//! immutable [`dataset::PoseDataset`].

pub mod attitude;
pub mod camera;
pub mod dataset;
pub mod geodesy;
pub mod ground;
pub mod gsd;
pub mod placement;
pub mod util;

// Re-export commonly used types
pub use attitude::Attitude;
pub use camera::{CameraError, CameraModel, Resolution};
pub use dataset::{
    DatasetBuilder, DatasetConfig, DatasetFile, ImagePose, PoseDataset, PoseInitError,
    ProjectedDataset, Telemetry,
};
pub use geodesy::{UtmCoordinate, UtmZone};
pub use ground::GroundProjection;
pub use gsd::GroundSampleDistance;
pub use placement::{MosaicOrigin, MosaicPlacement};
