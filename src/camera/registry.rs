//! Static table of known drone cameras.
//!
//! New cameras are supported by adding an entry to [`CAMERA_TABLE`]; there is no
//! runtime discovery.

use super::{CameraError, CameraModel};

/// Known cameras, keyed by the model string found in the image metadata.
const CAMERA_TABLE: &[(&str, CameraModel)] = &[
    // DJI Mavic Mini
    (
        "FC7203",
        CameraModel {
            sensor_width_mm: 0.63,
            sensor_height_mm: 0.47,
            focal_length_mm: 0.449,
        },
    ),
    // DJI Phantom 4
    (
        "FC330",
        CameraModel {
            sensor_width_mm: 1.32,
            sensor_height_mm: 0.88,
            focal_length_mm: 0.88,
        },
    ),
];

/// Resolves a camera model identifier to its physical description.
///
/// # Errors
///
/// Returns [`CameraError::UnknownCameraModel`] if `model_id` is not registered.
/// There is no fallback camera.
///
/// # Examples
///
/// ```rust
/// use drone_pose_init::camera::lookup;
///
/// let camera = lookup("FC7203").unwrap();
/// assert_eq!(camera.focal_length_mm, 0.449);
/// assert!(lookup("UNKNOWN").is_err());
/// ```
pub fn lookup(model_id: &str) -> Result<CameraModel, CameraError> {
    CAMERA_TABLE
        .iter()
        .find(|(id, _)| *id == model_id)
        .map(|(_, camera)| *camera)
        .ok_or_else(|| CameraError::UnknownCameraModel(model_id.to_string()))
}

/// Lists the identifiers of every registered camera.
pub fn registered_models() -> Vec<&'static str> {
    CAMERA_TABLE.iter().map(|(id, _)| *id).collect()
}
