//! Ground sample distance.
//!
//! The ground sample distance (GSD) is the real-world length covered by one image
//! pixel. It is expressed in centimetres per pixel and computed independently for
//! the image width and height from the altitude, sensor size, focal length and
//! pixel dimensions of the image.

use crate::camera::{validation, CameraError, CameraModel, Resolution};
use serde::{Deserialize, Serialize};

/// Centimetres per metre.
const CM_PER_M: f64 = 100.0;

/// Computes the ground sample distance along one image axis, in cm/px.
///
/// `gsd = (altitude_cm * sensor_dim_mm) / (focal_length_mm * image_dim_px)`
///
/// # Errors
///
/// Returns [`CameraError::InvalidParams`] unless every input is finite and
/// strictly positive.
///
/// # Examples
///
/// ```rust
/// use drone_pose_init::gsd::compute_gsd;
///
/// let gsd = compute_gsd(10.0, 0.63, 0.449, 4000).unwrap();
/// assert!((gsd - 0.350_780).abs() < 1e-6);
/// ```
pub fn compute_gsd(
    altitude_m: f64,
    sensor_dim_mm: f64,
    focal_length_mm: f64,
    image_dim_px: u32,
) -> Result<f64, CameraError> {
    validation::validate_positive("altitude_m", altitude_m)?;
    validation::validate_positive("sensor_dim_mm", sensor_dim_mm)?;
    validation::validate_positive("focal_length_mm", focal_length_mm)?;
    if image_dim_px == 0 {
        return Err(CameraError::InvalidParams(
            "image_dim_px must be positive".to_string(),
        ));
    }

    let altitude_cm = altitude_m * CM_PER_M;
    Ok((altitude_cm * sensor_dim_mm) / (focal_length_mm * image_dim_px as f64))
}

/// Per-axis ground sample distance of an image, in cm/px.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundSampleDistance {
    pub width: f64,
    pub height: f64,
}

impl GroundSampleDistance {
    /// Ground sample distance of an image taken by `camera` at `altitude_m`.
    pub fn from_camera(
        altitude_m: f64,
        camera: &CameraModel,
        resolution: &Resolution,
    ) -> Result<Self, CameraError> {
        Ok(GroundSampleDistance {
            width: compute_gsd(
                altitude_m,
                camera.sensor_width_mm,
                camera.focal_length_mm,
                resolution.width,
            )?,
            height: compute_gsd(
                altitude_m,
                camera.sensor_height_mm,
                camera.focal_length_mm,
                resolution.height,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::lookup;
    use approx::assert_relative_eq;

    #[test]
    fn test_mavic_mini_at_ten_metres() {
        let camera = lookup("FC7203").unwrap();
        let resolution = Resolution {
            width: 4000,
            height: 3000,
        };
        let gsd = GroundSampleDistance::from_camera(10.0, &camera, &resolution).unwrap();
        assert_relative_eq!(gsd.width, (1000.0 * 0.63) / (0.449 * 4000.0), epsilon = 1e-12);
        assert_relative_eq!(gsd.height, (1000.0 * 0.47) / (0.449 * 3000.0), epsilon = 1e-12);
        assert_relative_eq!(gsd.width, 0.3507, epsilon = 1e-4);
        assert_relative_eq!(gsd.height, 0.3490, epsilon = 1e-4);
    }

    #[test]
    fn test_linear_in_altitude() {
        let low = compute_gsd(25.0, 1.32, 0.88, 5472).unwrap();
        let high = compute_gsd(50.0, 1.32, 0.88, 5472).unwrap();
        assert_relative_eq!(high, 2.0 * low, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_in_focal_length() {
        let long = compute_gsd(30.0, 0.63, 0.449, 4000).unwrap();
        let short = compute_gsd(30.0, 0.63, 0.449 / 2.0, 4000).unwrap();
        assert_relative_eq!(short, 2.0 * long, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        assert!(compute_gsd(0.0, 0.63, 0.449, 4000).is_err());
        assert!(compute_gsd(-5.0, 0.63, 0.449, 4000).is_err());
        assert!(compute_gsd(10.0, 0.0, 0.449, 4000).is_err());
        assert!(compute_gsd(10.0, 0.63, 0.0, 4000).is_err());
        assert!(compute_gsd(10.0, 0.63, 0.449, 0).is_err());
        assert!(compute_gsd(f64::NAN, 0.63, 0.449, 4000).is_err());
    }
}
