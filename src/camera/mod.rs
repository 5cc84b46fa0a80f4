//! This module defines the physical camera description used for pose initialization.
//!
//! Unlike a calibrated projection model, a drone camera is only described here by
//! the physical size of its sensor and its focal length, which is all that is needed
//! to derive the ground sample distance of an image taken at a known altitude.
//!
//! The concrete cameras are kept in a static table in the `registry` submodule and
//! are looked up by the model string the drone writes into the image metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod registry;

pub use registry::{lookup, registered_models};

/// Physical description of a drone camera.
///
/// All dimensions are in millimetres and strictly positive.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraModel {
    /// Width of the image sensor, in millimetres.
    pub sensor_width_mm: f64,
    /// Height of the image sensor, in millimetres.
    pub sensor_height_mm: f64,
    /// Focal length of the lens, in millimetres.
    pub focal_length_mm: f64,
}

impl CameraModel {
    /// Creates a new [`CameraModel`] and validates its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::InvalidParams`] if any dimension is not a finite,
    /// strictly positive number.
    pub fn new(
        sensor_width_mm: f64,
        sensor_height_mm: f64,
        focal_length_mm: f64,
    ) -> Result<Self, CameraError> {
        let model = CameraModel {
            sensor_width_mm,
            sensor_height_mm,
            focal_length_mm,
        };
        model.validate_params()?;
        Ok(model)
    }

    /// Validates that every dimension is finite and strictly positive.
    pub fn validate_params(&self) -> Result<(), CameraError> {
        validation::validate_positive("sensor_width_mm", self.sensor_width_mm)?;
        validation::validate_positive("sensor_height_mm", self.sensor_height_mm)?;
        validation::validate_positive("focal_length_mm", self.focal_length_mm)?;
        Ok(())
    }

    /// Ratio between sensor width and height.
    pub fn aspect_ratio(&self) -> f64 {
        self.sensor_width_mm / self.sensor_height_mm
    }
}

impl fmt::Debug for CameraModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Camera [sensor: {}x{} mm, focal: {} mm]",
            self.sensor_width_mm, self.sensor_height_mm, self.focal_length_mm
        )
    }
}

/// Represents the resolution of the images of a dataset.
///
/// All images of one dataset share a single resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// The width of the image in pixels.
    pub width: u32,
    /// The height of the image in pixels.
    pub height: u32,
}

impl Resolution {
    /// Validates that both pixel dimensions are non-zero.
    pub fn validate(&self) -> Result<(), CameraError> {
        if self.width == 0 || self.height == 0 {
            return Err(CameraError::InvalidParams(format!(
                "Resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Pixel coordinates of the image center.
    pub fn center(&self) -> (f64, f64) {
        (self.width as f64 / 2.0, self.height as f64 / 2.0)
    }
}

/// Defines the errors that can occur while resolving or validating a camera.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    /// The model identifier is not present in the static registry.
    #[error("Unknown camera model: {0}")]
    UnknownCameraModel(String),
    /// One or more camera parameters are invalid.
    #[error("Invalid camera parameters: {0}")]
    InvalidParams(String),
}

/// Provides common validation functions for camera parameters.
pub mod validation {
    use super::CameraError;

    /// Checks that `value` is a finite, strictly positive number.
    pub fn validate_positive(name: &str, value: f64) -> Result<(), CameraError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(CameraError::InvalidParams(format!(
                "{name} must be finite and positive, got {value}"
            )));
        }
        Ok(())
    }
}
