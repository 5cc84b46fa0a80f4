//! Composition of aircraft and gimbal attitude into a camera orientation.
//!
//! Angles are given in degrees using the intrinsic Z-Y-X (yaw, pitch, roll)
//! convention. The gimbal pitch reported by the drone is `-90` when the camera
//! looks straight down, so it is offset by `+90` before composition: a nadir
//! camera then has an identity gimbal rotation and its optical axis `(0, 0, h)`
//! stays vertical.
//!
//! Two compositions are exposed:
//!
//! - the pure attitude `flight * gimbal`, a proper rotation used for
//!   orientation bookkeeping;
//! - the image-frame matrix `reflection * flight * gimbal`, where the reflection
//!   flips the Y axis so that image rows (growing downwards) line up with world
//!   northing (growing upwards). This matrix is orthogonal with determinant -1
//!   and is the one used for ground ray casting and mosaic placement.

use nalgebra::{Matrix3, Rotation3};
use serde::{Deserialize, Serialize};

/// Offset added to the raw gimbal pitch, in degrees.
pub const GIMBAL_PITCH_OFFSET_DEG: f64 = 90.0;

/// Yaw, pitch and roll angles of a rigid body, in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Attitude {
    pub yaw_deg: f64,
    pub pitch_deg: f64,
    pub roll_deg: f64,
}

impl Attitude {
    pub fn new(yaw_deg: f64, pitch_deg: f64, roll_deg: f64) -> Self {
        Attitude {
            yaw_deg,
            pitch_deg,
            roll_deg,
        }
    }

    /// Returns `true` if every angle is a finite number.
    pub fn is_finite(&self) -> bool {
        self.yaw_deg.is_finite() && self.pitch_deg.is_finite() && self.roll_deg.is_finite()
    }

    /// Rotation `Rz(yaw) * Ry(pitch) * Rx(roll)`.
    pub fn to_rotation(&self) -> Rotation3<f64> {
        Rotation3::from_euler_angles(
            self.roll_deg.to_radians(),
            self.pitch_deg.to_radians(),
            self.yaw_deg.to_radians(),
        )
    }
}

/// Both compositions of a flight and gimbal attitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposedAttitude {
    /// Pure attitude rotation `flight * gimbal`.
    pub attitude: Rotation3<f64>,
    /// Attitude with the image-frame Y flip applied on the left.
    pub image_frame: Matrix3<f64>,
}

/// The Y-axis reflection reconciling pixel (Y down) and world (Y north) handedness.
pub fn reflection() -> Matrix3<f64> {
    Matrix3::from_diagonal(&nalgebra::Vector3::new(1.0, -1.0, 1.0))
}

/// Gimbal rotation with the nadir pitch offset applied.
fn gimbal_rotation(gimbal: &Attitude) -> Rotation3<f64> {
    Attitude {
        pitch_deg: gimbal.pitch_deg + GIMBAL_PITCH_OFFSET_DEG,
        ..*gimbal
    }
    .to_rotation()
}

/// Composes the pure attitude rotation `flight * gimbal` (no reflection).
pub fn compose_unreflected(flight: &Attitude, gimbal: &Attitude) -> Rotation3<f64> {
    flight.to_rotation() * gimbal_rotation(gimbal)
}

/// Composes `reflection * flight * gimbal`, the matrix used for placement.
pub fn compose_reflected(flight: &Attitude, gimbal: &Attitude) -> Matrix3<f64> {
    reflection() * compose_unreflected(flight, gimbal).into_inner()
}

/// Composes both the pure attitude and the image-frame matrix.
///
/// # Examples
///
/// ```rust
/// use drone_pose_init::attitude::{compose, Attitude};
/// use nalgebra::Matrix3;
///
/// let nadir = compose(&Attitude::default(), &Attitude::new(0.0, -90.0, 0.0));
/// assert!((nadir.attitude.into_inner() - Matrix3::identity()).norm() < 1e-12);
/// assert_eq!(nadir.image_frame[(1, 1)], -1.0);
/// ```
pub fn compose(flight: &Attitude, gimbal: &Attitude) -> ComposedAttitude {
    let attitude = compose_unreflected(flight, gimbal);
    ComposedAttitude {
        attitude,
        image_frame: reflection() * attitude.into_inner(),
    }
}
