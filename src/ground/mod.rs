//! Ground plane intersection of the camera optical axis.
//!
//! The ground is modelled as the flat plane `z = 0`, with the aircraft at height
//! `altitude` above its own nadir point. The optical axis `(0, 0, altitude)` is
//! rotated into the world frame and intersected with the plane, giving the
//! horizontal offset between the aircraft position and the point the camera is
//! actually looking at.

use crate::geodesy::{UtmCoordinate, UtmZone};
use nalgebra::{Matrix3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Below this value of `|n . d|` the ray is treated as parallel to the ground.
pub const RAY_PARALLEL_EPSILON: f64 = 1e-6;

/// Planar position of one image: where the aircraft was and where the camera looked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundProjection {
    /// Aircraft position projected to UTM, in metres.
    pub utm_easting: f64,
    pub utm_northing: f64,
    pub utm_zone: UtmZone,
    /// Point where the optical axis meets the ground plane, in metres.
    pub ground_easting: f64,
    pub ground_northing: f64,
}

impl GroundProjection {
    /// Combines the aircraft UTM position with the ground offset of its optical axis.
    pub fn new(aircraft: &UtmCoordinate, offset: &Vector2<f64>) -> Self {
        GroundProjection {
            utm_easting: aircraft.easting,
            utm_northing: aircraft.northing,
            utm_zone: aircraft.zone,
            ground_easting: aircraft.easting + offset.x,
            ground_northing: aircraft.northing + offset.y,
        }
    }

    pub fn ground_position(&self) -> Vector2<f64> {
        Vector2::new(self.ground_easting, self.ground_northing)
    }
}

/// Errors raised while casting rays onto the ground.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The ray is (nearly) parallel to the ground plane.
    #[error("Ray is parallel to the ground plane (n.d = {n_dot_d:e})")]
    DegenerateGeometry { n_dot_d: f64 },
    #[error("Invalid geometry parameters: {0}")]
    InvalidParams(String),
}

/// Intersects the line through `ray_point` with direction `ray_direction` and a plane.
///
/// Returns the intersection point. The full line is intersected, so the sign of
/// `ray_direction` does not matter.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateGeometry`] if `|n . d| < epsilon`.
pub fn line_plane_intersection(
    plane_normal: &Vector3<f64>,
    plane_point: &Vector3<f64>,
    ray_direction: &Vector3<f64>,
    ray_point: &Vector3<f64>,
    epsilon: f64,
) -> Result<Vector3<f64>, GeometryError> {
    let n_dot_d = plane_normal.dot(ray_direction);
    if !(n_dot_d.abs() >= epsilon) {
        return Err(GeometryError::DegenerateGeometry { n_dot_d });
    }

    let w = ray_point - plane_point;
    let si = -plane_normal.dot(&w) / n_dot_d;
    Ok(w + ray_direction * si + plane_point)
}

/// Horizontal offset from the aircraft nadir to where the optical axis meets the ground.
///
/// `rotation` is the image-frame camera rotation (see [`crate::attitude`]).
///
/// # Errors
///
/// * [`GeometryError::InvalidParams`] if the altitude is not finite and positive.
/// * [`GeometryError::DegenerateGeometry`] if the camera looks at the horizon.
pub fn ground_offset(
    rotation: &Matrix3<f64>,
    altitude: f64,
) -> Result<Vector2<f64>, GeometryError> {
    if !altitude.is_finite() || altitude <= 0.0 {
        return Err(GeometryError::InvalidParams(format!(
            "altitude must be finite and positive, got {altitude}"
        )));
    }

    let direction = rotation * Vector3::new(0.0, 0.0, altitude);
    // Normalise the direction so the epsilon test does not depend on altitude.
    let unit_direction = direction / altitude;

    let hit = line_plane_intersection(
        &Vector3::z(),
        &Vector3::zeros(),
        &unit_direction,
        &Vector3::new(0.0, 0.0, altitude),
        RAY_PARALLEL_EPSILON,
    )?;

    Ok(hit.xy())
}

/// Ground projection of the optical axis for an aircraft at `aircraft_position`.
///
/// Returns the planar ground point, i.e. the aircraft position plus
/// [`ground_offset`].
pub fn intersect(
    aircraft_position: &Vector2<f64>,
    rotation: &Matrix3<f64>,
    altitude: f64,
) -> Result<Vector2<f64>, GeometryError> {
    Ok(aircraft_position + ground_offset(rotation, altitude)?)
}
