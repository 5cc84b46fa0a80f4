//! Geodetic to planar projection.
//!
//! Converts WGS84 latitude/longitude into Universal Transverse Mercator (UTM)
//! easting/northing, together with the zone the coordinate belongs to. The
//! projection uses the usual series expansion of the transverse Mercator
//! formulas, which is accurate to well below a millimetre within a zone.
//!
//! Zone numbering follows the standard grid, including the Norway (32V) and
//! Svalbard (31X-37X) exceptions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scale factor on the central meridian.
const K0: f64 = 0.9996;
/// WGS84 semi-major axis, in metres.
const EQUATORIAL_RADIUS: f64 = 6_378_137.0;
/// WGS84 first eccentricity squared.
const E: f64 = 0.006_694_38;
const E2: f64 = E * E;
const E3: f64 = E2 * E;
/// Second eccentricity squared.
const E_P2: f64 = E / (1.0 - E);

const M1: f64 = 1.0 - E / 4.0 - 3.0 * E2 / 64.0 - 5.0 * E3 / 256.0;
const M2: f64 = 3.0 * E / 8.0 + 3.0 * E2 / 32.0 + 45.0 * E3 / 1024.0;
const M3: f64 = 15.0 * E2 / 256.0 + 45.0 * E3 / 1024.0;
const M4: f64 = 35.0 * E3 / 3072.0;

const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Latitude bands, 8 degrees each from 80S. Band X spans 12 degrees.
const ZONE_LETTERS: &[u8] = b"CDEFGHJKLMNPQRSTUVWXX";

/// Errors raised by the geodetic projection.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeodesyError {
    #[error("Latitude {0} is outside the UTM range [-80, 84]")]
    LatitudeOutOfRange(f64),
    #[error("Longitude {0} is outside the range [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A UTM grid zone: longitudinal zone number plus latitude band letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtmZone {
    pub number: u8,
    pub letter: char,
}

impl fmt::Display for UtmZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, self.letter)
    }
}

/// A projected planar coordinate, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtmCoordinate {
    pub easting: f64,
    pub northing: f64,
    pub zone: UtmZone,
}

/// Projects a WGS84 latitude/longitude (degrees) to UTM.
///
/// # Errors
///
/// Returns [`GeodesyError`] if the latitude is outside the UTM band
/// `[-80, 84]` or the longitude is outside `[-180, 180]` (non-finite values
/// are rejected the same way).
///
/// # Examples
///
/// ```rust
/// use drone_pose_init::geodesy::project;
///
/// let coord = project(0.0, 3.0).unwrap();
/// assert_eq!(coord.zone.number, 31);
/// assert!((coord.easting - 500_000.0).abs() < 1e-6);
/// assert!(coord.northing.abs() < 1e-6);
/// ```
pub fn project(latitude: f64, longitude: f64) -> Result<UtmCoordinate, GeodesyError> {
    if !(-80.0..=84.0).contains(&latitude) {
        return Err(GeodesyError::LatitudeOutOfRange(latitude));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(GeodesyError::LongitudeOutOfRange(longitude));
    }

    let zone = UtmZone {
        number: zone_number(latitude, longitude),
        letter: zone_letter(latitude)?,
    };

    let lat_rad = latitude.to_radians();
    let lat_sin = lat_rad.sin();
    let lat_cos = lat_rad.cos();
    let lat_tan = lat_sin / lat_cos;
    let lat_tan2 = lat_tan * lat_tan;
    let lat_tan4 = lat_tan2 * lat_tan2;

    let lon_rad = longitude.to_radians();
    let central_lon_rad = central_longitude(zone.number).to_radians();

    let n = EQUATORIAL_RADIUS / (1.0 - E * lat_sin * lat_sin).sqrt();
    let c = E_P2 * lat_cos * lat_cos;

    let a = lat_cos * wrap_angle(lon_rad - central_lon_rad);
    let a2 = a * a;
    let a3 = a2 * a;
    let a4 = a3 * a;
    let a5 = a4 * a;
    let a6 = a5 * a;

    // Meridional arc length from the equator.
    let m = EQUATORIAL_RADIUS
        * (M1 * lat_rad - M2 * (2.0 * lat_rad).sin() + M3 * (4.0 * lat_rad).sin()
            - M4 * (6.0 * lat_rad).sin());

    let easting = K0
        * n
        * (a + a3 / 6.0 * (1.0 - lat_tan2 + c)
            + a5 / 120.0 * (5.0 - 18.0 * lat_tan2 + lat_tan4 + 72.0 * c - 58.0 * E_P2))
        + FALSE_EASTING;

    let mut northing = K0
        * (m + n
            * lat_tan
            * (a2 / 2.0
                + a4 / 24.0 * (5.0 - lat_tan2 + 9.0 * c + 4.0 * c * c)
                + a6 / 720.0 * (61.0 - 58.0 * lat_tan2 + lat_tan4 + 600.0 * c - 330.0 * E_P2)));
    if latitude < 0.0 {
        northing += FALSE_NORTHING_SOUTH;
    }

    Ok(UtmCoordinate {
        easting,
        northing,
        zone,
    })
}

/// Returns the UTM zone number of a coordinate, honouring the grid exceptions.
pub fn zone_number(latitude: f64, longitude: f64) -> u8 {
    if (56.0..64.0).contains(&latitude) && (3.0..12.0).contains(&longitude) {
        return 32;
    }

    if (72.0..=84.0).contains(&latitude) && longitude >= 0.0 {
        if longitude < 9.0 {
            return 31;
        } else if longitude < 21.0 {
            return 33;
        } else if longitude < 33.0 {
            return 35;
        } else if longitude < 42.0 {
            return 37;
        }
    }

    if longitude >= 180.0 {
        return 60;
    }
    (((longitude + 180.0) / 6.0).floor() as u8) + 1
}

/// Returns the latitude band letter of a coordinate.
pub fn zone_letter(latitude: f64) -> Result<char, GeodesyError> {
    if !(-80.0..=84.0).contains(&latitude) {
        return Err(GeodesyError::LatitudeOutOfRange(latitude));
    }
    let index = ((latitude + 80.0) / 8.0).floor() as usize;
    Ok(ZONE_LETTERS[index.min(ZONE_LETTERS.len() - 1)] as char)
}

/// Longitude of the central meridian of a zone, in degrees.
pub fn central_longitude(zone_number: u8) -> f64 {
    (zone_number as f64 - 1.0) * 6.0 - 180.0 + 3.0
}

/// Wraps an angle in radians into `[-pi, pi)`.
fn wrap_angle(value: f64) -> f64 {
    use std::f64::consts::PI;
    (value + PI).rem_euclid(2.0 * PI) - PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_central_meridian_on_equator() {
        let coord = project(0.0, 3.0).unwrap();
        assert_eq!(coord.zone, UtmZone { number: 31, letter: 'N' });
        assert_relative_eq!(coord.easting, 500_000.0, epsilon = 1e-6);
        assert_relative_eq!(coord.northing, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_known_reference_points() {
        // Reference values from published UTM conversions.
        let coord = project(50.77535, 6.08389).unwrap();
        assert_eq!(coord.zone, UtmZone { number: 32, letter: 'U' });
        assert_relative_eq!(coord.easting, 294_409.0, epsilon = 1.0);
        assert_relative_eq!(coord.northing, 5_628_898.0, epsilon = 1.0);

        let coord = project(40.714_35, -74.005_97).unwrap();
        assert_eq!(coord.zone, UtmZone { number: 18, letter: 'T' });
        assert_relative_eq!(coord.easting, 583_960.0, epsilon = 1.0);
        assert_relative_eq!(coord.northing, 4_507_523.0, epsilon = 1.0);

        let coord = project(-41.286_46, 174.776_24).unwrap();
        assert_eq!(coord.zone, UtmZone { number: 60, letter: 'G' });
        assert_relative_eq!(coord.easting, 313_784.0, epsilon = 1.0);
        assert_relative_eq!(coord.northing, 5_427_057.0, epsilon = 1.0);
    }

    #[test]
    fn test_one_degree_of_latitude_on_meridian() {
        let south = project(45.0, 3.0).unwrap();
        let north = project(46.0, 3.0).unwrap();
        let distance = north.northing - south.northing;
        // ~111.1 km per degree at mid latitudes, scaled by k0.
        assert!((distance - 111_141.0 * K0).abs() < 100.0, "got {distance}");
        assert_relative_eq!(south.easting, FALSE_EASTING, epsilon = 1e-6);
    }

    #[test]
    fn test_southern_hemisphere_false_northing() {
        let coord = project(-0.000_01, 3.0).unwrap();
        assert!(coord.northing > 9_999_990.0 && coord.northing < FALSE_NORTHING_SOUTH);
        assert_eq!(coord.zone.letter, 'M');
    }

    #[test]
    fn test_zone_exceptions() {
        assert_eq!(zone_number(60.0, 5.0), 32);
        assert_eq!(zone_number(60.0, 2.0), 31);
        assert_eq!(zone_number(78.0, 8.0), 31);
        assert_eq!(zone_number(78.0, 10.0), 33);
        assert_eq!(zone_number(78.0, 25.0), 35);
        assert_eq!(zone_number(78.0, 40.0), 37);
        assert_eq!(zone_number(0.0, -180.0), 1);
        assert_eq!(zone_number(0.0, 180.0), 60);
        assert_eq!(zone_number(0.0, 179.9), 60);
    }

    #[test]
    fn test_zone_letters() {
        assert_eq!(zone_letter(-80.0).unwrap(), 'C');
        assert_eq!(zone_letter(0.0).unwrap(), 'N');
        assert_eq!(zone_letter(45.0).unwrap(), 'T');
        assert_eq!(zone_letter(84.0).unwrap(), 'X');
        assert!(zone_letter(85.0).is_err());
    }

    #[test]
    fn test_out_of_range_inputs() {
        assert_eq!(project(85.0, 0.0), Err(GeodesyError::LatitudeOutOfRange(85.0)));
        assert_eq!(
            project(0.0, 181.0),
            Err(GeodesyError::LongitudeOutOfRange(181.0))
        );
        assert!(project(f64::NAN, 0.0).is_err());
        assert!(project(0.0, f64::NAN).is_err());
    }
}
