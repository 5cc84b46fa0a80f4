//! End-to-end tests of dataset pose initialization

use approx::assert_relative_eq;
use drone_pose_init::placement::CANVAS_OFFSET_PX;
use drone_pose_init::{DatasetBuilder, PoseDataset, PoseInitError, Resolution, Telemetry};
use nalgebra::{Point2, Point3};

const RESOLUTION: Resolution = Resolution {
    width: 4000,
    height: 3000,
};

// Half of a 5 m easting separation at 45N, straddling the zone 31 central meridian.
const HALF_SPACING_DEG: f64 = 3.172e-5;

fn nadir(image_id: &str, latitude: f64, longitude: f64) -> Telemetry {
    Telemetry {
        image_id: image_id.to_string(),
        latitude,
        longitude,
        relative_altitude_m: 10.0,
        flight_yaw_deg: 0.0,
        flight_pitch_deg: 0.0,
        flight_roll_deg: 0.0,
        gimbal_yaw_deg: 0.0,
        gimbal_pitch_deg: -90.0,
        gimbal_roll_deg: 0.0,
    }
}

fn build(telemetry: &[Telemetry]) -> Result<PoseDataset, PoseInitError> {
    DatasetBuilder::new("FC7203", RESOLUTION)?.build(telemetry)
}

fn survey_block() -> Vec<Telemetry> {
    let mut telemetry = Vec::new();
    for row in 0..3 {
        for col in 0..4 {
            let mut t = nadir(
                &format!("DJI_{:04}.JPG", row * 4 + col),
                45.0 + row as f64 * 4.0e-5,
                3.0 + (col as f64 - 1.5) * 2.0 * HALF_SPACING_DEG,
            );
            t.flight_yaw_deg = if row % 2 == 0 { 90.0 } else { -90.0 };
            t.flight_pitch_deg = 1.5 - col as f64;
            t.flight_roll_deg = 0.5 * row as f64;
            t.gimbal_pitch_deg = -88.0;
            telemetry.push(t);
        }
    }
    telemetry
}

#[test]
fn test_two_images_five_metres_apart() {
    let telemetry = vec![
        nadir("west", 45.0, 3.0 - HALF_SPACING_DEG),
        nadir("east", 45.0, 3.0 + HALF_SPACING_DEG),
    ];
    let dataset = build(&telemetry).unwrap();
    let west = dataset.get("west").unwrap();
    let east = dataset.get("east").unwrap();

    // 0.63 mm * 10 m * 100 / (0.449 mm * 4000 px)
    assert_relative_eq!(west.placement.gsd_width, 0.350780, epsilon = 1e-6);
    assert_relative_eq!(west.placement.gsd_height, 0.348924, epsilon = 1e-6);

    let delta_easting =
        east.ground_projection.ground_easting - west.ground_projection.ground_easting;
    let delta_x = east.placement.pixel_x - west.placement.pixel_x;
    assert_relative_eq!(delta_x, delta_easting * 100.0 / west.placement.gsd_width, epsilon = 1e-6);
    assert_relative_eq!(delta_x, 1425.4, epsilon = 1.0);
    assert_relative_eq!(east.placement.pixel_y, west.placement.pixel_y, epsilon = 1e-6);

    // The origin sits halfway between the two images.
    assert_relative_eq!(west.placement.pixel_x, -east.placement.pixel_x, epsilon = 1e-6);
}

#[test]
fn test_nadir_images_have_no_ground_offset() {
    let telemetry: Vec<Telemetry> = survey_block()
        .into_iter()
        .map(|mut t| {
            t.flight_pitch_deg = 0.0;
            t.flight_roll_deg = 0.0;
            t.gimbal_pitch_deg = -90.0;
            t
        })
        .collect();
    let dataset = build(&telemetry).unwrap();

    for pose in dataset.poses() {
        let projection = &pose.ground_projection;
        assert_relative_eq!(projection.ground_easting, projection.utm_easting, epsilon = 1e-9);
        assert_relative_eq!(projection.ground_northing, projection.utm_northing, epsilon = 1e-9);
    }
}

#[test]
fn test_tilted_camera_offsets_ground_point() {
    let mut tilted = nadir("tilted", 45.0, 3.0);
    tilted.gimbal_pitch_deg = -60.0;
    let dataset = build(&[tilted]).unwrap();
    let projection = &dataset.poses()[0].ground_projection;

    let offset = ((projection.ground_easting - projection.utm_easting).powi(2)
        + (projection.ground_northing - projection.utm_northing).powi(2))
    .sqrt();
    // 30 degrees off nadir at 10 m
    assert_relative_eq!(offset, 10.0 * 30.0_f64.to_radians().tan(), epsilon = 1e-6);
}

#[test]
fn test_output_follows_input_order() {
    let telemetry = survey_block();
    let dataset = build(&telemetry).unwrap();
    let ids: Vec<&str> = dataset.poses().iter().map(|p| p.image_id.as_str()).collect();
    let expected: Vec<&str> = telemetry.iter().map(|t| t.image_id.as_str()).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_results_do_not_depend_on_input_order() {
    let telemetry = survey_block();
    let mut shuffled = telemetry.clone();
    shuffled.reverse();
    shuffled.swap(1, 7);
    shuffled.swap(3, 10);

    let reference = build(&telemetry).unwrap();
    let permuted = build(&shuffled).unwrap();
    assert_eq!(reference.origin(), permuted.origin());

    for pose in reference.poses() {
        let other = permuted.get(&pose.image_id).unwrap();
        assert_eq!(pose.placement.affine_transform, other.placement.affine_transform);
        assert_eq!(pose.placement.rotation_transform, other.placement.rotation_transform);
    }
}

#[test]
fn test_translation_invariance() {
    let telemetry = survey_block();
    let shifted: Vec<Telemetry> = telemetry
        .iter()
        .cloned()
        .map(|mut t| {
            t.latitude += 0.002;
            t.longitude += 0.002;
            t
        })
        .collect();

    let reference = build(&telemetry).unwrap();
    let moved = build(&shifted).unwrap();

    for (a, b) in reference.poses().iter().zip(moved.poses()) {
        assert_eq!(a.image_id, b.image_id);
        assert_relative_eq!(a.placement.pixel_x, b.placement.pixel_x, epsilon = 0.1);
        assert_relative_eq!(a.placement.pixel_y, b.placement.pixel_y, epsilon = 0.1);
    }
}

#[test]
fn test_affine_maps_image_center_to_pixel_position() {
    let dataset = build(&survey_block()).unwrap();
    let (cx, cy) = RESOLUTION.center();

    for pose in dataset.poses() {
        let mapped = pose.placement.apply_affine(&Point2::new(cx, cy));
        assert_relative_eq!(mapped.x, CANVAS_OFFSET_PX + pose.placement.pixel_x, epsilon = 1e-6);
        assert_relative_eq!(mapped.y, CANVAS_OFFSET_PX + pose.placement.pixel_y, epsilon = 1e-6);
    }
}

#[test]
fn test_rotation_transform_round_trip() {
    let dataset = build(&survey_block()).unwrap();
    let corners = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(4000.0, 0.0, 0.0),
        Point3::new(4000.0, 3000.0, 0.0),
        Point3::new(0.0, 3000.0, 0.0),
        Point3::new(1234.5, 987.6, 0.0),
    ];

    for pose in dataset.poses() {
        for corner in &corners {
            let rotated = pose.placement.apply_rotation(corner);
            let restored = pose.placement.apply_inverse_rotation(&rotated);
            assert_relative_eq!(restored, *corner, epsilon = 1e-4);
        }
        let product = pose.placement.rotation_transform * pose.placement.inverse_rotation_transform();
        assert_relative_eq!(product, nalgebra::Matrix4::identity(), epsilon = 1e-9);
    }
}

#[test]
fn test_horizontal_camera_is_degenerate() {
    let mut horizon = nadir("horizon", 45.0, 3.0);
    horizon.gimbal_pitch_deg = 0.0;
    let telemetry = vec![nadir("nadir", 45.0, 3.0), horizon];

    match build(&telemetry) {
        Err(PoseInitError::DegenerateGeometry { image_id, n_dot_d }) => {
            assert_eq!(image_id, "horizon");
            assert!(n_dot_d.abs() < 1e-6);
        }
        other => panic!("expected degenerate geometry, got {other:?}"),
    }
}

#[test]
fn test_error_paths() {
    assert_eq!(build(&[]).unwrap_err(), PoseInitError::EmptyDataset);

    assert!(matches!(
        DatasetBuilder::new("FC9999", RESOLUTION),
        Err(PoseInitError::UnknownCameraModel { .. })
    ));

    let mut negative = nadir("negative", 45.0, 3.0);
    negative.relative_altitude_m = -5.0;
    assert!(matches!(
        build(&[negative]),
        Err(PoseInitError::InvalidTelemetry { .. })
    ));

    let across_zones = vec![nadir("a", 45.0, 5.9999), nadir("b", 45.0, 6.0001)];
    assert!(matches!(
        build(&across_zones),
        Err(PoseInitError::ZoneMismatch { .. })
    ));
}
