//! Placement of images in the shared mosaic pixel frame.
//!
//! Every image is positioned relative to a single mosaic origin expressed in UTM
//! metres. The planar offset of the image's ground point from that origin is
//! converted to pixels using the image's ground sample distance, with north
//! pointing up (pixel rows grow southwards).
//!
//! The per-image 4x4 homogeneous transform is
//!
//! ```text
//! canvas_offset * [R | (pixel_x, pixel_y, 0)] * center_translation
//! ```
//!
//! applied to column vectors, and is reduced to a planar 3x3 affine by dropping
//! the z row and column. A rotation-only transform
//! `reverse_center * R * center` is kept for orientation normalisation.

use crate::camera::Resolution;
use crate::ground::GroundProjection;
use crate::gsd::GroundSampleDistance;
use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Canvas coordinate of the mosaic origin, in pixels.
pub const CANVAS_OFFSET_PX: f64 = 3000.0;

/// Centimetres per metre; planar deltas are metres while GSD is cm/px.
const CM_PER_M: f64 = 100.0;

/// Reference point of the mosaic, in UTM metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MosaicOrigin {
    pub easting: f64,
    pub northing: f64,
}

impl MosaicOrigin {
    /// Midpoint of the bounding box of the ground points of `projections`.
    ///
    /// The bounding box is a min/max fold, so the result does not depend on the
    /// order of `projections`. Returns `None` for an empty slice.
    pub fn from_bounds(projections: &[GroundProjection]) -> Option<Self> {
        let first = projections.first()?;
        let init = (
            first.ground_easting,
            first.ground_easting,
            first.ground_northing,
            first.ground_northing,
        );
        let (min_e, max_e, min_n, max_n) =
            projections
                .iter()
                .fold(init, |(min_e, max_e, min_n, max_n), p| {
                    (
                        min_e.min(p.ground_easting),
                        max_e.max(p.ground_easting),
                        min_n.min(p.ground_northing),
                        max_n.max(p.ground_northing),
                    )
                });

        Some(MosaicOrigin {
            easting: (min_e + max_e) / 2.0,
            northing: (min_n + max_n) / 2.0,
        })
    }
}

/// Position and transforms of one image in mosaic pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MosaicPlacement {
    pub gsd_width: f64,
    pub gsd_height: f64,
    /// Image position relative to the mosaic origin, in pixels.
    pub pixel_x: f64,
    pub pixel_y: f64,
    /// Local image pixels (origin at the top-left corner) to mosaic canvas pixels.
    pub affine_transform: Matrix3<f64>,
    /// Rotation about the image center, without any translation to the mosaic.
    pub rotation_transform: Matrix4<f64>,
    /// Image center in local pixels, the pivot of `rotation_transform`.
    pub image_center: (f64, f64),
}

impl MosaicPlacement {
    /// Inverse of [`MosaicPlacement::rotation_transform`].
    ///
    /// Computed as `reverse_center * R^T * center`; the image-frame rotation is
    /// orthogonal so its transpose is its inverse.
    pub fn inverse_rotation_transform(&self) -> Matrix4<f64> {
        let rotation: Matrix3<f64> = self.rotation_transform.fixed_view::<3, 3>(0, 0).into_owned();
        let (cx, cy) = self.image_center;
        Matrix4::new_translation(&Vector3::new(cx, cy, 0.0))
            * rotation.transpose().to_homogeneous()
            * Matrix4::new_translation(&Vector3::new(-cx, -cy, 0.0))
    }

    /// Maps a local image pixel into the mosaic canvas.
    pub fn apply_affine(&self, point: &Point2<f64>) -> Point2<f64> {
        self.affine_transform.transform_point(point)
    }

    /// Rotates a local image pixel about the image center.
    pub fn apply_rotation(&self, point: &Point3<f64>) -> Point3<f64> {
        self.rotation_transform.transform_point(point)
    }

    /// Undoes [`MosaicPlacement::apply_rotation`].
    pub fn apply_inverse_rotation(&self, point: &Point3<f64>) -> Point3<f64> {
        self.inverse_rotation_transform().transform_point(point)
    }
}

/// Translation moving the image center to the local origin.
pub fn center_translation(resolution: &Resolution) -> Matrix4<f64> {
    let (cx, cy) = resolution.center();
    Matrix4::new_translation(&Vector3::new(-cx, -cy, 0.0))
}

/// Translation moving the local origin back to the image center.
pub fn reverse_center_translation(resolution: &Resolution) -> Matrix4<f64> {
    let (cx, cy) = resolution.center();
    Matrix4::new_translation(&Vector3::new(cx, cy, 0.0))
}

/// Translation placing the mosaic origin at [`CANVAS_OFFSET_PX`].
pub fn canvas_translation() -> Matrix4<f64> {
    Matrix4::new_translation(&Vector3::new(CANVAS_OFFSET_PX, CANVAS_OFFSET_PX, 0.0))
}

/// Rotation plus pixel translation `(pixel_x, pixel_y, 0)`.
pub fn extrinsic_transform(rotation: &Matrix3<f64>, pixel_x: f64, pixel_y: f64) -> Matrix4<f64> {
    let mut extrinsic = rotation.to_homogeneous();
    extrinsic[(0, 3)] = pixel_x;
    extrinsic[(1, 3)] = pixel_y;
    extrinsic
}

/// Drops the z row and column of a homogeneous 4x4 transform.
pub fn reduce_to_affine(transform: &Matrix4<f64>) -> Matrix3<f64> {
    Matrix3::new(
        transform[(0, 0)],
        transform[(0, 1)],
        transform[(0, 3)],
        transform[(1, 0)],
        transform[(1, 1)],
        transform[(1, 3)],
        0.0,
        0.0,
        1.0,
    )
}

/// Pixel offset of a ground point from the mosaic origin.
///
/// East maps to `+x` and north to `-y`.
pub fn pixel_offset(
    projection: &GroundProjection,
    gsd: &GroundSampleDistance,
    origin: &MosaicOrigin,
) -> (f64, f64) {
    let delta_easting = projection.ground_easting - origin.easting;
    let delta_northing = projection.ground_northing - origin.northing;
    (
        delta_easting * CM_PER_M / gsd.width,
        -delta_northing * CM_PER_M / gsd.height,
    )
}

/// Assembles the mosaic placement of one image.
///
/// `rotation` is the image-frame camera rotation used for ground ray casting.
pub fn place(
    projection: &GroundProjection,
    gsd: &GroundSampleDistance,
    origin: &MosaicOrigin,
    resolution: &Resolution,
    rotation: &Matrix3<f64>,
) -> MosaicPlacement {
    let (pixel_x, pixel_y) = pixel_offset(projection, gsd, origin);

    let center = center_translation(resolution);
    let absolute = canvas_translation() * extrinsic_transform(rotation, pixel_x, pixel_y) * center;
    let rotation_transform =
        reverse_center_translation(resolution) * rotation.to_homogeneous() * center;

    MosaicPlacement {
        gsd_width: gsd.width,
        gsd_height: gsd.height,
        pixel_x,
        pixel_y,
        affine_transform: reduce_to_affine(&absolute),
        rotation_transform,
        image_center: resolution.center(),
    }
}
