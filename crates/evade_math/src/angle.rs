//! Angle helpers in degrees
//!
//! Steering configuration is authored in degrees, so these helpers take and
//! return degrees and convert at the edge.

use crate::quaternion::Quat;
use crate::vector::Vec3;
use crate::radians;

/// Unsigned angle between two vectors, in degrees, within `[0, 180]`.
///
/// Returns 0 when either vector has zero length.
pub fn angle_between(a: Vec3, b: Vec3) -> f32 {
    let denom = (a.length_squared() * b.length_squared()).sqrt();
    if denom < 1e-15 {
        return 0.0;
    }
    let cos_angle = (a.dot(b) / denom).clamp(-1.0, 1.0);
    crate::degrees(cos_angle.acos())
}

/// Rotate `v` about the world up axis by `angle_degrees`.
#[inline]
pub fn rotate_about_up(v: Vec3, angle_degrees: f32) -> Vec3 {
    Quat::from_rotation_y(radians(angle_degrees)).rotate(v)
}

/// Signed angle (degrees) that takes the ground projection of `from` onto that of
/// `to` when applied with [`rotate_about_up`].
pub fn signed_angle_about_up(from: Vec3, to: Vec3) -> f32 {
    let from = from.flatten();
    let to = to.flatten();
    let unsigned = angle_between(from, to);
    // rotate_about_up is right-handed about +Y: positive angles take +X towards -Z
    let sign = from.cross(to).y;
    if sign < 0.0 { -unsigned } else { unsigned }
}
