//! # evade_math - Steering Geometry
//!
//! The small set of 3D primitives the evasion crates are built on: vectors,
//! quaternion rotation about the up axis, rays and the ray/primitive tests used
//! by the analytic obstacle backend.
//!
//! The world is Y-up. Every "flat" helper works in the XZ plane.

pub mod angle;
pub mod bounds;
pub mod intersect;
pub mod quaternion;
pub mod ray;
pub mod vector;

pub use angle::*;
pub use bounds::*;
pub use intersect::*;
pub use quaternion::*;
pub use ray::*;
pub use vector::*;

/// Common math constants
pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const DEG_TO_RAD: f32 = PI / 180.0;
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Convert degrees to radians
#[inline]
pub fn radians(degrees: f32) -> f32 {
    degrees * consts::DEG_TO_RAD
}

/// Convert radians to degrees
#[inline]
pub fn degrees(radians: f32) -> f32 {
    radians * consts::RAD_TO_DEG
}

pub mod prelude {
    pub use crate::angle::{angle_between, rotate_about_up, signed_angle_about_up};
    pub use crate::bounds::{Sphere, AABB};
    pub use crate::intersect::{ray_aabb, ray_sphere, ray_sphere_at};
    pub use crate::quaternion::Quat;
    pub use crate::ray::Ray;
    pub use crate::vector::Vec3;
    pub use crate::{degrees, radians};
}
