//! Ray intersection tests against obstacle primitives
//!
//! - AABB (slab method)
//! - Sphere

use crate::bounds::{Sphere, AABB};
use crate::ray::Ray;
use crate::vector::Vec3;

/// Ray-AABB intersection using the slab method
///
/// Returns the distance along the ray to the intersection point,
/// or None if the ray doesn't intersect the AABB. A ray starting inside
/// the box reports the exit distance.
pub fn ray_aabb(ray: &Ray, aabb: &AABB) -> Option<f32> {
    let inv_dir = ray.inverse_direction();

    let t1 = (aabb.min.x - ray.origin.x) * inv_dir.x;
    let t2 = (aabb.max.x - ray.origin.x) * inv_dir.x;
    let t3 = (aabb.min.y - ray.origin.y) * inv_dir.y;
    let t4 = (aabb.max.y - ray.origin.y) * inv_dir.y;
    let t5 = (aabb.min.z - ray.origin.z) * inv_dir.z;
    let t6 = (aabb.max.z - ray.origin.z) * inv_dir.z;

    let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
    let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

    if tmax < 0.0 || tmin > tmax {
        None
    } else {
        Some(if tmin < 0.0 { tmax } else { tmin })
    }
}

/// Ray-Sphere intersection
pub fn ray_sphere(ray: &Ray, sphere: &Sphere) -> Option<f32> {
    ray_sphere_at(ray, sphere.center, sphere.radius)
}

/// Ray-Sphere intersection with center and radius
pub fn ray_sphere_at(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let a = ray.direction.dot(ray.direction);
    let b = 2.0 * oc.dot(ray.direction);
    let c = oc.dot(oc) - radius * radius;
    let discriminant = b * b - 4.0 * a * c;

    if discriminant < 0.0 {
        None
    } else {
        let sqrt_d = discriminant.sqrt();
        let t1 = (-b - sqrt_d) / (2.0 * a);
        let t2 = (-b + sqrt_d) / (2.0 * a);

        // Nearest positive intersection
        if t1 > 0.0 {
            Some(t1)
        } else if t2 > 0.0 {
            Some(t2)
        } else {
            None
        }
    }
}
