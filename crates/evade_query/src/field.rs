//! Analytic obstacle backend
//!
//! A flat list of spheres and boxes tested one by one. No acceleration
//! structure: intended for tests and scenes with a handful of obstacles.

use crate::error::Result;
use crate::layers::{CollisionGroups, CollisionLayer};
use crate::query::{validate_ray, RayOracle, RaycastHit, RaycastOptions};
use evade_math::{ray_aabb, ray_sphere, Ray, Sphere, Vec3, AABB};
use serde::{Deserialize, Serialize};

/// Obstacle geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ObstacleShape {
    Sphere { center: Vec3, radius: f32 },
    Box { center: Vec3, half_extents: Vec3 },
}

impl ObstacleShape {
    /// Whether `point` lies inside or on the shape
    pub fn contains(&self, point: Vec3) -> bool {
        match *self {
            Self::Sphere { center, radius } => Sphere::new(center, radius).contains_point(point),
            Self::Box { center, half_extents } => {
                AABB::from_center_half_extents(center, half_extents).contains_point(point)
            }
        }
    }

    /// Distance along `ray` to the surface, and the outward normal there
    fn intersect(&self, ray: &Ray) -> Option<(f32, Vec3)> {
        match *self {
            Self::Sphere { center, radius } => {
                let t = ray_sphere(ray, &Sphere::new(center, radius))?;
                let normal = (ray.at(t) - center).normalize();
                Some((t, normal))
            }
            Self::Box { center, half_extents } => {
                let aabb = AABB::from_center_half_extents(center, half_extents);
                let t = ray_aabb(ray, &aabb)?;
                Some((t, box_normal(&aabb, ray.at(t))))
            }
        }
    }
}

/// Face normal of the box face closest to `point`
fn box_normal(aabb: &AABB, point: Vec3) -> Vec3 {
    let faces = [
        ((point.x - aabb.min.x).abs(), Vec3::NEG_X),
        ((point.x - aabb.max.x).abs(), Vec3::X),
        ((point.y - aabb.min.y).abs(), Vec3::NEG_Y),
        ((point.y - aabb.max.y).abs(), Vec3::Y),
        ((point.z - aabb.min.z).abs(), Vec3::NEG_Z),
        ((point.z - aabb.max.z).abs(), Vec3::Z),
    ];
    faces
        .iter()
        .fold((f32::MAX, Vec3::Y), |best, &(d, n)| if d < best.0 { (d, n) } else { best })
        .1
}

/// A single obstacle with its collision groups
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    #[serde(flatten)]
    pub shape: ObstacleShape,
    #[serde(default = "default_obstacle_groups")]
    pub groups: CollisionGroups,
}

fn default_obstacle_groups() -> CollisionGroups {
    CollisionGroups::member_of(CollisionLayer::OBSTACLES)
}

impl Obstacle {
    pub fn new(shape: ObstacleShape, layer: CollisionLayer) -> Self {
        Self {
            shape,
            groups: CollisionGroups::member_of(layer),
        }
    }
}

/// Analytic obstacle set implementing [`RayOracle`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
}

impl ObstacleField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of obstacles
    pub fn from_obstacles(obstacles: impl IntoIterator<Item = Obstacle>) -> Self {
        Self {
            obstacles: obstacles.into_iter().collect(),
        }
    }

    pub fn add(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn add_sphere(&mut self, center: Vec3, radius: f32, layer: CollisionLayer) {
        self.add(Obstacle::new(ObstacleShape::Sphere { center, radius }, layer));
    }

    pub fn add_box(&mut self, center: Vec3, half_extents: Vec3, layer: CollisionLayer) {
        self.add(Obstacle::new(ObstacleShape::Box { center, half_extents }, layer));
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

impl RayOracle for ObstacleField {
    fn raycast(&self, origin: Vec3, direction: Vec3, options: &RaycastOptions) -> Result<Option<RaycastHit>> {
        let direction = validate_ray(origin, direction, options)?;
        let ray = Ray::new(origin, direction);

        let nearest = self
            .obstacles
            .iter()
            .filter(|o| options.filter.can_collide(&o.groups))
            // Rays never hit an obstacle they start inside
            .filter(|o| !o.shape.contains(origin))
            .filter_map(|o| o.shape.intersect(&ray))
            .filter(|(t, _)| *t <= options.max_distance)
            .fold(None, |best: Option<(f32, Vec3)>, hit| match best {
                Some(b) if b.0 <= hit.0 => Some(b),
                _ => Some(hit),
            });

        Ok(nearest.map(|(distance, normal)| RaycastHit {
            point: ray.at(distance),
            normal,
            distance,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn probe(max: f32) -> RaycastOptions {
        RaycastOptions::probe(CollisionLayer::OBSTACLES, max)
    }

    #[test]
    fn test_nearest_obstacle_wins() {
        let mut field = ObstacleField::new();
        field.add_sphere(Vec3::new(0.0, 0.0, 8.0), 1.0, CollisionLayer::OBSTACLES);
        field.add_box(Vec3::new(0.0, 0.0, 4.0), Vec3::new(1.0, 1.0, 0.5), CollisionLayer::OBSTACLES);

        let hit = field.raycast(Vec3::ZERO, Vec3::Z, &probe(20.0)).unwrap().unwrap();
        assert_relative_eq!(hit.distance, 3.5, epsilon = 1e-5);
        assert_eq!(hit.normal, Vec3::NEG_Z);
        assert_relative_eq!(hit.point.z, 3.5, epsilon = 1e-5);
    }

    #[test]
    fn test_max_distance_limits_hits() {
        let mut field = ObstacleField::new();
        field.add_sphere(Vec3::new(6.0, 0.0, 0.0), 0.5, CollisionLayer::OBSTACLES);

        assert!(field.raycast(Vec3::ZERO, Vec3::X, &probe(5.0)).unwrap().is_none());
        let hit = field.raycast(Vec3::ZERO, Vec3::X, &probe(6.0)).unwrap().unwrap();
        assert_relative_eq!(hit.distance, 5.5, epsilon = 1e-5);
    }

    #[test]
    fn test_other_layers_are_ignored() {
        let mut field = ObstacleField::new();
        field.add_sphere(Vec3::new(0.0, 0.0, 2.0), 1.0, CollisionLayer::ENVIRONMENT);
        assert!(field.raycast(Vec3::ZERO, Vec3::Z, &probe(10.0)).unwrap().is_none());
        assert_eq!(field.len(), 1);
    }

    #[test]
    fn test_unnormalized_direction_reports_world_distance() {
        let mut field = ObstacleField::new();
        field.add_sphere(Vec3::new(0.0, 0.0, 3.0), 1.0, CollisionLayer::OBSTACLES);
        let hit = field
            .raycast(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0), &probe(10.0))
            .unwrap()
            .unwrap();
        assert_relative_eq!(hit.distance, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_invalid_direction_is_an_error() {
        let field = ObstacleField::new();
        assert!(field.raycast(Vec3::ZERO, Vec3::ZERO, &probe(10.0)).is_err());
    }

    #[test]
    fn test_obstacles_around_the_origin_are_skipped() {
        let mut field = ObstacleField::new();
        field.add_sphere(Vec3::ZERO, 2.0, CollisionLayer::OBSTACLES);
        field.add_box(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.5, 0.5, 2.0), CollisionLayer::OBSTACLES);
        assert!(field.raycast(Vec3::ZERO, Vec3::X, &probe(5.0)).unwrap().is_none());

        field.add_sphere(Vec3::new(4.0, 0.0, 0.0), 1.0, CollisionLayer::OBSTACLES);
        let hit = field.raycast(Vec3::ZERO, Vec3::X, &probe(5.0)).unwrap().unwrap();
        assert_relative_eq!(hit.distance, 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_shape_contains() {
        let sphere = ObstacleShape::Sphere { center: Vec3::ZERO, radius: 2.0 };
        assert!(sphere.contains(Vec3::new(0.0, 0.0, 2.0)));
        assert!(!sphere.contains(Vec3::new(2.0, 2.0, 0.0)));

        let cube = ObstacleShape::Box { center: Vec3::ZERO, half_extents: Vec3::ONE };
        assert!(cube.contains(Vec3::new(0.5, -0.5, 1.0)));
        assert!(!cube.contains(Vec3::new(1.5, 0.0, 0.0)));
    }
}
