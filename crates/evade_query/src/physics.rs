//! Rapier 3D obstacle backend
//!
//! Obstacles become fixed colliders (no rigid bodies) in a Rapier collider
//! set; rays go through the Rapier query pipeline. The pipeline is refreshed
//! on every insertion, so the backend is always ready to answer.

use crate::error::Result;
use crate::field::{Obstacle, ObstacleField, ObstacleShape};
use crate::layers::CollisionGroups;
use crate::query::{validate_ray, RayOracle, RaycastHit, RaycastOptions};
use evade_math::Vec3;
use rapier3d::prelude as rapier;

/// Static obstacle world backed by Rapier 3D
pub struct RapierObstacles {
    /// Always empty: obstacles are parentless colliders
    bodies: rapier::RigidBodySet,
    /// Source shapes, indexed by collider `user_data`
    shapes: Vec<ObstacleShape>,
    colliders: rapier::ColliderSet,
    query_pipeline: rapier::QueryPipeline,
}

impl Default for RapierObstacles {
    fn default() -> Self {
        Self::new()
    }
}

impl RapierObstacles {
    pub fn new() -> Self {
        Self {
            bodies: rapier::RigidBodySet::new(),
            shapes: Vec::new(),
            colliders: rapier::ColliderSet::new(),
            query_pipeline: rapier::QueryPipeline::new(),
        }
    }

    /// Mirror every obstacle of an analytic field
    pub fn from_field(field: &ObstacleField) -> Self {
        let mut world = Self::new();
        for obstacle in field.obstacles() {
            world.insert(obstacle);
        }
        world
    }

    /// Add an obstacle
    pub fn insert(&mut self, obstacle: &Obstacle) -> rapier::ColliderHandle {
        let (shape, center) = match obstacle.shape {
            ObstacleShape::Sphere { center, radius } => (rapier::SharedShape::ball(radius), center),
            ObstacleShape::Box { center, half_extents } => {
                let h = half_extents.abs();
                (rapier::SharedShape::cuboid(h.x, h.y, h.z), center)
            }
        };

        let collider = rapier::ColliderBuilder::new(shape)
            .translation(rapier::Vector::new(center.x, center.y, center.z))
            .collision_groups(interaction_groups(obstacle.groups))
            .user_data(self.shapes.len() as u128)
            .build();

        self.shapes.push(obstacle.shape);

        let handle = self.colliders.insert(collider);
        self.query_pipeline.update(&self.colliders);
        log::trace!("Inserted obstacle collider {:?} at {}", handle, center);
        handle
    }

    /// Number of colliders
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn interaction_groups(groups: CollisionGroups) -> rapier::InteractionGroups {
    rapier::InteractionGroups::new(
        rapier::Group::from_bits_truncate(groups.memberships),
        rapier::Group::from_bits_truncate(groups.filter),
    )
}

impl RayOracle for RapierObstacles {
    fn raycast(&self, origin: Vec3, direction: Vec3, options: &RaycastOptions) -> Result<Option<RaycastHit>> {
        let direction = validate_ray(origin, direction, options)?;
        let ray = rapier::Ray::new(
            rapier::Point::new(origin.x, origin.y, origin.z),
            rapier::Vector::new(direction.x, direction.y, direction.z),
        );

        // Same rule as the analytic field: skip obstacles holding the origin
        let outside = |_: rapier::ColliderHandle, collider: &rapier::Collider| {
            self.shapes
                .get(collider.user_data as usize)
                .map_or(true, |shape| !shape.contains(origin))
        };
        let filter = rapier::QueryFilter::new()
            .exclude_sensors()
            .groups(interaction_groups(options.filter))
            .predicate(&outside);

        let hit = self
            .query_pipeline
            .cast_ray_and_get_normal(
                &self.bodies,
                &self.colliders,
                &ray,
                options.max_distance,
                true,
                filter,
            )
            .map(|(_handle, intersection)| {
                let point = ray.point_at(intersection.time_of_impact);
                RaycastHit {
                    point: Vec3::new(point.x, point.y, point.z),
                    normal: Vec3::new(
                        intersection.normal.x,
                        intersection.normal.y,
                        intersection.normal.z,
                    ),
                    distance: intersection.time_of_impact,
                }
            });

        Ok(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::CollisionLayer;
    use approx::assert_relative_eq;

    fn probe(max: f32) -> RaycastOptions {
        RaycastOptions::probe(CollisionLayer::OBSTACLES, max)
    }

    #[test]
    fn test_empty_world() {
        let world = RapierObstacles::new();
        assert!(world.is_empty());
        assert!(world.raycast(Vec3::ZERO, Vec3::Z, &probe(10.0)).unwrap().is_none());
    }

    #[test]
    fn test_box_hit_matches_analytic_field() {
        let mut field = ObstacleField::new();
        field.add_box(Vec3::new(0.0, 0.0, 4.0), Vec3::new(1.0, 1.0, 0.5), CollisionLayer::OBSTACLES);
        field.add_sphere(Vec3::new(4.0, 0.0, 0.0), 1.0, CollisionLayer::OBSTACLES);
        let world = RapierObstacles::from_field(&field);
        assert_eq!(world.len(), 2);

        for dir in [Vec3::Z, Vec3::X] {
            let analytic = field.raycast(Vec3::ZERO, dir, &probe(10.0)).unwrap().unwrap();
            let rapier = world.raycast(Vec3::ZERO, dir, &probe(10.0)).unwrap().unwrap();
            assert_relative_eq!(analytic.distance, rapier.distance, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_origin_inside_obstacle_matches_analytic_field() {
        let mut field = ObstacleField::new();
        field.add_sphere(Vec3::ZERO, 2.0, CollisionLayer::OBSTACLES);
        field.add_box(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.5, 0.5, 3.0), CollisionLayer::OBSTACLES);
        let world = RapierObstacles::from_field(&field);

        for dir in [Vec3::X, Vec3::Z, Vec3::NEG_Z] {
            assert!(field.raycast(Vec3::ZERO, dir, &probe(5.0)).unwrap().is_none());
            assert!(world.raycast(Vec3::ZERO, dir, &probe(5.0)).unwrap().is_none());
        }

        // Obstacles beyond the enclosing one are still reported
        let outer = Obstacle::new(
            ObstacleShape::Sphere { center: Vec3::new(4.0, 0.0, 0.0), radius: 1.0 },
            CollisionLayer::OBSTACLES,
        );
        field.add(outer);
        let mut world = world;
        world.insert(&outer);

        let analytic = field.raycast(Vec3::ZERO, Vec3::X, &probe(5.0)).unwrap().unwrap();
        let rapier = world.raycast(Vec3::ZERO, Vec3::X, &probe(5.0)).unwrap().unwrap();
        assert_relative_eq!(analytic.distance, 3.0, epsilon = 1e-5);
        assert_relative_eq!(rapier.distance, analytic.distance, epsilon = 1e-3);
    }

    #[test]
    fn test_layer_filter_and_range() {
        let mut world = RapierObstacles::new();
        world.insert(&Obstacle::new(
            ObstacleShape::Sphere { center: Vec3::new(0.0, 0.0, 3.0), radius: 1.0 },
            CollisionLayer::ENVIRONMENT,
        ));
        world.insert(&Obstacle::new(
            ObstacleShape::Sphere { center: Vec3::new(0.0, 0.0, 9.0), radius: 1.0 },
            CollisionLayer::OBSTACLES,
        ));

        // The environment sphere is skipped, the obstacle is out of range
        assert!(world.raycast(Vec3::ZERO, Vec3::Z, &probe(5.0)).unwrap().is_none());
        let hit = world.raycast(Vec3::ZERO, Vec3::Z, &probe(10.0)).unwrap().unwrap();
        assert_relative_eq!(hit.distance, 8.0, epsilon = 1e-3);
    }
}
