//! Evade Query - obstacle raycasting
//!
//! The evasion algorithm only ever asks one question of the world: "does a ray
//! from here, in this direction, hit an obstacle within this distance, and if
//! so how far away?". This crate defines that question as the [`RayOracle`]
//! trait and ships two answers to it.
//!
//! # Backends
//!
//! - [`ObstacleField`]: analytic spheres and boxes, no broad phase. Deterministic
//!   and cheap, used by tests and small scenes.
//! - [`RapierObstacles`]: static colliders in a Rapier 3D query pipeline.
//! - Any `Fn(Vec3, Vec3, &RaycastOptions) -> Result<Option<RaycastHit>>` closure.
//!
//! # Example
//!
//! ```ignore
//! use evade_query::prelude::*;
//!
//! let mut field = ObstacleField::new();
//! field.add_sphere(Vec3::new(0.0, 0.0, 4.0), 1.0, CollisionLayer::OBSTACLES);
//!
//! let options = RaycastOptions::default()
//!     .with_max_distance(5.0)
//!     .with_filter(CollisionGroups::query(CollisionLayer::OBSTACLES));
//! let hit = field.raycast(Vec3::ZERO, Vec3::Z, &options)?;
//! ```

pub mod error;
pub mod field;
pub mod layers;
pub mod query;
pub mod physics;

pub mod prelude {
    //! Common imports for obstacle queries
    pub use crate::error::{QueryError, Result};
    pub use crate::field::{Obstacle, ObstacleField, ObstacleShape};
    pub use crate::layers::{CollisionGroups, CollisionLayer};
    pub use crate::query::{from_fn, FnOracle, NoObstacles, RayOracle, RaycastHit, RaycastOptions};
    pub use crate::physics::RapierObstacles;
    pub use evade_math::Vec3;
}

pub use prelude::*;
