//! Raycast queries and the oracle trait the steering code consumes

use crate::error::{QueryError, Result};
use crate::layers::{CollisionGroups, CollisionLayer};
use evade_math::Vec3;
use serde::{Deserialize, Serialize};

/// Result of a raycast query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaycastHit {
    /// Hit point in world space
    pub point: Vec3,
    /// Surface normal at hit point
    pub normal: Vec3,
    /// Distance from ray origin
    pub distance: f32,
}

/// Options for raycast queries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaycastOptions {
    /// Maximum distance for the ray
    pub max_distance: f32,
    /// Collision groups filter
    pub filter: CollisionGroups,
}

impl Default for RaycastOptions {
    fn default() -> Self {
        Self {
            max_distance: f32::MAX,
            filter: CollisionGroups::ALL,
        }
    }
}

impl RaycastOptions {
    /// Options for probing a single layer up to `max_distance`
    pub fn probe(layer: CollisionLayer, max_distance: f32) -> Self {
        Self::default()
            .with_max_distance(max_distance)
            .with_filter(CollisionGroups::query(layer))
    }

    /// Set maximum distance
    pub fn with_max_distance(mut self, distance: f32) -> Self {
        self.max_distance = distance;
        self
    }

    /// Set collision filter
    pub fn with_filter(mut self, filter: CollisionGroups) -> Self {
        self.filter = filter;
        self
    }
}

/// A ray-intersection oracle.
///
/// Implementations answer with the nearest hit within `options.max_distance`
/// among objects passing `options.filter`, or `None`. `direction` need not be
/// normalized; reported distances are in world units along the normalized
/// direction.
pub trait RayOracle {
    fn raycast(&self, origin: Vec3, direction: Vec3, options: &RaycastOptions) -> Result<Option<RaycastHit>>;
}

/// Oracle for an empty world: nothing is ever hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObstacles;

impl RayOracle for NoObstacles {
    fn raycast(&self, origin: Vec3, direction: Vec3, options: &RaycastOptions) -> Result<Option<RaycastHit>> {
        validate_ray(origin, direction, options)?;
        Ok(None)
    }
}

/// Oracle backed by a closure. See [`from_fn`].
#[derive(Clone, Copy)]
pub struct FnOracle<F>(F);

impl<F> RayOracle for FnOracle<F>
where
    F: Fn(Vec3, Vec3, &RaycastOptions) -> Result<Option<RaycastHit>>,
{
    fn raycast(&self, origin: Vec3, direction: Vec3, options: &RaycastOptions) -> Result<Option<RaycastHit>> {
        (self.0)(origin, direction, options)
    }
}

/// Wrap a closure as a [`RayOracle`]
pub fn from_fn<F>(f: F) -> FnOracle<F>
where
    F: Fn(Vec3, Vec3, &RaycastOptions) -> Result<Option<RaycastHit>>,
{
    FnOracle(f)
}

/// Check a query and return the normalized direction.
pub fn validate_ray(origin: Vec3, direction: Vec3, options: &RaycastOptions) -> Result<Vec3> {
    if options.max_distance.is_nan() || options.max_distance < 0.0 {
        return Err(QueryError::InvalidDistance(options.max_distance));
    }
    if !origin.is_finite() {
        return Err(QueryError::InvalidRay {
            origin: origin.to_array(),
            direction: direction.to_array(),
        });
    }
    direction.try_normalize(1e-6).ok_or(QueryError::InvalidRay {
        origin: origin.to_array(),
        direction: direction.to_array(),
    })
}
