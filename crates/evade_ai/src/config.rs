//! Evasion configuration

use crate::error::{EvasionError, Result};
use evade_query::{CollisionLayer, RaycastOptions};
use serde::{Deserialize, Serialize};

/// Per-agent evasion tuning.
///
/// Defaults match a human-sized agent fleeing on foot. Run [`EvasionConfig::validate`]
/// once before use; [`crate::EvasionController::new`] does it for you.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvasionConfig {
    /// Radius within which threats are considered at all
    pub awareness_radius: f32,

    /// How far each probe ray looks ahead
    pub hit_distance_threshold: f32,

    /// Field of view (degrees) of the probe fan, also assumed for threats
    pub fov_degrees: f32,

    /// Rays in the normal probe fan (odd after validation)
    pub num_rays: u32,

    /// An escape point closer than this to the agent triggers panic mode
    pub minimum_escape_distance: f32,

    /// Rays in the 360 degree panic fan
    pub panic_rays: u32,

    /// Body radius used to pull blocked endpoints back from the obstacle
    pub agent_radius: f32,

    /// Layer probed for obstacles
    pub obstacle_layer: CollisionLayer,
}

impl Default for EvasionConfig {
    fn default() -> Self {
        Self {
            awareness_radius: 10.0,
            hit_distance_threshold: 5.0,
            fov_degrees: 120.0,
            num_rays: 5,
            minimum_escape_distance: 2.0,
            panic_rays: 15,
            agent_radius: 1.0,
            obstacle_layer: CollisionLayer::OBSTACLES,
        }
    }
}

fn require(field: &'static str, ok: bool, reason: impl FnOnce() -> String) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(EvasionError::InvalidConfig { field, reason: reason() })
    }
}

impl EvasionConfig {
    /// Check every field and return the normalized config.
    ///
    /// An even `num_rays` is bumped to the next odd count so one ray always
    /// points straight along the preferred direction.
    pub fn validate(mut self) -> Result<Self> {
        let r = self.awareness_radius;
        require("awareness_radius", r.is_finite() && r > 0.0, || format!("must be > 0, got {r}"))?;

        let h = self.hit_distance_threshold;
        require("hit_distance_threshold", h.is_finite() && h > 0.0, || format!("must be > 0, got {h}"))?;

        let fov = self.fov_degrees;
        require("fov_degrees", (0.0..=360.0).contains(&fov), || format!("must be within 0..=360, got {fov}"))?;

        require("num_rays", self.num_rays >= 1, || "must be at least 1".to_string())?;

        let m = self.minimum_escape_distance;
        require("minimum_escape_distance", m.is_finite() && m >= 0.0, || format!("must be >= 0, got {m}"))?;

        require("panic_rays", self.panic_rays >= 1, || "must be at least 1".to_string())?;

        let a = self.agent_radius;
        require("agent_radius", a.is_finite() && a >= 0.0, || format!("must be >= 0, got {a}"))?;

        if self.num_rays % 2 == 0 {
            log::debug!("Even ray count {} bumped to {}", self.num_rays, self.num_rays + 1);
            self.num_rays += 1;
        }

        Ok(self)
    }

    /// Raycast options for one probe ray
    pub fn probe_options(&self) -> RaycastOptions {
        RaycastOptions::probe(self.obstacle_layer, self.hit_distance_threshold)
    }

    pub fn with_awareness_radius(mut self, radius: f32) -> Self {
        self.awareness_radius = radius;
        self
    }

    pub fn with_hit_distance_threshold(mut self, distance: f32) -> Self {
        self.hit_distance_threshold = distance;
        self
    }

    pub fn with_fov(mut self, degrees: f32) -> Self {
        self.fov_degrees = degrees;
        self
    }

    pub fn with_rays(mut self, num_rays: u32) -> Self {
        self.num_rays = num_rays;
        self
    }

    pub fn with_minimum_escape_distance(mut self, distance: f32) -> Self {
        self.minimum_escape_distance = distance;
        self
    }

    pub fn with_panic_rays(mut self, panic_rays: u32) -> Self {
        self.panic_rays = panic_rays;
        self
    }

    pub fn with_agent_radius(mut self, radius: f32) -> Self {
        self.agent_radius = radius;
        self
    }

    pub fn with_obstacle_layer(mut self, layer: CollisionLayer) -> Self {
        self.obstacle_layer = layer;
        self
    }
}
