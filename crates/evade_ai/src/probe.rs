//! Fan-cast obstacle probing and escape point selection
//!
//! A fan of rays is swept around the preferred direction. Rays that reach
//! their full length are preferred over rays that hit something; among the
//! candidates the endpoint furthest from the nearest threat wins. If the
//! winner is too close to the agent the probe panics once: it recasts a full
//! circle with more rays and takes whatever that gives.
//!
//! ```text
//!            preferred
//!     -fov/2     |     +fov/2
//!         \   \  |  /   /
//!          \   \ | /   /
//!           \   \|/   /
//!               agent
//! ```

use crate::config::EvasionConfig;
use crate::controller::EvasionState;
use crate::error::{EvasionError, Result};
use crate::perception::{AgentPose, ThreatRecord};
use evade_math::{rotate_about_up, Vec3};
use evade_query::{RayOracle, RaycastOptions};
use serde::{Deserialize, Serialize};

/// Field of view of the panic fan
pub const PANIC_FOV_DEGREES: f32 = 360.0;

/// Panic recasts allowed per tick
const MAX_ESCALATIONS: u32 = 1;

/// One cast ray
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayProbe {
    /// Ray direction (unit)
    pub direction: Vec3,
    /// Distance to the obstacle, if the ray hit one
    pub hit: Option<f32>,
}

impl RayProbe {
    pub fn clear(direction: Vec3) -> Self {
        Self { direction, hit: None }
    }

    pub fn blocked(direction: Vec3, distance: f32) -> Self {
        Self { direction, hit: Some(distance) }
    }

    #[inline]
    pub fn is_clear(&self) -> bool {
        self.hit.is_none()
    }

    /// Where the agent would end up following this ray.
    ///
    /// Clear rays run their full `reach`; blocked rays stop `agent_radius` short
    /// of the hit so the body does not overlap the obstacle.
    pub fn endpoint(&self, origin: Vec3, reach: f32, agent_radius: f32) -> Vec3 {
        match self.hit {
            Some(distance) => origin + self.direction * (distance - agent_radius),
            None => origin + self.direction * reach,
        }
    }
}

/// Result of a waypoint computation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Escape point
    pub point: Vec3,
    /// Rays cast to find it, panic fan included
    pub rays_cast: usize,
    /// Whether the panic fan was cast
    pub panic_triggered: bool,
}

/// Directions of a fan of `num_rays` rays spread over `fov_degrees` around `preferred`.
///
/// Ray `i` is `preferred` rotated about the up axis by `-fov/2 + i * fov / (n - 1)`.
/// A single ray is `preferred` itself.
pub fn fan_directions(preferred: Vec3, num_rays: u32, fov_degrees: f32) -> Result<Vec<Vec3>> {
    match num_rays {
        0 => Err(EvasionError::NoRays),
        1 => Ok(vec![preferred]),
        n => {
            let increment = fov_degrees / (n - 1) as f32;
            let start = -fov_degrees * 0.5;
            Ok((0..n)
                .map(|i| rotate_about_up(preferred, start + increment * i as f32))
                .collect())
        }
    }
}

/// Obstacle probe for one agent and one tick
pub struct ObstacleProbe<'a> {
    agent: &'a AgentPose,
    records: &'a [ThreatRecord],
    config: &'a EvasionConfig,
    oracle: &'a dyn RayOracle,
}

impl<'a> ObstacleProbe<'a> {
    pub fn new(
        agent: &'a AgentPose,
        records: &'a [ThreatRecord],
        config: &'a EvasionConfig,
        oracle: &'a dyn RayOracle,
    ) -> Self {
        Self { agent, records, config, oracle }
    }

    /// Body radius used to pull blocked endpoints back.
    ///
    /// A positive radius on the pose wins over the configured one.
    pub fn agent_radius(&self) -> f32 {
        if self.agent.radius > 0.0 {
            self.agent.radius
        } else {
            self.config.agent_radius
        }
    }

    /// Cast one ray.
    ///
    /// A backend failure is logged and counted as a hit at the agent's own
    /// radius: the ray is treated as blocked and its endpoint collapses onto
    /// the agent, so it only wins when nothing better exists.
    fn cast(&self, direction: Vec3, options: &RaycastOptions) -> RayProbe {
        match self.oracle.raycast(self.agent.position, direction, options) {
            Ok(Some(hit)) => RayProbe::blocked(direction, hit.distance),
            Ok(None) => RayProbe::clear(direction),
            Err(err) => {
                log::warn!("Probe ray {} failed, treating as blocked: {}", direction, err);
                RayProbe::blocked(direction, self.agent_radius())
            }
        }
    }

    /// Cast a fan of rays around `preferred`
    pub fn cast_fan(&self, preferred: Vec3, num_rays: u32, fov_degrees: f32) -> Result<Vec<RayProbe>> {
        let options = self.config.probe_options();
        let probes: Vec<RayProbe> = fan_directions(preferred, num_rays, fov_degrees)?
            .into_iter()
            .map(|direction| self.cast(direction, &options))
            .collect();

        log::trace!(
            "Fan of {} rays over {} degrees: {} clear",
            probes.len(),
            fov_degrees,
            probes.iter().filter(|p| p.is_clear()).count()
        );
        Ok(probes)
    }

    /// Distance from `point` to the nearest threat. Infinite with no threats.
    pub fn safety_score(&self, point: Vec3) -> f32 {
        self.records
            .iter()
            .map(|record| point.distance(record.position()))
            .fold(f32::INFINITY, f32::min)
    }

    /// Find an escape point with a fan of `num_rays` rays over `fov_degrees`.
    ///
    /// Clear rays are candidates; if every ray is blocked, all of them are.
    pub fn compute_waypoint(
        &self,
        preferred: Vec3,
        num_rays: u32,
        fov_degrees: f32,
        state: &mut EvasionState,
    ) -> Result<Waypoint> {
        self.compute_at_depth(preferred, num_rays, fov_degrees, state, 0)
    }

    /// Pick the safest candidate, escalating to the panic fan if it is too close.
    pub fn score_and_select(
        &self,
        preferred: Vec3,
        candidates: &[RayProbe],
        state: &mut EvasionState,
    ) -> Result<Waypoint> {
        self.select_at_depth(preferred, candidates, state, 0)
    }

    fn compute_at_depth(
        &self,
        preferred: Vec3,
        num_rays: u32,
        fov_degrees: f32,
        state: &mut EvasionState,
        depth: u32,
    ) -> Result<Waypoint> {
        let probes = self.cast_fan(preferred, num_rays, fov_degrees)?;

        let clear: Vec<RayProbe> = probes.iter().copied().filter(RayProbe::is_clear).collect();
        let candidates = if clear.is_empty() { &probes[..] } else { &clear[..] };

        let mut waypoint = self.select_at_depth(preferred, candidates, state, depth)?;
        waypoint.rays_cast += probes.len();
        Ok(waypoint)
    }

    fn select_at_depth(
        &self,
        preferred: Vec3,
        candidates: &[RayProbe],
        state: &mut EvasionState,
        depth: u32,
    ) -> Result<Waypoint> {
        let origin = self.agent.position;
        let reach = self.config.hit_distance_threshold;
        let radius = self.agent_radius();

        let (first, rest) = candidates.split_first().ok_or(EvasionError::NoCandidates)?;
        let first_point = first.endpoint(origin, reach, radius);
        let mut best = (first_point, self.safety_score(first_point));

        // Strictly greater: the first of equally safe candidates wins
        for probe in rest {
            let point = probe.endpoint(origin, reach, radius);
            let score = self.safety_score(point);
            if score > best.1 {
                best = (point, score);
            }
        }

        let (point, score) = best;
        let selected = Waypoint {
            point,
            rays_cast: 0,
            panic_triggered: false,
        };

        let travel = point.distance(origin);
        if travel >= self.config.minimum_escape_distance {
            log::trace!("Escape point {} (safety {:.2}, travel {:.2})", point, score, travel);
            return Ok(selected);
        }

        if state.panic_mode {
            log::debug!("Panic fan still too close ({:.2}), accepting {}", travel, point);
            state.panic_mode = false;
            return Ok(selected);
        }

        if depth >= MAX_ESCALATIONS {
            return Err(EvasionError::EscalationDepth(depth + 1));
        }

        log::debug!(
            "Escape point {} only {:.2} away, panicking with {} rays",
            point,
            travel,
            self.config.panic_rays
        );
        state.panic_mode = true;
        let result = self.compute_at_depth(
            preferred,
            self.config.panic_rays,
            PANIC_FOV_DEGREES,
            state,
            depth + 1,
        );
        // The latch lasts one escalation
        state.panic_mode = false;

        let mut waypoint = result?;
        waypoint.panic_triggered = true;
        Ok(waypoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::Threat;
    use approx::assert_relative_eq;
    use evade_math::signed_angle_about_up;
    use evade_query::{from_fn, NoObstacles, QueryError, RaycastHit};
    use std::cell::Cell;

    fn hit_at(origin: Vec3, direction: Vec3, distance: f32) -> Option<RaycastHit> {
        Some(RaycastHit {
            point: origin + direction * distance,
            normal: -direction,
            distance,
        })
    }

    fn threat_record(position: Vec3) -> ThreatRecord {
        ThreatRecord {
            threat: Threat::facing(1, position, Vec3::ZERO),
            distance: position.length(),
        }
    }

    #[test]
    fn test_fan_is_symmetric_and_centered() {
        let dirs = fan_directions(Vec3::Z, 5, 120.0).unwrap();
        assert_eq!(dirs.len(), 5);

        let angles: Vec<f32> = dirs.iter().map(|d| signed_angle_about_up(Vec3::Z, *d)).collect();
        for (angle, expected) in angles.iter().zip([-60.0, -30.0, 0.0, 30.0, 60.0]) {
            assert_relative_eq!(*angle, expected, epsilon = 1e-3);
        }
        assert_relative_eq!((dirs[2] - Vec3::Z).length(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_fan_edge_counts() {
        assert_eq!(fan_directions(Vec3::Z, 0, 120.0), Err(EvasionError::NoRays));
        assert_eq!(fan_directions(Vec3::X, 1, 120.0).unwrap(), vec![Vec3::X]);

        let panic = fan_directions(Vec3::Z, 15, PANIC_FOV_DEGREES).unwrap();
        assert_eq!(panic.len(), 15);
        // -180 and +180 coincide
        assert_relative_eq!((panic[0] - panic[14]).length(), 0.0, epsilon = 1e-5);
        assert_relative_eq!((panic[7] - Vec3::Z).length(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_endpoints() {
        let clear = RayProbe::clear(Vec3::X);
        let blocked = RayProbe::blocked(Vec3::X, 3.0);
        assert_eq!(clear.endpoint(Vec3::ZERO, 5.0, 1.0), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(blocked.endpoint(Vec3::ZERO, 5.0, 1.0), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_open_field_runs_straight_away() {
        let agent = AgentPose::default();
        let records = [threat_record(Vec3::new(0.0, 0.0, 5.0))];
        let config = EvasionConfig::default();
        let probe = ObstacleProbe::new(&agent, &records, &config, &NoObstacles);
        let mut state = EvasionState::default();

        let waypoint = probe.compute_waypoint(Vec3::NEG_Z, 5, 120.0, &mut state).unwrap();
        assert_relative_eq!(waypoint.point.z, -5.0, epsilon = 1e-5);
        assert_relative_eq!(waypoint.point.x, 0.0, epsilon = 1e-5);
        assert_eq!(waypoint.rays_cast, 5);
        assert!(!waypoint.panic_triggered);
        assert!(!state.panic_mode);
    }

    #[test]
    fn test_clear_rays_beat_blocked_rays() {
        let agent = AgentPose::default();
        let records = [threat_record(Vec3::new(0.0, 0.0, 5.0))];
        let config = EvasionConfig::default();
        // Everything is blocked except a narrow window around +X
        let oracle = from_fn(|origin, direction, _options| {
            if direction.x > 0.8 {
                Ok(None)
            } else {
                Ok(hit_at(origin, direction, 4.9))
            }
        });
        let probe = ObstacleProbe::new(&agent, &records, &config, &oracle);
        let mut state = EvasionState::default();

        let waypoint = probe.compute_waypoint(Vec3::NEG_Z, 5, 120.0, &mut state).unwrap();
        let heading = waypoint.point.normalize();
        assert!(heading.x > 0.8, "picked {}", waypoint.point);
        assert_relative_eq!(waypoint.point.length(), 5.0, epsilon = 1e-4);
    }

    #[test]
    fn test_all_blocked_uses_best_blocked_ray() {
        let agent = AgentPose::default();
        let records = [threat_record(Vec3::new(0.0, 0.0, 5.0))];
        let config = EvasionConfig::default();
        let oracle = from_fn(|origin, direction, _options| Ok(hit_at(origin, direction, 4.0)));
        let probe = ObstacleProbe::new(&agent, &records, &config, &oracle);
        let mut state = EvasionState::default();

        let waypoint = probe.compute_waypoint(Vec3::NEG_Z, 5, 120.0, &mut state).unwrap();
        // Every blocked endpoint is 3 units out; straight back is furthest from the threat
        assert_relative_eq!(waypoint.point.z, -3.0, epsilon = 1e-4);
        assert!(!waypoint.panic_triggered);
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        let agent = AgentPose::default();
        // Threat straight above: every flat endpoint is equally far from it
        let records = [threat_record(Vec3::new(0.0, 10.0, 0.0))];
        let config = EvasionConfig::default();
        let probe = ObstacleProbe::new(&agent, &records, &config, &NoObstacles);
        let mut state = EvasionState::default();

        let candidates = [RayProbe::clear(Vec3::X), RayProbe::clear(Vec3::Z), RayProbe::clear(Vec3::NEG_X)];
        let waypoint = probe.score_and_select(Vec3::Z, &candidates, &mut state).unwrap();
        assert_eq!(waypoint.point, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_empty_candidates_is_an_error() {
        let agent = AgentPose::default();
        let config = EvasionConfig::default();
        let probe = ObstacleProbe::new(&agent, &[], &config, &NoObstacles);
        let mut state = EvasionState::default();
        assert_eq!(
            probe.score_and_select(Vec3::Z, &[], &mut state),
            Err(EvasionError::NoCandidates)
        );
    }

    #[test]
    fn test_panic_recasts_once_and_resets() {
        let agent = AgentPose::default();
        let records = [threat_record(Vec3::new(0.0, 0.0, 5.0))];
        let config = EvasionConfig::default();
        let casts = Cell::new(0usize);
        // Walls everywhere, 1.5 away: endpoints land 0.5 from the agent
        let oracle = from_fn(|origin, direction, _options| {
            casts.set(casts.get() + 1);
            Ok(hit_at(origin, direction, 1.5))
        });
        let probe = ObstacleProbe::new(&agent, &records, &config, &oracle);
        let mut state = EvasionState::default();

        let waypoint = probe.compute_waypoint(Vec3::NEG_Z, 5, 120.0, &mut state).unwrap();
        assert!(waypoint.panic_triggered);
        assert_eq!(waypoint.rays_cast, 5 + 15);
        assert_eq!(casts.get(), 20);
        assert!(!state.panic_mode);
        assert_relative_eq!(waypoint.point.length(), 0.5, epsilon = 1e-4);
    }

    #[test]
    fn test_panic_fan_finds_gap_behind() {
        let agent = AgentPose::default();
        let records = [threat_record(Vec3::new(0.0, 0.0, -5.0))];
        let config = EvasionConfig::default();
        // Preferred heading is +Z but only -X is open
        let oracle = from_fn(|origin, direction, _options| {
            if direction.x < -0.95 {
                Ok(None)
            } else {
                Ok(hit_at(origin, direction, 1.2))
            }
        });
        let probe = ObstacleProbe::new(&agent, &records, &config, &oracle);
        let mut state = EvasionState::default();

        let waypoint = probe.compute_waypoint(Vec3::Z, 5, 120.0, &mut state).unwrap();
        assert!(waypoint.panic_triggered);
        assert!(waypoint.point.x < -4.5, "picked {}", waypoint.point);
        assert!(!state.panic_mode);
    }

    #[test]
    fn test_latched_state_accepts_without_recast() {
        let agent = AgentPose::default();
        let records = [threat_record(Vec3::new(0.0, 0.0, 5.0))];
        let config = EvasionConfig::default();
        let casts = Cell::new(0usize);
        let oracle = from_fn(|origin, direction, _options| {
            casts.set(casts.get() + 1);
            Ok(hit_at(origin, direction, 1.5))
        });
        let probe = ObstacleProbe::new(&agent, &records, &config, &oracle);
        let mut state = EvasionState {
            panic_mode: true,
            ..Default::default()
        };

        let waypoint = probe.compute_waypoint(Vec3::NEG_Z, 5, 120.0, &mut state).unwrap();
        assert!(!waypoint.panic_triggered);
        assert_eq!(casts.get(), 5);
        assert!(!state.panic_mode);
    }

    #[test]
    fn test_escalation_past_depth_bound_is_an_error() {
        let agent = AgentPose::default();
        let records = [threat_record(Vec3::new(0.0, 0.0, 5.0))];
        let config = EvasionConfig::default();
        let casts = Cell::new(0usize);
        let oracle = from_fn(|origin, direction, _options| {
            casts.set(casts.get() + 1);
            Ok(hit_at(origin, direction, 1.5))
        });
        let probe = ObstacleProbe::new(&agent, &records, &config, &oracle);
        let mut state = EvasionState::default();

        // A too-close pick with the latch released, already at the bound
        let candidates = [RayProbe::blocked(Vec3::NEG_Z, 1.5)];
        let result = probe.select_at_depth(Vec3::NEG_Z, &candidates, &mut state, MAX_ESCALATIONS);
        assert_eq!(result, Err(EvasionError::EscalationDepth(MAX_ESCALATIONS + 1)));
        assert_eq!(casts.get(), 0);
        assert!(!state.panic_mode);
    }

    #[test]
    fn test_backend_failure_counts_as_blocked() {
        let agent = AgentPose::default();
        let records = [threat_record(Vec3::new(0.0, 0.0, 5.0))];
        let config = EvasionConfig::default().with_minimum_escape_distance(0.0);
        // Straight back fails, everything else is clear
        let oracle = from_fn(|_origin, direction, _options| {
            if direction.z < -0.99 {
                Err(QueryError::Backend("lost connection".into()))
            } else {
                Ok(None)
            }
        });
        let probe = ObstacleProbe::new(&agent, &records, &config, &oracle);

        let probes = probe.cast_fan(Vec3::NEG_Z, 5, 120.0).unwrap();
        assert_eq!(probes[2].hit, Some(config.agent_radius));
        assert_eq!(probes.iter().filter(|p| p.is_clear()).count(), 4);

        let mut state = EvasionState::default();
        let waypoint = probe.compute_waypoint(Vec3::NEG_Z, 5, 120.0, &mut state).unwrap();
        assert_relative_eq!(waypoint.point.length(), 5.0, epsilon = 1e-4);
    }

    #[test]
    fn test_pose_radius_overrides_config() {
        let agent = AgentPose::default().with_radius(0.25);
        let config = EvasionConfig::default();
        let probe = ObstacleProbe::new(&agent, &[], &config, &NoObstacles);
        assert_eq!(probe.agent_radius(), 0.25);

        let bare = AgentPose::default();
        let probe = ObstacleProbe::new(&bare, &[], &config, &NoObstacles);
        assert_eq!(probe.agent_radius(), 1.0);
    }
}
