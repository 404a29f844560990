//! Per-agent evasion controller

use crate::config::EvasionConfig;
use crate::error::Result;
use crate::perception::{filter_threats, AgentPose, Threat, ThreatRecord};
use crate::probe::ObstacleProbe;
use crate::steering::{blend_escape_direction, preferred_direction};
use evade_math::Vec3;
use evade_query::RayOracle;
use serde::{Deserialize, Serialize};

/// Evasion state that outlives a tick. One per agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EvasionState {
    /// Panic latch. Only the escalation protocol in [`ObstacleProbe`] touches it.
    pub panic_mode: bool,
    /// Most recent escape point, kept through idle ticks
    pub last_escape_point: Option<Vec3>,
}

/// What one evading tick computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvasionReport {
    /// Threats that triggered the evasion, nearest first
    pub threats: Vec<ThreatRecord>,
    /// Heading before obstacle probing
    pub preferred: Vec3,
    /// Rays cast this tick
    pub rays_cast: usize,
    /// Chosen escape point
    pub escape_point: Vec3,
    /// Whether the panic fan was needed
    pub panic_triggered: bool,
}

/// Outcome of a tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No threat in range and looking; the previous escape point stands
    Idle,
    /// A new escape point was computed
    Evading(EvasionReport),
}

impl TickOutcome {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn report(&self) -> Option<&EvasionReport> {
        match self {
            Self::Idle => None,
            Self::Evading(report) => Some(report),
        }
    }
}

/// Run one evasion tick against explicit state.
///
/// The config is validated first, so an even ray count is cast as the next
/// odd one. Returns the new escape point, or `None` when no threat needs
/// evading (the state keeps its previous escape point).
pub fn compute_evasion(
    agent: &AgentPose,
    threats: &[Threat],
    config: &EvasionConfig,
    oracle: &dyn RayOracle,
    state: &mut EvasionState,
) -> Result<Option<Vec3>> {
    let config = config.clone().validate()?;
    Ok(evade(agent, threats, &config, oracle, state)?.map(|report| report.escape_point))
}

fn evade(
    agent: &AgentPose,
    threats: &[Threat],
    config: &EvasionConfig,
    oracle: &dyn RayOracle,
    state: &mut EvasionState,
) -> Result<Option<EvasionReport>> {
    let records = filter_threats(agent, threats, config.awareness_radius, config.fov_degrees);
    if records.is_empty() {
        return Ok(None);
    }

    let blended = blend_escape_direction(agent.position, &records, config.awareness_radius)?;
    let preferred = preferred_direction(blended, agent.forward);

    let probe = ObstacleProbe::new(agent, &records, config, oracle);
    let waypoint = probe.compute_waypoint(preferred, config.num_rays, config.fov_degrees, state)?;
    state.last_escape_point = Some(waypoint.point);

    log::debug!(
        "Evading {} threat(s): heading {}, escape point {}{}",
        records.len(),
        preferred,
        waypoint.point,
        if waypoint.panic_triggered { " (panic)" } else { "" }
    );

    Ok(Some(EvasionReport {
        threats: records,
        preferred,
        rays_cast: waypoint.rays_cast,
        escape_point: waypoint.point,
        panic_triggered: waypoint.panic_triggered,
    }))
}

/// Evasion controller owning an agent's config and state
#[derive(Debug, Clone)]
pub struct EvasionController {
    config: EvasionConfig,
    state: EvasionState,
}

impl EvasionController {
    /// Create a controller, validating the config
    pub fn new(config: EvasionConfig) -> Result<Self> {
        Ok(Self {
            config: config.validate()?,
            state: EvasionState::default(),
        })
    }

    /// Run one tick
    pub fn tick(&mut self, agent: &AgentPose, threats: &[Threat], oracle: &dyn RayOracle) -> Result<TickOutcome> {
        let report = evade(agent, threats, &self.config, oracle, &mut self.state)?;
        Ok(report.map_or(TickOutcome::Idle, TickOutcome::Evading))
    }

    /// Current escape point, if one was ever computed
    pub fn escape_point(&self) -> Option<Vec3> {
        self.state.last_escape_point
    }

    /// Whether the panic latch is set. Always false between ticks.
    pub fn is_panicking(&self) -> bool {
        self.state.panic_mode
    }

    pub fn state(&self) -> &EvasionState {
        &self.state
    }

    pub fn config(&self) -> &EvasionConfig {
        &self.config
    }

    /// Forget the escape point and release the panic latch
    pub fn reset(&mut self) {
        self.state = EvasionState::default();
    }
}
