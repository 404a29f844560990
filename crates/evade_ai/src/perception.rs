//! Threat perception: which threats matter this tick

use evade_math::{angle_between, Vec3};
use serde::{Deserialize, Serialize};

/// The evading agent's pose for one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentPose {
    /// World position
    pub position: Vec3,
    /// Facing direction (unit)
    pub forward: Vec3,
    /// Body radius. Zero defers to the configured radius.
    #[serde(default)]
    pub radius: f32,
}

impl AgentPose {
    pub fn new(position: Vec3, forward: Vec3, radius: f32) -> Self {
        Self { position, forward, radius }
    }

    /// Agent at `position` facing +Z
    pub fn at(position: Vec3) -> Self {
        Self::new(position, Vec3::Z, 0.0)
    }

    pub fn with_forward(mut self, forward: Vec3) -> Self {
        self.forward = forward;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }
}

impl Default for AgentPose {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

/// Snapshot of a threat entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threat {
    /// Host identifier, carried through for reporting
    #[serde(default)]
    pub id: u64,
    /// World position
    pub position: Vec3,
    /// Facing direction
    pub forward: Vec3,
}

impl Threat {
    pub fn new(id: u64, position: Vec3, forward: Vec3) -> Self {
        Self { id, position, forward }
    }

    /// Threat at `position` looking straight at `target`
    pub fn facing(id: u64, position: Vec3, target: Vec3) -> Self {
        Self::new(id, position, (target - position).normalize())
    }
}

/// A threat that passed the filter, with its distance to the agent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreatRecord {
    pub threat: Threat,
    pub distance: f32,
}

impl ThreatRecord {
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.threat.position
    }
}

/// Whether `agent_position` lies inside the threat's view cone.
///
/// The cone has half-angle `fov_degrees / 2` around `threat.forward`, edges
/// included. A zero-length forward or a threat standing on the agent counts
/// as seeing it.
pub fn threat_sees(agent_position: Vec3, threat: &Threat, fov_degrees: f32) -> bool {
    let to_agent = agent_position - threat.position;
    angle_between(to_agent, threat.forward) <= fov_degrees * 0.5
}

/// Threats within `awareness_radius` that can see the agent, nearest first.
///
/// Equal distances keep their input order.
pub fn filter_threats(
    agent: &AgentPose,
    threats: &[Threat],
    awareness_radius: f32,
    fov_degrees: f32,
) -> Vec<ThreatRecord> {
    let mut records: Vec<ThreatRecord> = threats
        .iter()
        .filter_map(|threat| {
            let distance = agent.position.distance(threat.position);
            if distance < awareness_radius && threat_sees(agent.position, threat, fov_degrees) {
                Some(ThreatRecord { threat: *threat, distance })
            } else {
                None
            }
        })
        .collect();

    // sort_by is stable
    records.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    log::trace!(
        "{} of {} threats in range and looking at the agent",
        records.len(),
        threats.len()
    );
    records
}
