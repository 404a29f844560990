//! Evade AI - Reactive Threat Evasion
//!
//! Computes, once per tick, a single escape point an agent should move toward
//! to get away from threats without running into obstacles.
//!
//! # Pipeline
//!
//! ```text
//! threats ──▶ perception ──▶ steering ──▶ probe ──▶ escape point
//!            (range + FOV)   (blend)     (fan cast, score, panic)
//! ```
//!
//! - [`perception`]: keep threats within the awareness radius whose view cone
//!   contains the agent, nearest first.
//! - [`steering`]: blend one flee vector per threat, weighted by closeness.
//! - [`probe`]: sweep a fan of rays around that heading, prefer unobstructed
//!   rays, pick the endpoint furthest from the nearest threat, and recast a full
//!   circle once if the pick is too close to the agent.
//! - [`controller`]: owns the per-agent state and runs the above.
//!
//! # Example
//!
//! ```ignore
//! use evade_ai::prelude::*;
//! use evade_query::ObstacleField;
//!
//! let mut controller = EvasionController::new(EvasionConfig::default())?;
//! let obstacles = ObstacleField::new();
//!
//! // every tick
//! let agent = AgentPose::new(position, forward, 0.5);
//! if let TickOutcome::Evading(report) = controller.tick(&agent, &threats, &obstacles)? {
//!     nav_agent.set_destination(report.escape_point);
//! }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod perception;
pub mod probe;
pub mod steering;

pub mod prelude {
    pub use crate::config::EvasionConfig;
    pub use crate::controller::{compute_evasion, EvasionController, EvasionReport, EvasionState, TickOutcome};
    pub use crate::error::{EvasionError, Result};
    pub use crate::perception::{filter_threats, threat_sees, AgentPose, Threat, ThreatRecord};
    pub use crate::probe::{fan_directions, ObstacleProbe, RayProbe, Waypoint, PANIC_FOV_DEGREES};
    pub use crate::steering::{blend_escape_direction, preferred_direction, DEGENERATE_EPSILON};
}

pub use prelude::*;
