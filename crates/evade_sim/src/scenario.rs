//! Scenario files
//!
//! A scenario is a TOML document describing the evasion config, the agent,
//! the threats and the obstacle course:
//!
//! ```toml
//! [sim]
//! ticks = 60
//! dt = 0.1
//! backend = "rapier"  # analytic, rapier
//!
//! [evasion]
//! awareness_radius = 10.0
//! num_rays = 5
//!
//! [agent]
//! position = { x = 0.0, y = 0.0, z = 0.0 }
//! forward = { x = 0.0, y = 0.0, z = 1.0 }
//!
//! [[threats]]
//! id = 1
//! position = { x = 0.0, y = 0.0, z = 6.0 }
//! forward = { x = 0.0, y = 0.0, z = -1.0 }
//!
//! [[obstacles]]
//! shape = "sphere"
//! center = { x = 0.0, y = 0.0, z = -3.0 }
//! radius = 1.0
//! ```
//!
//! The `EVADE_BACKEND` environment variable overrides `sim.backend`.

use evade_ai::{AgentPose, EvasionConfig, EvasionError, Threat};
use evade_query::Obstacle;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors while loading or running a scenario
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    #[error("Evasion failed: {0}")]
    Evasion(#[from] EvasionError),
}

/// Obstacle query backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Analytic sphere/box list
    #[default]
    Analytic,
    /// rapier3d query pipeline
    Rapier,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Analytic => write!(f, "analytic"),
            Self::Rapier => write!(f, "rapier"),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "analytic" | "field" => Ok(Self::Analytic),
            "rapier" | "physics" => Ok(Self::Rapier),
            _ => Err(ScenarioError::UnknownBackend(s.to_string())),
        }
    }
}

/// Simulation loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Ticks to run
    pub ticks: u32,
    /// Seconds per tick
    pub dt: f32,
    /// Agent speed toward its escape point (units/s)
    pub agent_speed: f32,
    /// Threat pursuit speed (units/s). Zero keeps threats still.
    pub threat_speed: f32,
    pub backend: Backend,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            ticks: 30,
            dt: 0.1,
            agent_speed: 4.0,
            threat_speed: 0.0,
            backend: Backend::default(),
        }
    }
}

/// A complete scenario
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub sim: SimSettings,
    #[serde(default)]
    pub evasion: EvasionConfig,
    #[serde(default)]
    pub agent: AgentPose,
    #[serde(default)]
    pub threats: Vec<Threat>,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
}

impl Scenario {
    /// Load a scenario file, then apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut scenario = Self::from_toml(&content)?;
        if let Ok(backend) = std::env::var("EVADE_BACKEND") {
            scenario.sim.backend = backend.parse()?;
            log::info!("Backend from env: {}", scenario.sim.backend);
        }
        Ok(scenario)
    }

    /// Parse a scenario from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(content)?)
    }

    /// Log what is about to run
    pub fn print_summary(&self) {
        log::info!("=== Scenario ===");
        log::info!("  Backend:   {}", self.sim.backend);
        log::info!("  Ticks:     {} x {}s", self.sim.ticks, self.sim.dt);
        log::info!("  Agent:     {}", self.agent.position);
        log::info!("  Threats:   {}", self.threats.len());
        log::info!("  Obstacles: {}", self.obstacles.len());
        log::info!(
            "  Fan:       {} rays over {} degrees, panic {} rays",
            self.evasion.num_rays,
            self.evasion.fov_degrees,
            self.evasion.panic_rays
        );
    }
}
