//! Fixed-step evasion loop

use crate::scenario::{Backend, Scenario, ScenarioError, SimSettings};
use evade_ai::{AgentPose, EvasionController, Threat, TickOutcome};
use evade_math::Vec3;
use evade_query::{ObstacleField, RapierObstacles, RayOracle};

/// Below this a move is skipped and headings are left alone
const MIN_STEP: f32 = 1e-4;

/// What happened in one simulated tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    pub tick: u32,
    /// Agent position after moving
    pub agent: Vec3,
    pub outcome: TickOutcome,
    /// Distance to the closest threat after moving
    pub nearest_threat: Option<f32>,
}

/// Totals over a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub ticks: u32,
    pub evading_ticks: u32,
    pub panic_ticks: u32,
    pub rays_cast: usize,
    pub closest_approach: Option<f32>,
}

/// One agent, its threats and an obstacle backend
pub struct Simulation {
    controller: EvasionController,
    agent: AgentPose,
    threats: Vec<Threat>,
    oracle: Box<dyn RayOracle>,
    settings: SimSettings,
    tick: u32,
}

impl Simulation {
    pub fn new(scenario: Scenario) -> Result<Self, ScenarioError> {
        let field = ObstacleField::from_obstacles(scenario.obstacles);
        let oracle: Box<dyn RayOracle> = match scenario.sim.backend {
            Backend::Analytic => Box::new(field),
            Backend::Rapier => Box::new(RapierObstacles::from_field(&field)),
        };

        Ok(Self {
            controller: EvasionController::new(scenario.evasion)?,
            agent: scenario.agent,
            threats: scenario.threats,
            oracle,
            settings: scenario.sim,
            tick: 0,
        })
    }

    pub fn agent(&self) -> &AgentPose {
        &self.agent
    }

    pub fn threats(&self) -> &[Threat] {
        &self.threats
    }

    pub fn controller(&self) -> &EvasionController {
        &self.controller
    }

    /// Run the evasion tick, then move the agent and the threats
    pub fn step(&mut self) -> Result<TickSummary, ScenarioError> {
        let outcome = self.controller.tick(&self.agent, &self.threats, self.oracle.as_ref())?;

        // Idle ticks keep heading for the last escape point
        if let Some(target) = self.controller.escape_point() {
            let reach = self.settings.agent_speed * self.settings.dt;
            if let Some(heading) = advance(&mut self.agent.position, target, reach) {
                self.agent.forward = heading;
            }
        }

        let reach = self.settings.threat_speed * self.settings.dt;
        if reach > 0.0 {
            let prey = self.agent.position;
            for threat in &mut self.threats {
                if let Some(heading) = advance(&mut threat.position, prey, reach) {
                    threat.forward = heading;
                }
            }
        }

        self.tick += 1;
        Ok(TickSummary {
            tick: self.tick,
            agent: self.agent.position,
            outcome,
            nearest_threat: self.nearest_threat(),
        })
    }

    /// Step `settings.ticks` times
    pub fn run(&mut self) -> Result<RunSummary, ScenarioError> {
        let mut summary = RunSummary::default();

        for _ in 0..self.settings.ticks {
            let tick = self.step()?;
            log_tick(&tick);

            summary.ticks += 1;
            if let Some(report) = tick.outcome.report() {
                summary.evading_ticks += 1;
                summary.rays_cast += report.rays_cast;
                if report.panic_triggered {
                    summary.panic_ticks += 1;
                }
            }
            if let Some(distance) = tick.nearest_threat {
                summary.closest_approach = Some(summary.closest_approach.map_or(distance, |d| d.min(distance)));
            }
        }

        Ok(summary)
    }

    fn nearest_threat(&self) -> Option<f32> {
        self.threats
            .iter()
            .map(|t| t.position.distance(self.agent.position))
            .min_by(f32::total_cmp)
    }
}

/// Move `position` up to `reach` toward `target` on the ground plane.
///
/// Returns the flat heading taken, or `None` if already there.
fn advance(position: &mut Vec3, target: Vec3, reach: f32) -> Option<Vec3> {
    let offset = (target - *position).flatten();
    let distance = offset.length();
    if distance < MIN_STEP || reach <= 0.0 {
        return None;
    }

    let heading = offset / distance;
    *position += heading * reach.min(distance);
    Some(heading)
}

fn log_tick(tick: &TickSummary) {
    let nearest = tick
        .nearest_threat
        .map_or_else(|| "-".to_string(), |d| format!("{:.2}", d));

    match tick.outcome.report() {
        None => log::info!("[{:>3}] idle     agent {} nearest {}", tick.tick, tick.agent, nearest),
        Some(report) => log::info!(
            "[{:>3}] {} agent {} nearest {} -> {} ({} threat(s), {} rays)",
            tick.tick,
            if report.panic_triggered { "PANIC   " } else { "evading " },
            tick.agent,
            nearest,
            report.escape_point,
            report.threats.len(),
            report.rays_cast
        ),
    }
}
