//! Evasion sandbox
//!
//! Loads a TOML scenario, then steps an evading agent through it and logs
//! every tick.
//!
//! Run with: cargo run -p evade_sim -- crates/evade_sim/scenarios/ambush.toml
//!
//! `RUST_LOG=debug` (or `trace`) shows the probe's fan and panic decisions.

mod scenario;
mod sim;

use scenario::Scenario;
use sim::Simulation;

const DEFAULT_SCENARIO: &str = "crates/evade_sim/scenarios/ambush.toml";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // First non-flag argument is the scenario path
    let path = std::env::args()
        .skip(1)
        .find(|arg| !arg.starts_with("--"))
        .unwrap_or_else(|| DEFAULT_SCENARIO.to_string());

    if let Err(e) = run(&path) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(path: &str) -> Result<(), scenario::ScenarioError> {
    log::info!("Loading scenario {}", path);
    let scenario = Scenario::load(path)?;
    scenario.print_summary();

    let mut sim = Simulation::new(scenario)?;
    let summary = sim.run()?;

    log::info!("=== Done ===");
    log::info!(
        "  {} ticks, {} evading, {} panicked, {} rays",
        summary.ticks,
        summary.evading_ticks,
        summary.panic_ticks,
        summary.rays_cast
    );
    if let Some(closest) = summary.closest_approach {
        log::info!("  Closest threat approach: {:.2}", closest);
    }
    log::info!("  Final agent position: {}", sim.agent().position);
    Ok(())
}
