// firewatch_sim/examples/01_patrol_scenario.rs

//! A headless end-to-end run of the fire-hazard map widget.
//!
//! This example demonstrates how to:
//! 1. Load a scenario from a TOML file named on the command line.
//! 2. Set up a headless Bevy application with deterministic time.
//! 3. Add the main `FirewatchSimulationPlugin`, which hosts the coordinator,
//!    the simulated handset and the operator script.
//!
//! To run this example:
//! `cargo run -p firewatch_sim --example 01_patrol_scenario -- --scenario assets/scenarios/santa_cruz_patrol.toml`

use std::time::Duration;

use bevy::{app::ScheduleRunnerPlugin, log::LogPlugin, prelude::*, state::app::StatesPlugin};
use clap::Parser;

use firewatch_sim::cli::Cli;
use firewatch_sim::simulation::config::load_scenario;
use firewatch_sim::FirewatchSimulationPlugin;

fn main() -> AppExit {
    let cli = Cli::parse();

    // --- 1. Load Simulation Configuration ---
    let config = match load_scenario(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Could not start the scenario: {e}");
            return AppExit::error();
        }
    };

    let mut app = App::new();

    // --- 2. Add Core Bevy Plugins & Resources ---
    app.add_plugins((
        // No window and no renderer. Frames run back to back; simulation time
        // advances by a fixed step per frame regardless.
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)),
        LogPlugin {
            level: bevy::log::Level::INFO,
            // A good filter for focusing on our crates' logs during development.
            filter: "info,firewatch_sim=debug,firewatch_core=debug".to_string(),
            ..default()
        },
        StatesPlugin,
    ))
    // Insert the loaded configuration as a Bevy resource so all systems can access it.
    .insert_resource(config)
    .insert_resource(cli);

    // --- 3. Add the Main Firewatch Simulation Plugin ---
    app.add_plugins(FirewatchSimulationPlugin);

    // --- 4. Run the App ---
    info!("Starting Firewatch simulation...");
    app.run()
}
