// firewatch_sim/src/lib.rs

use bevy::prelude::*;

// Import the plugins defined within the simulation crate.
use crate::simulation::core::simulation_setup::SimulationSetupPlugin;
use crate::simulation::plugins::coordinator::CoordinatorPlugin;
use crate::simulation::plugins::debugging::DebuggingPlugin;
use crate::simulation::plugins::device::DevicePlugin;
use crate::simulation::plugins::operator::OperatorPlugin;

// This prelude is for convenience for other files WITHIN the firewatch_sim crate.
pub mod prelude;

// This module contains all the simulation-specific logic.
pub mod cli;
pub mod simulation;

/// The main plugin that brings together all the simulation parts.
///
/// Expects a [`ScenarioConfig`](crate::simulation::config::ScenarioConfig)
/// resource and the bevy `StatesPlugin` to be present before it is added.
pub struct FirewatchSimulationPlugin;

impl Plugin for FirewatchSimulationPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            // Clock, PRNG, states and the schedule graph.
            SimulationSetupPlugin,
            // The simulated handset: ground-truth track plus a noisy provider.
            DevicePlugin,
            // Hosts the marker lifecycle coordinator and pumps it each frame.
            CoordinatorPlugin,
            // Replays the scripted operator actions.
            OperatorPlugin,
            DebuggingPlugin,
        ));
    }
}
