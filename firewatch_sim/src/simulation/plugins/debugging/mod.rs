// firewatch_sim/src/simulation/plugins/debugging/mod.rs

use bevy::prelude::*;

// --- Sub-modules for organization ---
mod systems;
pub mod ui;

pub use systems::SummaryTimer;

use crate::prelude::{AppState, ScenarioConfig, SimulationSet};

/// A top-level plugin that brings in the run's diagnostic logging.
pub struct DebuggingPlugin;

impl Plugin for DebuggingPlugin {
    fn build(&self, app: &mut App) {
        let interval = app
            .world()
            .get_resource::<ScenarioConfig>()
            .map(|config| config.simulation.summary_interval_seconds)
            .unwrap_or_default();

        app.insert_resource(SummaryTimer::every(interval))
            // --- Add the runtime systems ---
            .add_systems(
                Update,
                (systems::log_fix_error, systems::log_periodic_summary)
                    .in_set(SimulationSet::Reporting)
                    .run_if(in_state(AppState::Running)),
            );
    }
}
