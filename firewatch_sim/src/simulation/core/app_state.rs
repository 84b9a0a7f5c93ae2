// firewatch_sim/src/simulation/core/app_state.rs

use bevy::{ecs::schedule::SystemSet, prelude::States};

/// Defines the major phases of the application's lifecycle.
#[derive(States, Debug, Clone, Eq, PartialEq, Hash, Default)]
pub enum AppState {
    /// The initial state. The catalog is read and the coordinator is built.
    #[default]
    Loading,

    /// The operator script and the handset are live.
    Running,

    /// The run is over. The coordinator is torn down and the app exits.
    Finished,
}

/// System sets to control the order of execution during the Loading state.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum LoadSet {
    /// Stage 1: Merge the hydrant catalog into the coordinator config.
    Catalog,
    /// Stage 2: Build the simulated handset.
    Device,
    /// Stage 3: Wire the coordinator to the handset, map, UI and store, then start it.
    Coordinator,
    /// Stage 4: Hand over to `Running`.
    Transition,
}

// =========================================================================
// == Per-Frame Sets ==
// =========================================================================

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Fires operator actions whose time has come.
    Operator,
    /// Advances the handset: resolves one-shot requests and emits watch fixes.
    Device,
    /// Applies operator commands, then drains location events into the coordinator.
    Coordinator,
    /// Periodic summaries and the end-of-run check. Runs last.
    Reporting,
}

/// Ordering inside `OnEnter(AppState::Finished)`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum FinishSet {
    Teardown,
    Exit,
}
