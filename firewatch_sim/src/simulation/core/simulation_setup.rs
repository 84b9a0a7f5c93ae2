// firewatch_sim/src/simulation/core/simulation_setup.rs

use std::time::Duration;

use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::prelude::*;
use crate::simulation::config::load_hydrant_catalog;
use crate::simulation::core::app_state::FinishSet;
use crate::simulation::core::events::OperatorCommand;
use crate::simulation::core::prng::SimulationRng;

pub struct SimulationSetupPlugin;

impl Plugin for SimulationSetupPlugin {
    fn build(&self, app: &mut App) {
        // This plugin's job is to read the config and add resources and startup systems.
        let config = match app.world().get_resource::<ScenarioConfig>() {
            Some(config) => config.clone(),
            None => {
                warn!("No ScenarioConfig resource found, running the default scenario.");
                let config = ScenarioConfig::default();
                app.insert_resource(config.clone());
                config
            }
        };

        // --- 1. Add the Deterministic PRNG Resource ---
        let rng = match config.simulation.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        app.insert_resource(SimulationRng(rng));

        // --- 2. Deterministic Time ---
        // Every frame advances virtual time by exactly one period, regardless of
        // how long the frame took to compute.
        let frame = Duration::from_secs_f64(1.0 / config.simulation.frame_rate_hz);
        app.insert_resource(TimeUpdateStrategy::ManualDuration(frame))
            .insert_resource(Time::<Virtual>::from_max_delta(
                frame.max(Duration::from_millis(250)),
            ))
            .insert_resource(SimClock::new(config.simulation.epoch));

        // --- INITIALIZE STATES & EVENTS ---
        app.init_state::<AppState>()
            .add_event::<OperatorCommand>();

        // --- CONFIGURE THE LOADING PIPELINE ---
        app.configure_sets(
            OnEnter(AppState::Loading),
            (
                LoadSet::Catalog,
                LoadSet::Device,
                LoadSet::Coordinator,
                LoadSet::Transition,
            )
                .chain(),
        );
        app.add_systems(
            OnEnter(AppState::Loading),
            (
                apply_hydrant_catalog.in_set(LoadSet::Catalog),
                transition_to_running.in_set(LoadSet::Transition),
            ),
        );

        // Configure the runtime schedule graph.
        app.configure_sets(
            Update,
            (
                SimulationSet::Operator,
                SimulationSet::Device,
                SimulationSet::Coordinator,
                SimulationSet::Reporting,
            )
                .chain(), // .chain() enforces the order of the tuples/sets
        );
        app.add_systems(
            Update,
            finish_when_elapsed
                .in_set(SimulationSet::Reporting)
                .run_if(in_state(AppState::Running)),
        );

        app.configure_sets(
            OnEnter(AppState::Finished),
            (FinishSet::Teardown, FinishSet::Exit).chain(),
        );
        app.add_systems(OnEnter(AppState::Finished), exit_app.in_set(FinishSet::Exit));
    }
}

/// Replaces the coordinator's hydrant registry with the on-disk catalog when
/// the catalog has any entries.
fn apply_hydrant_catalog(mut config: ResMut<ScenarioConfig>) {
    let dir = config.simulation.catalog_dir.clone();
    match load_hydrant_catalog(&dir) {
        Ok(hydrants) if hydrants.is_empty() => {
            debug!(
                "Hydrant catalog is empty, keeping {} configured hydrants",
                config.coordinator.hydrants.len()
            );
        }
        Ok(hydrants) => {
            info!("Hydrant registry: {} entries from {:?}", hydrants.len(), dir);
            config.coordinator.hydrants = hydrants;
        }
        Err(e) => {
            error!("{e}. Keeping the configured hydrant registry.");
        }
    }
}

fn transition_to_running(mut next_state: ResMut<NextState<AppState>>) {
    info!("[SETUP] Loading complete. Transitioning to Running state.");
    next_state.set(AppState::Running);
}

fn finish_when_elapsed(
    time: Res<Time>,
    config: Res<ScenarioConfig>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if time.elapsed_secs_f64() >= config.simulation.duration_seconds {
        info!(
            "[SETUP] Scenario duration of {:.1}s reached.",
            config.simulation.duration_seconds
        );
        next_state.set(AppState::Finished);
    }
}

fn exit_app(mut exit: EventWriter<AppExit>) {
    exit.write(AppExit::Success);
}
