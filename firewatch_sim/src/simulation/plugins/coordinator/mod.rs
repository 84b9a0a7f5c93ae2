// firewatch_sim/src/simulation/plugins/coordinator/mod.rs

//! Hosts the marker lifecycle coordinator inside the bevy app.
//!
//! The coordinator is a plain resource. It is built once the handset exists,
//! receives operator commands, and is pumped every frame so that location
//! events, cooldowns and response teams advance with simulation time.

use bevy::prelude::*;

use crate::prelude::*;
use crate::simulation::config::SimulationSettings;
use crate::simulation::core::app_state::FinishSet;
use crate::simulation::core::events::OperatorCommand;
use crate::simulation::core::prng::SimulationRng;
use crate::simulation::plugins::debugging::ui::LoggingUi;
use crate::simulation::plugins::device::DeviceGeolocation;
use firewatch_core::config::SnapshotConfig;
use firewatch_core::prelude::{
    CoordinatorParts, DeviceTag, FileBackend, HandoffToken, InMemoryMap, LocationShare,
    MemoryBackend, SnapshotStore,
};
use firewatch_core::snapshot::open_file_store;

// =========================================================================
// == Resources ==
// =========================================================================

#[derive(Resource)]
pub struct Coordinator(pub MarkerLifecycleCoordinator);

/// A second handle onto the map the coordinator draws on, for inspection.
#[derive(Resource, Clone)]
pub struct MapRegistry(pub InMemoryMap);

/// Every share produced during the run, oldest first.
#[derive(Resource, Default, Debug)]
pub struct ShareLog(pub Vec<LocationShare>);

impl ShareLog {
    pub fn last_token(&self) -> Option<&HandoffToken> {
        self.0.last().map(|share| &share.token)
    }
}

// =========================================================================
// == Coordinator Plugin ==
// =========================================================================

pub struct CoordinatorPlugin;

impl Plugin for CoordinatorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ShareLog>()
            .add_systems(
                OnEnter(AppState::Loading),
                build_coordinator.in_set(LoadSet::Coordinator),
            )
            .add_systems(
                Update,
                (apply_operator_commands, pump_coordinator)
                    .chain()
                    .in_set(SimulationSet::Coordinator)
                    .run_if(in_state(AppState::Running)),
            )
            .add_systems(
                Update,
                finish_after_teardown
                    .in_set(SimulationSet::Reporting)
                    .run_if(in_state(AppState::Running)),
            )
            .add_systems(
                OnEnter(AppState::Finished),
                summarize_and_teardown.in_set(FinishSet::Teardown),
            );
    }
}

// =========================================================================
// == Loading ==
// =========================================================================

fn build_coordinator(
    mut commands: Commands,
    config: Res<ScenarioConfig>,
    device: Res<DeviceGeolocation>,
    clock: Res<SimClock>,
    mut rng: ResMut<SimulationRng>,
) {
    let coordinator_config = config.coordinator.clone();
    let store = open_store(&config.simulation, &coordinator_config.snapshot);
    let map = InMemoryMap::from_config(&coordinator_config.map);

    let parts = CoordinatorParts {
        source: Box::new(device.source()),
        map: Box::new(map.clone()),
        ui: Box::new(LoggingUi::default()),
        store,
        rng: Box::new(rng.fork()),
    };
    let mut coordinator = MarkerLifecycleCoordinator::new(coordinator_config, parts);
    coordinator.start(clock.epoch());
    info!(
        "[COORDINATOR] Started as device '{}' with {} map layers",
        coordinator.store().device(),
        map.layer_count()
    );

    commands.insert_resource(Coordinator(coordinator));
    commands.insert_resource(MapRegistry(map));
}

/// File-backed snapshots under the state directory. Falls back to an
/// in-memory store when the directory cannot be used.
fn open_store(settings: &SimulationSettings, snapshot: &SnapshotConfig) -> SnapshotStore {
    let backend = FileBackend::new(settings.state_dir.clone());
    let device = settings.device_tag.clone().map(DeviceTag::new);
    match open_file_store(backend, device, snapshot) {
        Ok(store) => {
            info!("Snapshots for '{}' kept under {:?}", store.device(), settings.state_dir);
            store
        }
        Err(e) => {
            warn!(
                "Snapshot storage at {:?} is unavailable ({}). Snapshots will not outlive this run.",
                settings.state_dir, e
            );
            SnapshotStore::new(
                Box::new(MemoryBackend::default()),
                DeviceTag::generate(),
                snapshot,
            )
        }
    }
}

// =========================================================================
// == Runtime Systems ==
// =========================================================================

/// Turns this frame's operator commands into coordinator calls.
fn apply_operator_commands(
    mut reader: EventReader<OperatorCommand>,
    mut coordinator: ResMut<Coordinator>,
    mut shares: ResMut<ShareLog>,
    time: Res<Time>,
    clock: Res<SimClock>,
) {
    let now = clock.now(&time);
    for OperatorCommand(action) in reader.read() {
        info!("[OPERATOR] t={:.1}s {:?}", time.elapsed_secs_f64(), action);
        let coordinator = &mut coordinator.0;

        let outcome = match action {
            OperatorAction::Locate => coordinator
                .locate(now)
                .map(|ticket| debug!("[COORDINATOR] locate request {:?} in flight", ticket)),
            OperatorAction::Report => coordinator
                .report(now)
                .map(|id| info!("[COORDINATOR] Fire report #{} filed", id)),
            OperatorAction::Refresh => coordinator.refresh(now),
            OperatorAction::ToggleHydrants => coordinator
                .toggle_hydrants()
                .map(|visible| debug!("[COORDINATOR] hydrants visible: {}", visible)),
            OperatorAction::ShareLocation => coordinator.share_location(now).map(|share| {
                match &share.link {
                    Some(link) => info!("[COORDINATOR] Share link: {}", link),
                    None => info!("[COORDINATOR] Share token: {}", share.token),
                }
                shares.0.push(share);
            }),
            OperatorAction::StartTracking => coordinator
                .start_tracking()
                .map(|handle| debug!("[COORDINATOR] tracking on {:?}", handle)),
            OperatorAction::StopTracking => {
                if !coordinator.stop_tracking() {
                    debug!("[COORDINATOR] no subscription to stop");
                }
                Ok(())
            }
            OperatorAction::SetVisibility { visible } => {
                coordinator.on_visibility_changed(*visible);
                Ok(())
            }
            OperatorAction::CallEmergency { confirmed } => {
                coordinator.call_emergency(*confirmed);
                Ok(())
            }
            OperatorAction::Help => {
                coordinator.show_help();
                Ok(())
            }
            OperatorAction::Resize => {
                coordinator.on_resize();
                Ok(())
            }
            OperatorAction::ReceiveHandoff { token } => coordinator
                .receive_handoff(token, now)
                .map(|snapshot| log_handoff(&snapshot.device_tag)),
            OperatorAction::ReceiveLastShare => match shares.last_token() {
                Some(token) => coordinator
                    .receive_handoff(token.as_str(), now)
                    .map(|snapshot| log_handoff(&snapshot.device_tag)),
                None => {
                    warn!("[OPERATOR] Nothing has been shared yet.");
                    Ok(())
                }
            },
            OperatorAction::Teardown => {
                coordinator.teardown();
                Ok(())
            }
        };

        if let Err(e) = outcome {
            warn!("[OPERATOR] {:?} refused: {}", action, e);
        }
    }
}

fn log_handoff(device_tag: &str) {
    debug!("[COORDINATOR] showing handoff from {}", device_tag);
}

/// Drains location events and runs the coordinator's timers.
fn pump_coordinator(
    mut coordinator: ResMut<Coordinator>,
    time: Res<Time>,
    clock: Res<SimClock>,
) {
    coordinator.0.pump(clock.now(&time));
}

/// A scripted teardown ends the run.
fn finish_after_teardown(
    coordinator: Res<Coordinator>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if coordinator.0.is_torn_down() {
        info!("[COORDINATOR] Torn down by the operator.");
        next_state.set(AppState::Finished);
    }
}

// =========================================================================
// == Finish ==
// =========================================================================

fn summarize_and_teardown(
    mut coordinator: ResMut<Coordinator>,
    map: Res<MapRegistry>,
    device: Res<DeviceGeolocation>,
    shares: Res<ShareLog>,
) {
    let coordinator = &mut coordinator.0;
    let stats = coordinator.stats();
    info!("[SUMMARY] Session phase: {:?}", coordinator.phase());
    info!(
        "[SUMMARY] Handset fixes: {}, dropped events: {}",
        device.fixes_produced(),
        stats.dropped_events
    );
    info!(
        "[SUMMARY] Hazard regenerations: {}, active hazards: {}, response teams on map: {}",
        stats.hazard_regenerations,
        coordinator.active_hazards().len(),
        coordinator.response_markers().len()
    );
    info!(
        "[SUMMARY] Snapshot writes: {} ({} failed), shares: {}",
        stats.snapshot_writes,
        stats.snapshot_write_failures,
        shares.0.len()
    );
    if let Some(user) = coordinator.user_marker() {
        let truth = device.ground_truth();
        info!(
            "[SUMMARY] Last fix {} (±{:.0} m), true position {:?}",
            user.position.location(),
            user.position.accuracy_meters(),
            truth
        );
    }

    coordinator.teardown();
    info!("[SUMMARY] Map layers after teardown: {}", map.0.layer_count());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::config::parse_scenario;
    use crate::FirewatchSimulationPlugin;
    use bevy::state::app::StatesPlugin;

    fn run_to_exit(config: ScenarioConfig) -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin))
            .insert_resource(config)
            .add_plugins(FirewatchSimulationPlugin);

        for _ in 0..2_000 {
            app.update();
            if app.should_exit().is_some() {
                break;
            }
        }
        assert!(app.should_exit().is_some(), "scenario never finished");
        app
    }

    fn scenario(text: &str, dir: &tempfile::TempDir) -> ScenarioConfig {
        let mut config = parse_scenario(text).expect("scenario parses");
        config.simulation.state_dir = dir.path().join("state");
        config.simulation.catalog_dir = dir.path().join("no-catalog");
        config
    }

    #[test]
    fn test_patrol_locates_reports_and_shares() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = scenario(
            r#"
            [simulation]
            seed = 11
            duration_seconds = 20.0
            device_tag = "engine-4"

            [[operator]]
            at_secs = 1.0
            kind = "Locate"

            [[operator]]
            at_secs = 5.0
            kind = "Report"

            [[operator]]
            at_secs = 8.0
            kind = "ShareLocation"

            [[operator]]
            at_secs = 9.0
            kind = "ReceiveLastShare"
            "#,
            &dir,
        );
        let app = run_to_exit(config);
        let world = app.world();

        let coordinator = &world.resource::<Coordinator>().0;
        assert!(coordinator.is_torn_down());
        let stats = coordinator.stats();
        assert!(stats.hazard_regenerations >= 1);
        // The locate, the report and every tracking fix are persisted.
        assert!(stats.snapshot_writes >= 3);
        assert_eq!(stats.snapshot_write_failures, 0);

        let shares = world.resource::<ShareLog>();
        assert_eq!(shares.0.len(), 1);
        assert_eq!(shares.0[0].snapshot.device_tag, "engine-4");

        assert_eq!(world.resource::<MapRegistry>().0.layer_count(), 0);
        assert!(world.resource::<DeviceGeolocation>().fixes_produced() > 10);

        let backend = FileBackend::new(dir.path().join("state"));
        assert!(backend.path_for("firewatch.location:engine-4").exists());
    }

    #[test]
    fn test_operator_teardown_ends_the_run_early() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = scenario(
            r#"
            [simulation]
            seed = 3
            duration_seconds = 600.0

            [[operator]]
            at_secs = 2.0
            kind = "Teardown"
            "#,
            &dir,
        );
        let app = run_to_exit(config);
        let elapsed = app.world().resource::<Time>().elapsed_secs_f64();
        assert!(elapsed < 10.0, "run lasted {elapsed}s");
        assert!(app.world().resource::<Coordinator>().0.is_torn_down());
    }

    #[test]
    fn test_denied_handset_never_places_a_marker() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = scenario(
            r#"
            [simulation]
            seed = 5
            duration_seconds = 10.0

            [device]
            permission = "Denied"

            [[operator]]
            at_secs = 1.0
            kind = "Locate"

            [[operator]]
            at_secs = 4.0
            kind = "Report"
            "#,
            &dir,
        );
        let app = run_to_exit(config);
        let coordinator = &app.world().resource::<Coordinator>().0;
        assert_eq!(coordinator.stats().snapshot_writes, 0);
        assert!(app.world().resource::<ShareLog>().0.is_empty());
    }

    #[test]
    fn test_unusable_state_dir_falls_back_to_memory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("state");
        std::fs::write(&blocker, "not a directory").expect("write file");
        let settings = SimulationSettings {
            state_dir: blocker,
            device_tag: Some("engine-4".to_string()),
            ..SimulationSettings::default()
        };

        let mut store = open_store(&settings, &SnapshotConfig::default());
        assert_ne!(store.device().as_str(), "engine-4");
        let snapshot = firewatch_core::snapshot::LocationSnapshot {
            latitude: 14.2833,
            longitude: 121.4194,
            accuracy_meters: 15.0,
            approximate_address: "12 P. Guevarra St.".to_string(),
            captured_at: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
            device_tag: store.device().to_string(),
        };
        store.write(&snapshot);
        assert_eq!(store.failed_writes(), 0);
        assert_eq!(store.read_latest(), Some(snapshot));
    }
}
