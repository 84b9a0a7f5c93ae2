// firewatch_sim/src/simulation/plugins/device/mod.rs

pub mod geolocation;
pub mod track;

use bevy::prelude::*;

use crate::prelude::*;
use crate::simulation::core::prng::SimulationRng;
pub use geolocation::{DeviceGeolocation, SimulatedLocationSource};
pub use track::GroundTruthTrack;

// =========================================================================
// == Device Plugin ==
// =========================================================================

pub struct DevicePlugin;

impl Plugin for DevicePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(AppState::Loading),
            spawn_device.in_set(LoadSet::Device),
        )
        .add_systems(
            Update,
            device_geolocation_system
                .in_set(SimulationSet::Device)
                .run_if(in_state(AppState::Running)),
        );
    }
}

/// Builds the simulated handset from the scenario.
fn spawn_device(
    mut commands: Commands,
    config: Res<ScenarioConfig>,
    clock: Res<SimClock>,
    mut rng: ResMut<SimulationRng>,
) {
    let device = &config.device;
    info!(
        "  -> Spawning handset: supported={}, permission={:?}, {} waypoints, {} outages",
        device.supported,
        device.permission,
        device.track.len(),
        device.outages.len()
    );
    commands.insert_resource(DeviceGeolocation::new(
        device.clone(),
        rng.fork(),
        clock.epoch(),
    ));
}

/// Runs every frame: resolves due one-shot requests and ticks the watch.
fn device_geolocation_system(
    device: Res<DeviceGeolocation>,
    time: Res<Time>,
    clock: Res<SimClock>,
) {
    device.advance(clock.now(&time), time.elapsed(), time.delta());
}
