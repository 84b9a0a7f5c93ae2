// firewatch_sim/src/simulation/plugins/debugging/systems.rs

use bevy::prelude::*;
use std::time::Duration;

use crate::prelude::Timestamp;
use crate::simulation::plugins::coordinator::{Coordinator, MapRegistry};
use crate::simulation::plugins::device::DeviceGeolocation;
use firewatch_core::geo::haversine_meters;

/// Paces the periodic summary line. `None` disables it.
#[derive(Resource, Debug)]
pub struct SummaryTimer(pub Option<Timer>);

impl SummaryTimer {
    pub fn every(seconds: f64) -> Self {
        let timer = (seconds > 0.0)
            .then(|| Duration::try_from_secs_f64(seconds).ok())
            .flatten()
            .map(|period| Timer::new(period, TimerMode::Repeating));
        Self(timer)
    }
}

/// Logs how far each newly applied fix is from where the handset truly is.
pub fn log_fix_error(
    coordinator: Res<Coordinator>,
    device: Res<DeviceGeolocation>,
    mut last_logged: Local<Option<Timestamp>>,
) {
    let Some(user) = coordinator.0.user_marker() else {
        return;
    };
    let captured_at = user.position.captured_at();
    if *last_logged == Some(captured_at) {
        return;
    }
    *last_logged = Some(captured_at);

    let Some(truth) = device.ground_truth() else {
        return;
    };
    let error_m = haversine_meters(truth, user.position.location());
    debug!(
        "[Debug] Fix error: {:.1} m (claimed accuracy {:.0} m)",
        error_m,
        user.position.accuracy_meters()
    );
    if error_m > user.position.accuracy_meters() * 3.0 {
        warn!(
            "[Debug] Fix is {:.1} m off, well outside its claimed accuracy.",
            error_m
        );
    }
}

pub fn log_periodic_summary(
    time: Res<Time>,
    mut timer: ResMut<SummaryTimer>,
    coordinator: Res<Coordinator>,
    map: Res<MapRegistry>,
) {
    let Some(timer) = timer.0.as_mut() else {
        return;
    };
    timer.tick(time.delta());
    if !timer.just_finished() {
        return;
    }

    let coordinator = &coordinator.0;
    info!(
        "[Debug] t={:.0}s phase={:?} hazards={} response teams={} map layers={} subscription={:?}",
        time.elapsed_secs_f64(),
        coordinator.phase(),
        coordinator.active_hazards().len(),
        coordinator.response_markers().len(),
        map.0.layer_count(),
        coordinator.subscription()
    );
}
