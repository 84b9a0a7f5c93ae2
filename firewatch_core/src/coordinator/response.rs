// firewatch_core/src/coordinator/response.rs

use rand::{Rng, RngCore};
use tracing::debug;

use super::popups;
use crate::config::ReportConfig;
use crate::surface::{IconSpec, LayerHandle, MapSurface};
use crate::types::{saturating_after, LatLng, Timestamp};

/// A simulated response team marker. Removed once `now >= expires_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMarker {
    pub location: LatLng,
    pub eta_minutes: u32,
    pub expires_at: Timestamp,
    pub marker: LayerHandle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Dispatch {
    origin: LatLng,
    spawn_at: Timestamp,
}

/// Dispatches waiting to appear and the markers currently on the map.
#[derive(Debug, Default)]
pub struct ResponseTeams {
    pending: Vec<Dispatch>,
    active: Vec<ResponseMarker>,
}

impl ResponseTeams {
    pub fn schedule(&mut self, origin: LatLng, spawn_at: Timestamp) {
        self.pending.push(Dispatch { origin, spawn_at });
    }

    pub fn active(&self) -> &[ResponseMarker] {
        &self.active
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Spawns due dispatches and removes expired markers.
    ///
    /// Lifetimes run from the scheduled spawn time, so a late pump never
    /// extends them.
    pub fn advance(
        &mut self,
        now: Timestamp,
        config: &ReportConfig,
        map: &mut dyn MapSurface,
        rng: &mut dyn RngCore,
    ) {
        let (due, waiting): (Vec<Dispatch>, Vec<Dispatch>) =
            self.pending.drain(..).partition(|d| now >= d.spawn_at);
        self.pending = waiting;

        for dispatch in due {
            let expires_at = saturating_after(dispatch.spawn_at, config.response_lifetime());
            if now >= expires_at {
                continue;
            }
            let location = jitter(dispatch.origin, config.response_jitter_degrees, rng);
            let (eta_min, eta_max) = if config.eta_minutes_min <= config.eta_minutes_max {
                (config.eta_minutes_min, config.eta_minutes_max)
            } else {
                (config.eta_minutes_max, config.eta_minutes_min)
            };
            let eta_minutes = rng.gen_range(eta_min..=eta_max);

            let marker = map.add_marker(location, IconSpec::ResponseTeam);
            map.bind_popup(marker, popups::response_team(eta_minutes));
            debug!(%location, eta_minutes, "response team marker spawned");
            self.active.push(ResponseMarker {
                location,
                eta_minutes,
                expires_at,
                marker,
            });
        }

        self.active.retain(|response| {
            if now >= response.expires_at {
                map.remove_layer(response.marker);
                false
            } else {
                true
            }
        });
    }

    /// Removes every marker and forgets pending dispatches.
    pub fn clear(&mut self, map: &mut dyn MapSurface) {
        for response in self.active.drain(..) {
            map.remove_layer(response.marker);
        }
        self.pending.clear();
    }
}

fn jitter(origin: LatLng, max_degrees: f64, rng: &mut dyn RngCore) -> LatLng {
    if !(max_degrees.is_finite() && max_degrees > 0.0) {
        return origin;
    }
    LatLng::new(
        origin.lat + rng.gen_range(-max_degrees..max_degrees),
        origin.lng + rng.gen_range(-max_degrees..max_degrees),
    )
}
