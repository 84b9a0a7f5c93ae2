// firewatch_sim/src/simulation/plugins/device/geolocation.rs

//! A simulated handset geolocation provider.
//!
//! The handset walks a [`GroundTruthTrack`]. Each fix is the true position
//! plus Gaussian noise, stamped with the simulation clock. One-shot requests
//! resolve after a fixed latency (or fail with `Timeout` when the latency
//! exceeds the request timeout). A continuous watch produces fixes at a fixed
//! rate. During an outage window no fresh fix is available; a cached fix is
//! replayed while it is younger than the request's maximum age.

use chrono::TimeDelta;
use parking_lot::Mutex;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::sync::Arc;
use std::time::Duration;

use crate::prelude::*;
use crate::simulation::config::{DeviceConfig, PermissionSetting};
use firewatch_core::geo::{meters_to_degrees, offset_by_degrees};
use firewatch_core::location::WatchSlot;

use super::track::GroundTruthTrack;

/// Noise and claimed accuracy are scaled by this when a request does not ask
/// for high accuracy (network positioning instead of GNSS).
const LOW_ACCURACY_FACTOR: f64 = 4.0;

#[derive(Debug, Clone, Copy)]
struct PendingRequest {
    ticket: RequestTicket,
    options: RequestOptions,
    resolve_at: Duration,
    timed_out: bool,
    cached: Option<Position>,
}

/// Everything the handset knows. Shared between the bevy resource that
/// advances it and the `LocationSource` handed to the coordinator.
#[derive(Debug)]
pub struct DeviceState {
    config: DeviceConfig,
    track: GroundTruthTrack,
    // Store the noise distribution for efficiency
    noise_dist: Option<Normal<f64>>,
    rng: ChaCha8Rng,

    now: Timestamp,
    elapsed: Duration,

    next_ticket: u64,
    pending: Vec<PendingRequest>,

    watch: WatchSlot,
    watch_options: RequestOptions,
    watch_timer: Timer,
    /// The next tick delivers a fix without waiting for the timer.
    watch_prompt: bool,
    /// Set while the watch is failing, so an outage yields one error.
    watch_failing: bool,

    last_fix: Option<Position>,
    fixes_produced: u64,
    queue: Vec<LocationEvent>,
}

impl DeviceState {
    fn new(config: DeviceConfig, rng: ChaCha8Rng, epoch: Timestamp) -> Self {
        let noise_dist = match Normal::new(0.0, config.noise_stddev_meters) {
            Ok(dist) => Some(dist),
            Err(e) => {
                warn!(
                    "Invalid handset noise stddev {}: {}. Fixes will be noise-free.",
                    config.noise_stddev_meters, e
                );
                None
            }
        };
        let period = if config.watch_rate_hz > 0.0 {
            Duration::try_from_secs_f64(1.0 / config.watch_rate_hz)
                .unwrap_or(Duration::from_secs(1))
        } else {
            Duration::from_secs(1)
        };

        Self {
            track: GroundTruthTrack::new(config.track.clone()),
            config,
            noise_dist,
            rng,
            now: epoch,
            elapsed: Duration::ZERO,
            next_ticket: 0,
            pending: Vec::new(),
            watch: WatchSlot::default(),
            watch_options: RequestOptions::CONTINUOUS,
            watch_timer: Timer::new(period, TimerMode::Repeating),
            watch_prompt: false,
            watch_failing: false,
            last_fix: None,
            fixes_produced: 0,
            queue: Vec::new(),
        }
    }

    fn permission_denied(&self) -> bool {
        self.config.permission == PermissionSetting::Denied
    }

    fn in_outage(&self) -> bool {
        let secs = self.elapsed.as_secs_f64();
        self.config.outages.iter().any(|o| o.contains(secs))
    }

    /// The last fix, if it is no older than `maximum_age`. A zero maximum age
    /// never accepts a cached fix.
    fn cached(&self, maximum_age: Duration) -> Option<Position> {
        let fix = self.last_fix?;
        if maximum_age.is_zero() {
            return None;
        }
        let age = self
            .now
            .signed_duration_since(fix.captured_at())
            .max(TimeDelta::zero())
            .to_std()
            .ok()?;
        (age <= maximum_age).then_some(fix)
    }

    fn sample_fix(&mut self, high_accuracy: bool) -> Result<Position, LocationError> {
        if self.in_outage() {
            return Err(LocationError::PositionUnavailable);
        }
        let truth = self
            .track
            .position_at(self.elapsed.as_secs_f64())
            .ok_or(LocationError::PositionUnavailable)?;

        let scale = if high_accuracy { 1.0 } else { LOW_ACCURACY_FACTOR };
        let (east, north) = match &self.noise_dist {
            Some(dist) => (
                dist.sample(&mut self.rng) * scale,
                dist.sample(&mut self.rng) * scale,
            ),
            None => (0.0, 0.0),
        };
        let measured = offset_by_degrees(truth, &meters_to_degrees(truth, east, north));

        let position = Position::new(
            measured.lat,
            measured.lng,
            self.config.reported_accuracy_meters * scale,
            self.now,
        );
        self.last_fix = Some(position);
        self.fixes_produced += 1;
        Ok(position)
    }

    fn resolve(&mut self, request: &PendingRequest) -> Result<Position, LocationError> {
        if self.permission_denied() {
            return Err(LocationError::PermissionDenied);
        }
        if let Some(cached) = request.cached {
            return Ok(cached);
        }
        if request.timed_out {
            return Err(LocationError::Timeout);
        }
        self.sample_fix(request.options.high_accuracy)
    }

    fn advance(&mut self, now: Timestamp, elapsed: Duration, dt: Duration) {
        self.now = now;
        self.elapsed = elapsed;

        // --- One-shot requests, in ticket order ---
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|request| request.resolve_at <= elapsed);
        self.pending = waiting;
        for request in due {
            let result = self.resolve(&request);
            debug!(
                "[DEVICE] one-shot {:?} resolved: {:?}",
                request.ticket,
                result.map(|p| p.location())
            );
            self.queue.push(LocationEvent::OneShot {
                ticket: request.ticket,
                result,
            });
        }

        // --- Continuous watch ---
        self.tick_watch(dt);
    }

    fn tick_watch(&mut self, dt: Duration) {
        let Some(subscription) = self.watch.active() else {
            return;
        };

        if self.permission_denied() {
            if !self.watch_failing {
                self.watch_failing = true;
                self.queue.push(LocationEvent::WatchError {
                    subscription,
                    error: LocationError::PermissionDenied,
                });
            }
            return;
        }

        self.watch_timer.tick(dt);
        let prompt = std::mem::take(&mut self.watch_prompt);
        if !prompt && !self.watch_timer.just_finished() {
            return;
        }

        let fix = self
            .sample_fix(self.watch_options.high_accuracy)
            .or_else(|error| self.cached(self.watch_options.maximum_age()).ok_or(error));
        match fix {
            Ok(position) => {
                self.watch_failing = false;
                self.queue.push(LocationEvent::Update {
                    subscription,
                    position,
                });
            }
            Err(error) if !self.watch_failing => {
                self.watch_failing = true;
                self.queue.push(LocationEvent::WatchError {
                    subscription,
                    error,
                });
            }
            Err(_) => {}
        }
    }
}

// =========================================================================
// == Bevy Resource ==
// =========================================================================

/// The handset, as seen by the bevy systems that advance it.
#[derive(Resource, Clone, Debug)]
pub struct DeviceGeolocation(Arc<Mutex<DeviceState>>);

impl DeviceGeolocation {
    pub fn new(config: DeviceConfig, rng: ChaCha8Rng, epoch: Timestamp) -> Self {
        Self(Arc::new(Mutex::new(DeviceState::new(config, rng, epoch))))
    }

    /// A provider handle for the coordinator. It shares this handset's state.
    pub fn source(&self) -> SimulatedLocationSource {
        SimulatedLocationSource(Arc::clone(&self.0))
    }

    pub fn advance(&self, now: Timestamp, elapsed: Duration, dt: Duration) {
        self.0.lock().advance(now, elapsed, dt);
    }

    /// Where the handset truly is right now.
    pub fn ground_truth(&self) -> Option<LatLng> {
        let state = self.0.lock();
        state.track.position_at(state.elapsed.as_secs_f64())
    }

    pub fn fixes_produced(&self) -> u64 {
        self.0.lock().fixes_produced
    }

    pub fn pending_requests(&self) -> usize {
        self.0.lock().pending.len()
    }
}

// =========================================================================
// == LocationSource ==
// =========================================================================

#[derive(Clone, Debug)]
pub struct SimulatedLocationSource(Arc<Mutex<DeviceState>>);

impl LocationSource for SimulatedLocationSource {
    fn request_once(&mut self, options: &RequestOptions) -> Result<RequestTicket, LocationError> {
        let mut state = self.0.lock();
        if !state.config.supported {
            return Err(LocationError::Unsupported);
        }

        state.next_ticket += 1;
        let ticket = RequestTicket(state.next_ticket);
        let cached = state.cached(options.maximum_age());
        let latency = Duration::from_millis(state.config.fix_latency_ms);
        let wait = if cached.is_some() {
            Duration::ZERO
        } else {
            latency.min(options.timeout())
        };
        let request = PendingRequest {
            ticket,
            options: *options,
            resolve_at: state.elapsed + wait,
            timed_out: latency > options.timeout(),
            cached,
        };
        state.pending.push(request);
        Ok(ticket)
    }

    fn start_continuous(
        &mut self,
        options: &RequestOptions,
    ) -> Result<SubscriptionHandle, LocationError> {
        let mut state = self.0.lock();
        if !state.config.supported {
            return Err(LocationError::Unsupported);
        }
        let (handle, created) = state.watch.start();
        if created {
            debug!("[DEVICE] watch {:?} started", handle);
            state.watch_options = *options;
            state.watch_timer.reset();
            state.watch_prompt = true;
            state.watch_failing = false;
        }
        Ok(handle)
    }

    /// Events already queued for `handle` stay queued; the consumer discards them.
    fn stop(&mut self, handle: SubscriptionHandle) {
        if self.0.lock().watch.stop(handle) {
            debug!("[DEVICE] watch {:?} stopped", handle);
        }
    }

    fn active_subscription(&self) -> Option<SubscriptionHandle> {
        self.0.lock().watch.active()
    }

    fn drain_events(&mut self) -> Vec<LocationEvent> {
        std::mem::take(&mut self.0.lock().queue)
    }
}
