// firewatch_core/src/test_support.rs

//! Recording fakes shared by the unit tests.

use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::CoordinatorConfig;
use crate::coordinator::{CoordinatorParts, MarkerLifecycleCoordinator};
use crate::error::{LocationError, StorageError};
use crate::location::{
    LocationEvent, LocationSource, RequestOptions, RequestTicket, SubscriptionHandle, WatchSlot,
};
use crate::snapshot::{DeviceTag, MemoryBackend, SnapshotBackend, SnapshotRecord, SnapshotStore};
use crate::surface::InMemoryMap;
use crate::types::{Position, Timestamp};
use crate::ui::{Control, ControlState, Notification, StatusUpdate, UiBinding};

pub(crate) const EPOCH_SECS: i64 = 1_760_000_000;

/// A fixed instant plus `secs`.
pub(crate) fn at(secs: i64) -> Timestamp {
    Utc.timestamp_opt(EPOCH_SECS + secs, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn fix(lat: f64, lng: f64, accuracy: f64, secs: i64) -> Position {
    Position::new(lat, lng, accuracy, at(secs))
}

// =========================================================================
// == Location Source ==
// =========================================================================

#[derive(Debug, Default)]
pub(crate) struct FakeSourceState {
    pub unsupported: bool,
    next_ticket: u64,
    open_requests: Vec<RequestTicket>,
    watch: WatchSlot,
    pub requests: u32,
    pub watch_starts: u32,
    pub stopped: Vec<SubscriptionHandle>,
    pub last_one_shot: Option<RequestOptions>,
    pub last_continuous: Option<RequestOptions>,
    queue: Vec<LocationEvent>,
}

/// A scripted provider. Clones share state, so a test keeps one handle and
/// gives the coordinator another.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeLocationSource(Arc<Mutex<FakeSourceState>>);

impl FakeLocationSource {
    pub fn unsupported() -> Self {
        let source = Self::default();
        source.0.lock().unsupported = true;
        source
    }

    pub fn state(&self) -> parking_lot::MutexGuard<'_, FakeSourceState> {
        self.0.lock()
    }

    /// Resolves the oldest open one-shot request. Returns its ticket.
    pub fn resolve_next(&self, result: Result<Position, LocationError>) -> RequestTicket {
        let mut state = self.0.lock();
        assert!(!state.open_requests.is_empty(), "no open one-shot request");
        let ticket = state.open_requests.remove(0);
        state.queue.push(LocationEvent::OneShot { ticket, result });
        ticket
    }

    /// Delivers a result for an arbitrary ticket, e.g. a stale one.
    pub fn resolve_ticket(&self, ticket: RequestTicket, result: Result<Position, LocationError>) {
        self.0.lock().queue.push(LocationEvent::OneShot { ticket, result });
    }

    /// Delivers a fix to the active subscription.
    pub fn deliver(&self, position: Position) {
        let handle = self.active().expect("no active subscription");
        self.deliver_to(handle, position);
    }

    /// Delivers a fix for `handle` whether or not it is still active, the way
    /// a callback already queued by the platform would arrive.
    pub fn deliver_to(&self, handle: SubscriptionHandle, position: Position) {
        self.0.lock().queue.push(LocationEvent::Update {
            subscription: handle,
            position,
        });
    }

    pub fn watch_error(&self, error: LocationError) {
        let handle = self.active().expect("no active subscription");
        self.0.lock().queue.push(LocationEvent::WatchError {
            subscription: handle,
            error,
        });
    }

    pub fn active(&self) -> Option<SubscriptionHandle> {
        self.0.lock().watch.active()
    }

    pub fn open_requests(&self) -> usize {
        self.0.lock().open_requests.len()
    }
}

impl LocationSource for FakeLocationSource {
    fn request_once(&mut self, options: &RequestOptions) -> Result<RequestTicket, LocationError> {
        let mut state = self.0.lock();
        if state.unsupported {
            return Err(LocationError::Unsupported);
        }
        state.requests += 1;
        state.last_one_shot = Some(*options);
        state.next_ticket += 1;
        let ticket = RequestTicket(state.next_ticket);
        state.open_requests.push(ticket);
        Ok(ticket)
    }

    fn start_continuous(
        &mut self,
        options: &RequestOptions,
    ) -> Result<SubscriptionHandle, LocationError> {
        let mut state = self.0.lock();
        if state.unsupported {
            return Err(LocationError::Unsupported);
        }
        let (handle, created) = state.watch.start();
        if created {
            state.watch_starts += 1;
            state.last_continuous = Some(*options);
        }
        Ok(handle)
    }

    fn stop(&mut self, handle: SubscriptionHandle) {
        let mut state = self.0.lock();
        if state.watch.stop(handle) {
            state.stopped.push(handle);
        }
    }

    fn active_subscription(&self) -> Option<SubscriptionHandle> {
        self.0.lock().watch.active()
    }

    fn drain_events(&mut self) -> Vec<LocationEvent> {
        std::mem::take(&mut self.0.lock().queue)
    }
}

// =========================================================================
// == UI ==
// =========================================================================

#[derive(Debug, Default)]
pub(crate) struct UiLog {
    pub notifications: Vec<Notification>,
    pub statuses: Vec<StatusUpdate>,
    pub controls: BTreeMap<Control, ControlState>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingUi(Arc<Mutex<UiLog>>);

impl RecordingUi {
    pub fn notifications(&self) -> Vec<Notification> {
        self.0.lock().notifications.clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.0
            .lock()
            .notifications
            .iter()
            .map(|n| n.message.clone())
            .collect()
    }

    pub fn last_notification(&self) -> Option<Notification> {
        self.0.lock().notifications.last().cloned()
    }

    pub fn control(&self, control: Control) -> Option<ControlState> {
        self.0.lock().controls.get(&control).cloned()
    }

    pub fn statuses(&self) -> Vec<StatusUpdate> {
        self.0.lock().statuses.clone()
    }

    pub fn last_tracking_status(&self) -> Option<bool> {
        self.0.lock().statuses.iter().rev().find_map(|s| match s {
            StatusUpdate::Tracking(on) => Some(*on),
            _ => None,
        })
    }

    pub fn last_hazard_count(&self) -> Option<usize> {
        self.0.lock().statuses.iter().rev().find_map(|s| match s {
            StatusUpdate::ActiveHazards(n) => Some(*n),
            _ => None,
        })
    }
}

impl UiBinding for RecordingUi {
    fn notify(&mut self, notification: Notification) {
        self.0.lock().notifications.push(notification);
    }

    fn set_status(&mut self, update: StatusUpdate) {
        self.0.lock().statuses.push(update);
    }

    fn set_control(&mut self, control: Control, state: &ControlState) {
        self.0.lock().controls.insert(control, state.clone());
    }
}

// =========================================================================
// == Storage ==
// =========================================================================

/// A backend whose every operation fails.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct FailingBackend;

impl SnapshotBackend for FailingBackend {
    fn load(&self, _key: &str) -> Result<Option<SnapshotRecord>, StorageError> {
        Err(StorageError::Unavailable("storage quota exceeded".to_string()))
    }

    fn replace(&mut self, _key: &str, _record: SnapshotRecord) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage quota exceeded".to_string()))
    }
}

// =========================================================================
// == Coordinator Harness ==
// =========================================================================

pub(crate) const DEVICE: &str = "test-device";

/// A coordinator wired to inspectable fakes.
pub(crate) struct Harness {
    pub coordinator: MarkerLifecycleCoordinator,
    pub source: FakeLocationSource,
    pub map: InMemoryMap,
    pub ui: RecordingUi,
    pub backend: MemoryBackend,
}

impl Harness {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self::with_parts(config, FakeLocationSource::default(), MemoryBackend::default())
    }

    pub fn with_parts(
        config: CoordinatorConfig,
        source: FakeLocationSource,
        backend: MemoryBackend,
    ) -> Self {
        let store = SnapshotStore::new(
            Box::new(backend.clone()),
            DeviceTag::new(DEVICE),
            &config.snapshot,
        );
        Self::with_store(config, source, store, backend)
    }

    pub fn with_store(
        config: CoordinatorConfig,
        source: FakeLocationSource,
        store: SnapshotStore,
        backend: MemoryBackend,
    ) -> Self {
        let map = InMemoryMap::from_config(&config.map);
        let ui = RecordingUi::default();
        let parts = CoordinatorParts {
            source: Box::new(source.clone()),
            map: Box::new(map.clone()),
            ui: Box::new(ui.clone()),
            store,
            rng: Box::new(ChaCha8Rng::seed_from_u64(7)),
        };
        Self {
            coordinator: MarkerLifecycleCoordinator::new(config, parts),
            source,
            map,
            ui,
            backend,
        }
    }

    /// Default config, started at `at(0)`.
    pub fn started() -> Self {
        let mut harness = Self::new(CoordinatorConfig::default());
        harness.coordinator.start(at(0));
        harness
    }

    /// Runs a successful manual locate at `now`.
    pub fn locate_at(&mut self, position: Position, now: Timestamp) {
        self.coordinator.locate(now).expect("locate accepted");
        self.source.resolve_next(Ok(position));
        self.coordinator.pump(now);
    }
}
