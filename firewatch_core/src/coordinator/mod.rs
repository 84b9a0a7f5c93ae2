// firewatch_core/src/coordinator/mod.rs

//! The marker lifecycle coordinator.
//!
//! Owns every piece of map business state (user marker, accuracy circle,
//! hazard set, hydrants, response teams, shared-location marker) and drives it
//! from location events and operator actions. All methods run on the host's
//! single control thread and finish every remove/add sequence before
//! returning, so no half-updated overlay is ever observable between calls.

pub mod controls;
pub mod popups;
pub mod response;

use chrono::TimeDelta;
use rand::RngCore;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{millis, CoordinatorConfig};
use crate::error::{ActionError, LocationError};
use crate::hazards::{FixKind, HazardPoint, HazardSet, HazardSimulator, RegenerationPolicy};
use crate::location::{LocationEvent, LocationSource, RequestTicket, SubscriptionHandle};
use crate::snapshot::address::approximate_address;
use crate::snapshot::{decode_handoff, encode_handoff, HandoffToken, LocationSnapshot, SnapshotStore};
use crate::surface::{CircleStyle, IconSpec, LayerHandle, MapSurface, ViewOptions};
use crate::types::{saturating_after, LatLng, Position, Timestamp};
use crate::ui::{Control, Notification, StatusUpdate, UiBinding};

use controls::{ControlPanel, ControlPhase};
use response::{ResponseMarker, ResponseTeams};

/// Extra time past a one-shot request's own timeout before the coordinator
/// gives up on a provider that never answers.
const LOCATE_GRACE_MS: u64 = 2_000;

const HELP_TOAST_MS: u64 = 8_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No fix yet.
    Idle,
    /// At least one fix; no continuous subscription.
    Located,
    Tracking,
    /// Subscription cancelled; the last fix stays on the map.
    Stopped,
}

/// Injected collaborators.
pub struct CoordinatorParts {
    pub source: Box<dyn LocationSource>,
    pub map: Box<dyn MapSurface>,
    pub ui: Box<dyn UiBinding>,
    pub store: SnapshotStore,
    /// Drives hazard and response-team randomisation.
    pub rng: Box<dyn RngCore + Send + Sync>,
}

/// The one live user marker and its accuracy overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct UserMarkerState {
    pub position: Position,
    pub marker: LayerHandle,
    pub circle: LayerHandle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub hazard_regenerations: u64,
    pub snapshot_writes: u64,
    pub snapshot_write_failures: u64,
    /// Late, stale or foreign location events that were discarded.
    pub dropped_events: u64,
}

/// What `share_location` hands to the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationShare {
    pub snapshot: LocationSnapshot,
    pub token: HandoffToken,
    /// Present when a share page is configured.
    pub link: Option<Url>,
}

#[derive(Debug, Clone, Copy)]
struct PendingLocate {
    ticket: RequestTicket,
    deadline: Timestamp,
}

pub struct MarkerLifecycleCoordinator {
    config: CoordinatorConfig,
    source: Box<dyn LocationSource>,
    map: Box<dyn MapSurface>,
    ui: Box<dyn UiBinding>,
    store: SnapshotStore,
    rng: Box<dyn RngCore + Send + Sync>,

    simulator: HazardSimulator,
    policy: RegenerationPolicy,
    controls: ControlPanel,
    responses: ResponseTeams,

    phase: SessionPhase,
    user: Option<UserMarkerState>,
    hazards: HazardSet,
    /// Where the current hazard set was generated.
    hazard_anchor: Option<LatLng>,
    hydrant_markers: Vec<LayerHandle>,
    shared_marker: Option<LayerHandle>,
    latest_snapshot: Option<LocationSnapshot>,

    pending_locate: Option<PendingLocate>,
    subscription: Option<SubscriptionHandle>,
    last_fix_at: Option<Timestamp>,
    torn_down: bool,
    stats: CoordinatorStats,
}

impl MarkerLifecycleCoordinator {
    pub fn new(config: CoordinatorConfig, parts: CoordinatorParts) -> Self {
        let policy = RegenerationPolicy::new(config.hazards.displacement_threshold_meters);
        Self {
            config,
            source: parts.source,
            map: parts.map,
            ui: parts.ui,
            store: parts.store,
            rng: parts.rng,
            simulator: HazardSimulator::new(),
            policy,
            controls: ControlPanel::default(),
            responses: ResponseTeams::default(),
            phase: SessionPhase::Idle,
            user: None,
            hazards: HazardSet::empty(),
            hazard_anchor: None,
            hydrant_markers: Vec::new(),
            shared_marker: None,
            latest_snapshot: None,
            pending_locate: None,
            subscription: None,
            last_fix_at: None,
            torn_down: false,
            stats: CoordinatorStats::default(),
        }
    }

    // =====================================================================
    // == Session Lifecycle ==
    // =====================================================================

    /// Draws the initial map and, when allowed, restores a still-valid
    /// snapshot as the user marker.
    pub fn start(&mut self, now: Timestamp) {
        let map_config = &self.config.map;
        self.map
            .set_view(map_config.center, map_config.zoom, ViewOptions::default());

        if self.config.features.hydrants {
            self.show_hydrants();
        } else {
            self.controls.disable(Control::ToggleHydrants, self.ui.as_mut());
        }
        if !self.config.features.handoff {
            self.controls.disable(Control::ShareLocation, self.ui.as_mut());
        }
        self.controls.publish_all(self.ui.as_mut());

        self.ui.set_status(StatusUpdate::Tracking(false));
        self.ui.set_status(StatusUpdate::ActiveHazards(0));
        self.ui.set_status(StatusUpdate::LastUpdate(now));

        if self.config.features.restore_on_start {
            self.restore_snapshot(now);
        }
        info!(
            device = %self.store.device(),
            hydrants = self.hydrant_markers.len(),
            restored = self.user.is_some(),
            "coordinator started"
        );
    }

    fn restore_snapshot(&mut self, now: Timestamp) {
        let Some(snapshot) = self.store.read_valid(now) else {
            debug!("no valid snapshot to restore");
            return;
        };
        let position = snapshot.to_position();
        self.place_user_marker(position);
        self.map.set_view(
            position.location(),
            self.config.map.locate_zoom,
            ViewOptions::default(),
        );
        self.publish_fix(position);
        self.last_fix_at = Some(position.captured_at());
        self.latest_snapshot = Some(snapshot);
        self.phase = SessionPhase::Located;
        self.controls
            .set_idle_label(Control::Locate, controls::LOCATE_AGAIN, self.ui.as_mut());
        info!(location = %position.location(), "restored last known location");
    }

    /// Stops tracking and removes every layer this coordinator owns. All
    /// later actions are refused and all later events dropped.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.stop_tracking();
        self.pending_locate = None;

        if let Some(user) = self.user.take() {
            self.map.remove_layer(user.marker);
            self.map.remove_layer(user.circle);
        }
        self.clear_hazards();
        self.hide_hydrants();
        if let Some(shared) = self.shared_marker.take() {
            self.map.remove_layer(shared);
        }
        self.responses.clear(self.map.as_mut());

        for control in Control::ALL {
            self.controls.disable(control, self.ui.as_mut());
        }
        self.torn_down = true;
        info!(stats = ?self.stats(), "coordinator torn down");
    }

    /// Drains location events, then runs the timers: the locate deadline,
    /// control cooldowns and response team spawns/expiries.
    pub fn pump(&mut self, now: Timestamp) {
        for event in self.source.drain_events() {
            self.handle_event(event, now);
        }
        if self.torn_down {
            return;
        }

        if let Some(pending) = self.pending_locate {
            if now >= pending.deadline {
                warn!(ticket = pending.ticket.0, "locate request never resolved");
                self.pending_locate = None;
                self.on_locate_failed(LocationError::Timeout);
            }
        }

        self.controls.release_expired(now, self.ui.as_mut());
        self.responses.advance(
            now,
            &self.config.report,
            self.map.as_mut(),
            self.rng.as_mut(),
        );
    }

    /// Applies one delivery from the location source.
    pub fn handle_event(&mut self, event: LocationEvent, now: Timestamp) {
        if self.torn_down {
            self.drop_event("coordinator torn down");
            return;
        }
        match event {
            LocationEvent::OneShot { ticket, result } => {
                match self.pending_locate {
                    Some(pending) if pending.ticket == ticket => {
                        self.pending_locate = None;
                    }
                    _ => {
                        self.drop_event("one-shot result for a request no longer in flight");
                        return;
                    }
                }
                match result {
                    Ok(position) => self.on_manual_fix(position, now),
                    Err(error) => self.on_locate_failed(error),
                }
            }
            LocationEvent::Update {
                subscription,
                position,
            } => {
                if self.subscription != Some(subscription) {
                    self.drop_event("update for an inactive subscription");
                    return;
                }
                self.on_continuous_fix(position, now);
            }
            LocationEvent::WatchError {
                subscription,
                error,
            } => {
                if self.subscription != Some(subscription) {
                    self.drop_event("watch error for an inactive subscription");
                    return;
                }
                warn!(subscription = subscription.0, %error, "tracking error");
            }
        }
    }

    fn drop_event(&mut self, reason: &'static str) {
        self.stats.dropped_events += 1;
        debug!(reason, "dropping location event");
    }

    // =====================================================================
    // == Locate ==
    // =====================================================================

    /// Starts a one-shot locate. The Locate control stays disabled until the
    /// result arrives or the request deadline passes.
    pub fn locate(&mut self, now: Timestamp) -> Result<RequestTicket, ActionError> {
        self.ensure_live()?;
        if let Err(err) = self.controls.check(Control::Locate) {
            debug!(%err, "locate refused");
            return Err(err);
        }

        let options = self.config.geolocation.one_shot;
        match self.source.request_once(&options) {
            Ok(ticket) => {
                let timeout = TimeDelta::from_std(options.timeout())
                    .unwrap_or(TimeDelta::MAX)
                    .checked_add(&millis(LOCATE_GRACE_MS))
                    .unwrap_or(TimeDelta::MAX);
                let deadline = saturating_after(now, timeout);
                self.pending_locate = Some(PendingLocate { ticket, deadline });
                self.controls
                    .begin(Control::Locate, controls::LOCATE_BUSY, self.ui.as_mut());
                debug!(ticket = ticket.0, "locate requested");
                Ok(ticket)
            }
            Err(error) => {
                self.on_locate_failed(error);
                Err(error.into())
            }
        }
    }

    pub fn is_locating(&self) -> bool {
        self.pending_locate.is_some()
    }

    fn on_manual_fix(&mut self, position: Position, now: Timestamp) {
        if !position.location().is_valid() {
            warn!(?position, "provider returned an invalid fix");
            self.on_locate_failed(LocationError::PositionUnavailable);
            return;
        }

        self.place_user_marker(position);
        self.map.set_view(
            position.location(),
            self.config.map.locate_zoom,
            ViewOptions { animate: true },
        );
        if self.phase != SessionPhase::Tracking {
            self.phase = SessionPhase::Located;
        }
        self.last_fix_at = Some(position.captured_at());

        self.publish_fix(position);
        if self
            .policy
            .should_regenerate(FixKind::Manual, self.hazard_anchor, position.location())
        {
            self.regenerate_hazards(position.location(), now);
        }
        self.persist(position);

        self.ui
            .notify(Notification::success("Location detected successfully"));
        self.controls.release(
            Control::Locate,
            Some(controls::LOCATE_AGAIN),
            self.ui.as_mut(),
        );
        info!(location = %position.location(), accuracy = position.accuracy_meters(), "location fix");

        if self.config.features.auto_track && self.subscription.is_none() {
            if let Err(err) = self.start_tracking() {
                warn!(%err, "could not start continuous tracking");
            }
        }
    }

    fn on_locate_failed(&mut self, error: LocationError) {
        warn!(%error, "locate failed");
        self.ui.notify(Notification::error(error.operator_message()));
        let label = if self.user.is_some() {
            controls::LOCATE_AGAIN
        } else {
            controls::LOCATE_IDLE
        };
        self.controls
            .release(Control::Locate, Some(label), self.ui.as_mut());
    }

    /// Removes the previous marker and circle before adding the new ones.
    fn place_user_marker(&mut self, position: Position) {
        if let Some(previous) = self.user.take() {
            self.map.remove_layer(previous.marker);
            self.map.remove_layer(previous.circle);
        }
        let location = position.location();
        let marker = self.map.add_marker(location, IconSpec::User);
        self.map.bind_popup(marker, popups::user_location(&position));
        let circle = self.map.add_circle(
            location,
            position.accuracy_meters(),
            &CircleStyle::accuracy(),
        );
        self.user = Some(UserMarkerState {
            position,
            marker,
            circle,
        });
    }

    // =====================================================================
    // == Continuous Tracking ==
    // =====================================================================

    /// Starts continuous tracking. Requires a prior fix; starting while
    /// already tracking returns the active subscription.
    pub fn start_tracking(&mut self) -> Result<SubscriptionHandle, ActionError> {
        self.ensure_live()?;
        if self.user.is_none() {
            return Err(ActionError::NoFix);
        }
        if let Some(active) = self.subscription {
            return Ok(active);
        }

        let handle = self
            .source
            .start_continuous(&self.config.geolocation.continuous)?;
        self.subscription = Some(handle);
        self.phase = SessionPhase::Tracking;
        self.ui.set_status(StatusUpdate::Tracking(true));
        info!(subscription = handle.0, "continuous tracking started");
        Ok(handle)
    }

    /// Cancels the subscription. Events for it that arrive afterwards are
    /// dropped. Returns whether anything was stopped.
    pub fn stop_tracking(&mut self) -> bool {
        let Some(handle) = self.subscription.take() else {
            return false;
        };
        self.source.stop(handle);
        self.phase = SessionPhase::Stopped;
        self.ui.set_status(StatusUpdate::Tracking(false));
        info!(subscription = handle.0, "continuous tracking stopped");
        true
    }

    /// Hidden pages stop tracking; a visible page resumes it when a fix
    /// exists and tracking was stopped.
    pub fn on_visibility_changed(&mut self, visible: bool) {
        if self.torn_down {
            return;
        }
        if !visible {
            self.stop_tracking();
        } else if self.phase == SessionPhase::Stopped && self.user.is_some() {
            if let Err(err) = self.start_tracking() {
                warn!(%err, "could not resume tracking");
            }
        }
    }

    fn on_continuous_fix(&mut self, position: Position, now: Timestamp) {
        if !position.location().is_valid() {
            self.drop_event("invalid continuous fix");
            return;
        }
        if self
            .last_fix_at
            .is_some_and(|last| position.captured_at() < last)
        {
            self.drop_event("fix older than the last applied one");
            return;
        }

        match self.user.as_mut() {
            Some(user) => {
                let location = position.location();
                self.map.set_lat_lng(user.marker, location);
                self.map.bind_popup(user.marker, popups::user_location(&position));
                self.map.set_lat_lng(user.circle, location);
                self.map.set_radius(user.circle, position.accuracy_meters());
                user.position = position;
            }
            None => self.place_user_marker(position),
        }
        self.last_fix_at = Some(position.captured_at());
        self.phase = SessionPhase::Tracking;
        self.publish_fix(position);

        if self
            .policy
            .should_regenerate(FixKind::Continuous, self.hazard_anchor, position.location())
        {
            self.regenerate_hazards(position.location(), now);
        }
        self.persist(position);
    }

    // =====================================================================
    // == Hazards ==
    // =====================================================================

    fn clear_hazards(&mut self) {
        for point in self.hazards.iter() {
            if let Some(marker) = point.marker {
                self.map.remove_layer(marker);
            }
        }
        self.hazards = HazardSet::empty();
    }

    /// Replaces the whole hazard set with a fresh one around `center`.
    fn regenerate_hazards(&mut self, center: LatLng, now: Timestamp) {
        self.clear_hazards();

        let points = self.simulator.generate(
            center,
            &self.config.hazards.generation,
            now,
            self.rng.as_mut(),
        );
        let drawn: Vec<HazardPoint> = points
            .into_iter()
            .enumerate()
            .map(|(i, point)| {
                let marker = self.map.add_marker(point.location, IconSpec::Fire);
                let distance = self.map.distance_meters(center, point.location);
                self.map
                    .bind_popup(marker, popups::fire_incident(i + 1, &point, distance));
                point.with_marker(marker)
            })
            .collect();

        self.hazards = HazardSet::new(drawn);
        self.hazard_anchor = Some(center);
        self.stats.hazard_regenerations += 1;
        self.ui
            .set_status(StatusUpdate::ActiveHazards(self.hazards.len()));
        self.ui.set_status(StatusUpdate::LastUpdate(now));
        debug!(count = self.hazards.len(), %center, "hazards regenerated");
    }

    /// Regenerates hazards around the current fix.
    pub fn refresh(&mut self, now: Timestamp) -> Result<(), ActionError> {
        self.ensure_live()?;
        if let Some(location) = self.user.as_ref().map(|u| u.position.location()) {
            self.regenerate_hazards(location, now);
        }
        self.ui.set_status(StatusUpdate::LastUpdate(now));
        self.ui.notify(Notification::success("Map data refreshed"));
        Ok(())
    }

    // =====================================================================
    // == Report ==
    // =====================================================================

    /// Pins an emergency hazard at the current fix. Returns its id.
    pub fn report(&mut self, now: Timestamp) -> Result<u64, ActionError> {
        self.ensure_live()?;
        let Some(position) = self.user.as_ref().map(|u| u.position) else {
            self.ui.notify(Notification::error(
                "Unable to get location for reporting. Please locate yourself first.",
            ));
            return Err(ActionError::NoFix);
        };
        if let Err(err) = self.controls.check(Control::Report) {
            debug!(%err, "report refused");
            return Err(err);
        }

        let location = position.location();
        let point = self.simulator.reported(location, now);
        let marker = self.map.add_marker(location, IconSpec::ReportedFire);
        self.map.bind_popup(marker, popups::reported_fire(&point));
        let id = point.id;
        self.hazards = self.hazards.with_added(point.with_marker(marker));

        self.map.set_view(
            location,
            self.config.map.locate_zoom,
            ViewOptions { animate: true },
        );
        self.persist(position);
        self.ui
            .set_status(StatusUpdate::ActiveHazards(self.hazards.len()));
        self.ui.set_status(StatusUpdate::LastUpdate(now));
        self.ui.notify(Notification::success(
            "Fire emergency reported successfully! Response team has been notified.",
        ));

        let report = &self.config.report;
        let cooldown_until = saturating_after(now, report.cooldown());
        let spawn_at = saturating_after(now, report.response_delay());
        self.controls.cool_down(
            Control::Report,
            cooldown_until,
            controls::REPORT_BUSY,
            self.ui.as_mut(),
        );
        if self.config.features.response_team {
            self.responses.schedule(location, spawn_at);
        }
        info!(id, %location, "fire emergency reported");
        Ok(id)
    }

    // =====================================================================
    // == Hydrants ==
    // =====================================================================

    fn show_hydrants(&mut self) {
        if !self.hydrant_markers.is_empty() {
            return;
        }
        for hydrant in &self.config.hydrants {
            let marker = self.map.add_marker(
                hydrant.location(),
                IconSpec::Hydrant {
                    operational: hydrant.is_operational(),
                },
            );
            self.map.bind_popup(marker, popups::hydrant(hydrant));
            self.hydrant_markers.push(marker);
        }
    }

    fn hide_hydrants(&mut self) {
        for marker in self.hydrant_markers.drain(..) {
            self.map.remove_layer(marker);
        }
    }

    pub fn hydrants_visible(&self) -> bool {
        !self.hydrant_markers.is_empty()
    }

    /// Shows or hides every hydrant marker. Returns the new visibility.
    pub fn toggle_hydrants(&mut self) -> Result<bool, ActionError> {
        self.ensure_live()?;
        self.controls.check(Control::ToggleHydrants)?;

        if self.hydrants_visible() {
            self.hide_hydrants();
            self.controls.set_idle_label(
                Control::ToggleHydrants,
                controls::HYDRANTS_SHOW,
                self.ui.as_mut(),
            );
            self.ui.notify(Notification::info("Fire hydrants hidden"));
            Ok(false)
        } else {
            self.show_hydrants();
            self.controls.set_idle_label(
                Control::ToggleHydrants,
                controls::HYDRANTS_HIDE,
                self.ui.as_mut(),
            );
            self.ui
                .notify(Notification::success("Fire hydrants shown on map"));
            Ok(true)
        }
    }

    // =====================================================================
    // == Snapshot & Handoff ==
    // =====================================================================

    fn persist(&mut self, position: Position) {
        let address = approximate_address(position.location(), &self.config.address);
        let snapshot = LocationSnapshot::from_position(&position, address, self.store.device());
        if self.config.features.persist_snapshots {
            let failures_before = self.store.failed_writes();
            self.store.write(&snapshot);
            self.stats.snapshot_writes += 1;
            self.stats.snapshot_write_failures += self.store.failed_writes() - failures_before;
        }
        self.latest_snapshot = Some(snapshot);
    }

    /// Encodes the latest fix into a handoff token and share link.
    pub fn share_location(&mut self, now: Timestamp) -> Result<LocationShare, ActionError> {
        self.ensure_live()?;
        self.controls.check(Control::ShareLocation)?;

        let snapshot = match &self.latest_snapshot {
            Some(snapshot) if self.store.is_valid(snapshot, now) => snapshot.clone(),
            _ => {
                self.ui.notify(Notification::warning(
                    "No recent location to share. Locate yourself first.",
                ));
                return Err(ActionError::NoFix);
            }
        };

        let token = encode_handoff(&snapshot);
        let link = self.share_base_url().map(|base| token.share_link(&base));
        self.ui
            .notify(Notification::success("Location ready to share"));
        debug!(token_len = token.as_str().len(), has_link = link.is_some(), "location shared");
        Ok(LocationShare {
            snapshot,
            token,
            link,
        })
    }

    fn share_base_url(&self) -> Option<Url> {
        let base = self.config.handoff.share_base_url.as_deref()?;
        match Url::parse(base) {
            Ok(url) => Some(url),
            Err(err) => {
                warn!(base, %err, "ignoring invalid share base url");
                None
            }
        }
    }

    /// Shows a peer's handoff token as the "Shared location" marker. The local
    /// snapshot slot is left untouched.
    pub fn receive_handoff(
        &mut self,
        token: &str,
        now: Timestamp,
    ) -> Result<LocationSnapshot, ActionError> {
        self.ensure_live()?;
        if !self.config.features.handoff {
            return Err(ActionError::Disabled);
        }

        let snapshot = match decode_handoff(token) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(%err, "rejected handoff token");
                self.ui
                    .notify(Notification::error("The shared location link is invalid."));
                return Err(err.into());
            }
        };

        if let Some(previous) = self.shared_marker.take() {
            self.map.remove_layer(previous);
        }
        let location = snapshot.location();
        let marker = self.map.add_marker(location, IconSpec::SharedLocation);
        self.map
            .bind_popup(marker, popups::shared_location(&snapshot, now));
        self.shared_marker = Some(marker);
        self.map.set_view(
            location,
            self.config.map.locate_zoom,
            ViewOptions { animate: true },
        );
        self.ui.notify(Notification::info(format!(
            "Showing shared location: {}",
            snapshot.approximate_address
        )));
        Ok(snapshot)
    }

    // =====================================================================
    // == Misc Operator Actions ==
    // =====================================================================

    /// `confirmed` is the operator's answer to "Call emergency services?".
    pub fn call_emergency(&mut self, confirmed: bool) {
        if confirmed {
            self.ui.notify(Notification::warning(
                "Emergency services called. Please provide location details.",
            ));
            return;
        }
        let mut message = String::from("Emergency Contacts:");
        for contact in &self.config.contacts {
            message.push('\n');
            message.push_str(&contact.agency);
            message.push_str(": ");
            message.push_str(&contact.number);
        }
        self.ui.notify(Notification::info(message));
    }

    pub fn show_help(&mut self) {
        self.ui.notify(
            Notification::info(
                "Emergency Response Guide:\n\
                 1. Report fires using the red button\n\
                 2. Enable location for accurate positioning\n\
                 3. Use the dashboard for navigation\n\
                 4. Contact numbers are listed in Contacts section",
            )
            .with_duration(std::time::Duration::from_millis(HELP_TOAST_MS)),
        );
    }

    pub fn on_resize(&mut self) {
        self.map.invalidate_size();
    }

    // =====================================================================
    // == Accessors ==
    // =====================================================================

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn user_marker(&self) -> Option<&UserMarkerState> {
        self.user.as_ref()
    }

    /// The current hazard set. Cloning is cheap and keeps pointer identity.
    pub fn active_hazards(&self) -> HazardSet {
        self.hazards.clone()
    }

    pub fn response_markers(&self) -> &[ResponseMarker] {
        self.responses.active()
    }

    pub fn shared_marker(&self) -> Option<LayerHandle> {
        self.shared_marker
    }

    pub fn subscription(&self) -> Option<SubscriptionHandle> {
        self.subscription
    }

    pub fn control_phase(&self, control: Control) -> ControlPhase {
        self.controls.phase(control)
    }

    pub fn latest_snapshot(&self) -> Option<&LocationSnapshot> {
        self.latest_snapshot.as_ref()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.stats
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn ensure_live(&self) -> Result<(), ActionError> {
        if self.torn_down {
            Err(ActionError::Disabled)
        } else {
            Ok(())
        }
    }

    fn publish_fix(&mut self, position: Position) {
        self.ui.set_status(StatusUpdate::LocationDetected {
            location: position.location(),
            accuracy_meters: position.accuracy_meters(),
        });
        self.ui
            .set_status(StatusUpdate::LastUpdate(position.captured_at()));
    }
}
