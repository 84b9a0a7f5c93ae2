// firewatch_core/src/location/mod.rs

//! The contract for anything that can produce position fixes.
//!
//! Platform geolocation APIs are callback based. Here a request returns a
//! ticket immediately and the outcome is delivered later as a
//! [`LocationEvent`], which the coordinator drains in delivery order. That
//! gives every request one explicit suspension point with a typed result, and
//! lets tests drive the coordinator with a scripted source.

use serde::Deserialize;
use std::time::Duration;

use crate::error::LocationError;
use crate::types::Position;

/// Identifies one outstanding one-shot request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RequestTicket(pub u64);

/// Identifies one continuous subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SubscriptionHandle(pub u64);

/// Provider options for a single request or a continuous watch.
///
/// The request `timeout_ms` and the cached-fix `maximum_age_ms` are separate
/// knobs and must not be conflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestOptions {
    pub high_accuracy: bool,
    pub timeout_ms: u64,
    pub maximum_age_ms: u64,
}

impl RequestOptions {
    /// Defaults for the operator's one-shot "Locate" request.
    pub const ONE_SHOT: RequestOptions = RequestOptions {
        high_accuracy: true,
        timeout_ms: 10_000,
        maximum_age_ms: 0,
    };

    /// Defaults for continuous tracking: a longer timeout and tolerance for
    /// cached fixes up to 30 s old.
    pub const CONTINUOUS: RequestOptions = RequestOptions {
        high_accuracy: true,
        timeout_ms: 15_000,
        maximum_age_ms: 30_000,
    };

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn maximum_age(&self) -> Duration {
        Duration::from_millis(self.maximum_age_ms)
    }
}

/// A delivery from the provider.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    /// Resolution of a one-shot request.
    OneShot {
        ticket: RequestTicket,
        result: Result<Position, LocationError>,
    },
    /// A fix for a continuous subscription.
    Update {
        subscription: SubscriptionHandle,
        position: Position,
    },
    /// A continuous subscription failed to produce a fix.
    WatchError {
        subscription: SubscriptionHandle,
        error: LocationError,
    },
}

/// Wraps the platform's one-shot and continuous position providers.
///
/// Implementations only queue events; they must never touch map or storage
/// state. `Send + Sync` so a host can keep the coordinator in shared state.
pub trait LocationSource: Send + Sync {
    /// Starts a one-shot request. Fails immediately only when the
    /// environment has no provider at all.
    fn request_once(&mut self, options: &RequestOptions) -> Result<RequestTicket, LocationError>;

    /// Starts continuous tracking. While a subscription is active, calling
    /// this again returns the same handle and starts nothing new.
    fn start_continuous(
        &mut self,
        options: &RequestOptions,
    ) -> Result<SubscriptionHandle, LocationError>;

    /// Cancels a subscription. Unknown or already stopped handles are ignored.
    fn stop(&mut self, handle: SubscriptionHandle);

    /// The currently active subscription, if any.
    fn active_subscription(&self) -> Option<SubscriptionHandle>;

    /// Removes and returns every event delivered since the previous call,
    /// in delivery order.
    fn drain_events(&mut self) -> Vec<LocationEvent>;
}

/// Book-keeping for the "at most one continuous subscription" rule, shared
/// by source implementations.
#[derive(Debug, Default, Clone)]
pub struct WatchSlot {
    active: Option<SubscriptionHandle>,
    next_id: u64,
}

impl WatchSlot {
    /// Returns the active handle and whether it was newly created.
    pub fn start(&mut self) -> (SubscriptionHandle, bool) {
        if let Some(handle) = self.active {
            return (handle, false);
        }
        self.next_id += 1;
        let handle = SubscriptionHandle(self.next_id);
        self.active = Some(handle);
        (handle, true)
    }

    /// Returns true if `handle` was the active subscription.
    pub fn stop(&mut self, handle: SubscriptionHandle) -> bool {
        if self.active == Some(handle) {
            self.active = None;
            true
        } else {
            false
        }
    }

    pub fn active(&self) -> Option<SubscriptionHandle> {
        self.active
    }

    pub fn is_active(&self, handle: SubscriptionHandle) -> bool {
        self.active == Some(handle)
    }
}

/// A source for environments without any geolocation provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGeolocation;

impl LocationSource for NoGeolocation {
    fn request_once(&mut self, _options: &RequestOptions) -> Result<RequestTicket, LocationError> {
        Err(LocationError::Unsupported)
    }

    fn start_continuous(
        &mut self,
        _options: &RequestOptions,
    ) -> Result<SubscriptionHandle, LocationError> {
        Err(LocationError::Unsupported)
    }

    fn stop(&mut self, _handle: SubscriptionHandle) {}

    fn active_subscription(&self) -> Option<SubscriptionHandle> {
        None
    }

    fn drain_events(&mut self) -> Vec<LocationEvent> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_slot_start_is_idempotent() {
        let mut slot = WatchSlot::default();
        let (first, created) = slot.start();
        assert!(created);
        let (second, created_again) = slot.start();
        assert!(!created_again);
        assert_eq!(first, second);
    }

    #[test]
    fn test_watch_slot_issues_fresh_handle_after_stop() {
        let mut slot = WatchSlot::default();
        let (first, _) = slot.start();
        assert!(slot.stop(first));
        assert!(!slot.stop(first));
        assert_eq!(slot.active(), None);

        let (second, created) = slot.start();
        assert!(created);
        assert_ne!(first, second);
        assert!(slot.is_active(second));
        assert!(!slot.is_active(first));
    }

    #[test]
    fn test_continuous_defaults_are_more_tolerant_than_one_shot() {
        assert!(RequestOptions::CONTINUOUS.timeout() > RequestOptions::ONE_SHOT.timeout());
        assert!(RequestOptions::CONTINUOUS.maximum_age() > RequestOptions::ONE_SHOT.maximum_age());
        assert!(RequestOptions::ONE_SHOT.high_accuracy);
    }

    #[test]
    fn test_no_geolocation_reports_unsupported() {
        let mut source = NoGeolocation;
        assert_eq!(
            source.request_once(&RequestOptions::ONE_SHOT),
            Err(LocationError::Unsupported)
        );
        assert_eq!(
            source.start_continuous(&RequestOptions::CONTINUOUS),
            Err(LocationError::Unsupported)
        );
        assert!(source.drain_events().is_empty());
    }
}
