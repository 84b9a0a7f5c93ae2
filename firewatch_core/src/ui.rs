// firewatch_core/src/ui.rs

//! The status/toast side of the widget. The coordinator only talks to the
//! UI through [`UiBinding`]; widgets, DOM and styling live behind it.

use std::time::Duration;

use crate::types::{LatLng, Timestamp};

/// Default time a toast stays on screen.
pub const DEFAULT_TOAST: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub duration: Duration,
}

impl Notification {
    pub fn new(message: impl Into<String>, level: NotificationLevel) -> Self {
        Self {
            message: message.into(),
            level,
            duration: DEFAULT_TOAST,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, NotificationLevel::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, NotificationLevel::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, NotificationLevel::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, NotificationLevel::Error)
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Operator-facing controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Control {
    Locate,
    Report,
    ToggleHydrants,
    ShareLocation,
}

impl Control {
    pub const ALL: [Control; 4] = [
        Control::Locate,
        Control::Report,
        Control::ToggleHydrants,
        Control::ShareLocation,
    ];
}

/// What a control currently shows and whether it accepts activations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlState {
    pub enabled: bool,
    pub label: &'static str,
}

/// Status panel updates.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    LocationDetected {
        location: LatLng,
        accuracy_meters: f64,
    },
    Tracking(bool),
    ActiveHazards(usize),
    LastUpdate(Timestamp),
}

/// Receives status text, toasts and control state from the coordinator.
pub trait UiBinding: Send + Sync {
    fn notify(&mut self, notification: Notification);

    fn set_status(&mut self, update: StatusUpdate);

    fn set_control(&mut self, control: Control, state: &ControlState);
}
