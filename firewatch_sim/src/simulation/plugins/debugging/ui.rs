// firewatch_sim/src/simulation/plugins/debugging/ui.rs

//! A `UiBinding` that writes toasts and status changes to the log.

use bevy::prelude::*;
use std::collections::BTreeMap;

use firewatch_core::prelude::{Control, ControlState, Notification, NotificationLevel, StatusUpdate, UiBinding};

#[derive(Debug, Default)]
pub struct LoggingUi {
    controls: BTreeMap<Control, ControlState>,
    notifications: u64,
}

impl LoggingUi {
    pub fn control(&self, control: Control) -> Option<&ControlState> {
        self.controls.get(&control)
    }

    pub fn notifications(&self) -> u64 {
        self.notifications
    }
}

impl UiBinding for LoggingUi {
    fn notify(&mut self, notification: Notification) {
        self.notifications += 1;
        let message = &notification.message;
        match notification.level {
            NotificationLevel::Info | NotificationLevel::Success => info!("[UI] {}", message),
            NotificationLevel::Warning => warn!("[UI] {}", message),
            NotificationLevel::Error => error!("[UI] {}", message),
        }
    }

    fn set_status(&mut self, update: StatusUpdate) {
        match update {
            StatusUpdate::LocationDetected {
                location,
                accuracy_meters,
            } => debug!("[UI] Location: {} (±{:.0} m)", location, accuracy_meters),
            StatusUpdate::Tracking(on) => {
                debug!("[UI] Tracking: {}", if on { "Active" } else { "Inactive" })
            }
            StatusUpdate::ActiveHazards(count) => debug!("[UI] Active hazards: {}", count),
            StatusUpdate::LastUpdate(at) => debug!("[UI] Last update: {}", at.format("%H:%M:%S")),
        }
    }

    /// Only changes are logged; the coordinator republishes freely.
    fn set_control(&mut self, control: Control, state: &ControlState) {
        if self.controls.get(&control) == Some(state) {
            return;
        }
        debug!(
            "[UI] {:?} button: '{}' ({})",
            control,
            state.label,
            if state.enabled { "enabled" } else { "disabled" }
        );
        self.controls.insert(control, state.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_latest_control_state() {
        let mut ui = LoggingUi::default();
        let busy = ControlState {
            enabled: false,
            label: "Locating...",
        };
        ui.set_control(Control::Locate, &busy);
        ui.set_control(Control::Locate, &busy);
        assert_eq!(ui.control(Control::Locate), Some(&busy));
        assert_eq!(ui.control(Control::Report), None);

        ui.notify(Notification::error("Location request timed out."));
        assert_eq!(ui.notifications(), 1);
    }
}
