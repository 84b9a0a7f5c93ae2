// firewatch_core/src/coordinator/controls.rs

//! Enabled/label state of the operator controls.
//!
//! The guard here is the real reentrancy check: a control that is busy or
//! cooling down refuses activations regardless of what the widget shows.

use std::collections::BTreeMap;

use crate::error::ActionError;
use crate::types::Timestamp;
use crate::ui::{Control, ControlState, UiBinding};

pub const LOCATE_IDLE: &str = "Locate Me";
pub const LOCATE_BUSY: &str = "Locating...";
pub const LOCATE_AGAIN: &str = "Update Location";
pub const REPORT_IDLE: &str = "Report Fire Emergency";
pub const REPORT_BUSY: &str = "Reporting...";
pub const HYDRANTS_SHOW: &str = "Show Hydrants";
pub const HYDRANTS_HIDE: &str = "Hide Hydrants";
pub const SHARE_IDLE: &str = "Share Location";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPhase {
    Ready,
    /// A request started by this control has not resolved yet.
    Busy,
    CoolingDown { until: Timestamp },
    /// Feature switched off or coordinator torn down.
    Disabled,
}

#[derive(Debug, Clone)]
struct Entry {
    phase: ControlPhase,
    idle_label: &'static str,
    shown_label: &'static str,
}

#[derive(Debug, Clone)]
pub struct ControlPanel {
    entries: BTreeMap<Control, Entry>,
}

impl Default for ControlPanel {
    fn default() -> Self {
        let entries = Control::ALL
            .into_iter()
            .map(|control| {
                let idle_label = match control {
                    Control::Locate => LOCATE_IDLE,
                    Control::Report => REPORT_IDLE,
                    Control::ToggleHydrants => HYDRANTS_HIDE,
                    Control::ShareLocation => SHARE_IDLE,
                };
                let entry = Entry {
                    phase: ControlPhase::Ready,
                    idle_label,
                    shown_label: idle_label,
                };
                (control, entry)
            })
            .collect();
        Self { entries }
    }
}

impl ControlPanel {
    pub fn phase(&self, control: Control) -> ControlPhase {
        self.entries
            .get(&control)
            .map_or(ControlPhase::Disabled, |entry| entry.phase)
    }

    pub fn state(&self, control: Control) -> ControlState {
        match self.entries.get(&control) {
            Some(entry) => ControlState {
                enabled: entry.phase == ControlPhase::Ready,
                label: entry.shown_label,
            },
            None => ControlState {
                enabled: false,
                label: "",
            },
        }
    }

    /// Refuses the activation if the control is not ready.
    pub fn check(&self, control: Control) -> Result<(), ActionError> {
        match self.phase(control) {
            ControlPhase::Ready => Ok(()),
            ControlPhase::Busy => Err(ActionError::Busy),
            ControlPhase::CoolingDown { .. } => Err(ActionError::CoolingDown),
            ControlPhase::Disabled => Err(ActionError::Disabled),
        }
    }

    pub fn publish_all(&self, ui: &mut dyn UiBinding) {
        for control in Control::ALL {
            ui.set_control(control, &self.state(control));
        }
    }

    pub fn begin(&mut self, control: Control, busy_label: &'static str, ui: &mut dyn UiBinding) {
        self.update(control, ControlPhase::Busy, Some(busy_label), ui);
    }

    pub fn cool_down(
        &mut self,
        control: Control,
        until: Timestamp,
        label: &'static str,
        ui: &mut dyn UiBinding,
    ) {
        self.update(control, ControlPhase::CoolingDown { until }, Some(label), ui);
    }

    /// Back to ready, optionally with a new idle label.
    pub fn release(
        &mut self,
        control: Control,
        idle_label: Option<&'static str>,
        ui: &mut dyn UiBinding,
    ) {
        if let (Some(entry), Some(label)) = (self.entries.get_mut(&control), idle_label) {
            entry.idle_label = label;
        }
        self.update(control, ControlPhase::Ready, None, ui);
    }

    pub fn set_idle_label(&mut self, control: Control, label: &'static str, ui: &mut dyn UiBinding) {
        let Some(entry) = self.entries.get_mut(&control) else {
            return;
        };
        entry.idle_label = label;
        if entry.phase == ControlPhase::Ready {
            entry.shown_label = label;
            ui.set_control(control, &self.state(control));
        }
    }

    pub fn disable(&mut self, control: Control, ui: &mut dyn UiBinding) {
        self.update(control, ControlPhase::Disabled, None, ui);
    }

    /// Releases every cooldown that has elapsed by `now`.
    pub fn release_expired(&mut self, now: Timestamp, ui: &mut dyn UiBinding) {
        let expired: Vec<Control> = self
            .entries
            .iter()
            .filter_map(|(control, entry)| match entry.phase {
                ControlPhase::CoolingDown { until } if now >= until => Some(*control),
                _ => None,
            })
            .collect();
        for control in expired {
            self.release(control, None, ui);
        }
    }

    fn update(
        &mut self,
        control: Control,
        phase: ControlPhase,
        label: Option<&'static str>,
        ui: &mut dyn UiBinding,
    ) {
        let Some(entry) = self.entries.get_mut(&control) else {
            return;
        };
        entry.phase = phase;
        entry.shown_label = label.unwrap_or(entry.idle_label);
        ui.set_control(control, &self.state(control));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, RecordingUi};

    #[test]
    fn test_busy_control_refuses_activation() {
        let mut ui = RecordingUi::default();
        let mut panel = ControlPanel::default();

        assert_eq!(panel.check(Control::Locate), Ok(()));
        panel.begin(Control::Locate, LOCATE_BUSY, &mut ui);
        assert_eq!(panel.check(Control::Locate), Err(ActionError::Busy));
        assert_eq!(
            ui.control(Control::Locate),
            Some(ControlState {
                enabled: false,
                label: LOCATE_BUSY
            })
        );

        panel.release(Control::Locate, Some(LOCATE_AGAIN), &mut ui);
        assert_eq!(panel.check(Control::Locate), Ok(()));
        assert_eq!(panel.state(Control::Locate).label, LOCATE_AGAIN);
    }

    #[test]
    fn test_cooldown_releases_at_deadline() {
        let mut ui = RecordingUi::default();
        let mut panel = ControlPanel::default();
        panel.cool_down(Control::Report, at(2), REPORT_BUSY, &mut ui);

        panel.release_expired(at(1), &mut ui);
        assert_eq!(panel.check(Control::Report), Err(ActionError::CoolingDown));

        panel.release_expired(at(2), &mut ui);
        assert_eq!(panel.check(Control::Report), Ok(()));
        assert_eq!(panel.state(Control::Report).label, REPORT_IDLE);
    }

    #[test]
    fn test_idle_label_change_waits_for_ready() {
        let mut ui = RecordingUi::default();
        let mut panel = ControlPanel::default();
        panel.begin(Control::ToggleHydrants, "Working...", &mut ui);
        panel.set_idle_label(Control::ToggleHydrants, HYDRANTS_SHOW, &mut ui);
        assert_eq!(panel.state(Control::ToggleHydrants).label, "Working...");

        panel.release(Control::ToggleHydrants, None, &mut ui);
        assert_eq!(panel.state(Control::ToggleHydrants).label, HYDRANTS_SHOW);
    }
}
