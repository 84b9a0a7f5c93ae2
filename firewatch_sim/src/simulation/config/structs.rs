// firewatch_sim/src/simulation/config/structs.rs

use bevy::prelude::Resource;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::path::PathBuf;

use firewatch_core::prelude::{CoordinatorConfig, LatLng, Timestamp};

// =========================================================================
// == Top-Level Scenario Configuration ==
// =========================================================================

/// # ScenarioConfig
/// The root of a scenario file: run settings, the coordinator under test,
/// the simulated handset and the operator script.
#[derive(Resource, Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct ScenarioConfig {
    #[serde(default)] // Use default if the [simulation] section is missing
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    /// Timed operator actions, in any order.
    #[serde(default)]
    pub operator: Vec<OperatorStep>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSettings {
    /// `None` seeds from the OS.
    pub seed: Option<u64>,
    pub duration_seconds: f64,
    /// Wall-clock time of frame zero. Timestamps on fixes and snapshots are
    /// `epoch + elapsed simulation time`.
    pub epoch: Timestamp,
    pub frame_rate_hz: f64,
    pub state_dir: PathBuf,
    /// Hydrant catalog directory. When it holds any entries they replace the
    /// coordinator's hydrant registry.
    pub catalog_dir: PathBuf,
    pub device_tag: Option<String>,
    /// Period of the debug summary line. Zero disables it.
    pub summary_interval_seconds: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            seed: None,
            duration_seconds: 120.0,
            epoch: Utc
                .with_ymd_and_hms(2025, 3, 1, 8, 0, 0)
                .single()
                .unwrap_or_default(),
            frame_rate_hz: 10.0,
            state_dir: PathBuf::from("target/firewatch_state"),
            catalog_dir: PathBuf::from("assets/catalog/hydrants"),
            device_tag: None,
            summary_interval_seconds: 30.0,
        }
    }
}

// =========================================================================
// == Simulated Handset ==
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum PermissionSetting {
    #[default]
    Granted,
    Denied,
}

/// A span of simulation time during which the handset has no signal.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutageWindow {
    pub start_secs: f64,
    pub end_secs: f64,
}

impl OutageWindow {
    pub fn contains(&self, secs: f64) -> bool {
        (self.start_secs..self.end_secs).contains(&secs)
    }
}

/// Where the handset truly is at `at_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Waypoint {
    pub at_secs: f64,
    pub lat: f64,
    pub lng: f64,
}

impl Waypoint {
    pub fn location(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    /// `false` models a browser without a geolocation API.
    pub supported: bool,
    pub permission: PermissionSetting,
    /// Time from a one-shot request to its fix.
    pub fix_latency_ms: u64,
    /// Fix rate of a continuous watch.
    pub watch_rate_hz: f64,
    /// Standard deviation of the horizontal position error, per axis.
    pub noise_stddev_meters: f64,
    /// The accuracy radius the handset claims for each fix.
    pub reported_accuracy_meters: f64,
    pub outages: Vec<OutageWindow>,
    pub track: Vec<Waypoint>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            supported: true,
            permission: PermissionSetting::Granted,
            fix_latency_ms: 800,
            watch_rate_hz: 1.0,
            noise_stddev_meters: 6.0,
            reported_accuracy_meters: 12.0,
            outages: Vec::new(),
            // A slow patrol from the town plaza south-west toward the lakeshore.
            track: vec![
                Waypoint { at_secs: 0.0, lat: 14.2833, lng: 121.4194 },
                Waypoint { at_secs: 60.0, lat: 14.2812, lng: 121.4152 },
                Waypoint { at_secs: 120.0, lat: 14.2790, lng: 121.4100 },
            ],
        }
    }
}

// =========================================================================
// == Operator Script ==
// =========================================================================

/// One scripted operator action.
///
/// ```toml
/// [[operator]]
/// at_secs = 1.0
/// kind = "Locate"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OperatorStep {
    pub at_secs: f64,
    #[serde(flatten)]
    pub action: OperatorAction,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind")] // This tells serde to use the "kind" field to decide which enum variant to parse
#[serde(rename_all = "PascalCase")]
pub enum OperatorAction {
    Locate,
    Report,
    Refresh,
    ToggleHydrants,
    ShareLocation,
    StartTracking,
    StopTracking,
    SetVisibility { visible: bool },
    CallEmergency { confirmed: bool },
    Help,
    Resize,
    ReceiveHandoff { token: String },
    /// Feeds the most recently shared token back in, as a second device would.
    ReceiveLastShare,
    Teardown,
}
