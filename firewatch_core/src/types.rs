// firewatch_core/src/types.rs

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// --- Core Type Aliases ---
pub type Timestamp = DateTime<Utc>;

/// `at + delta`, saturating at the last representable instant.
pub fn saturating_after(at: Timestamp, delta: TimeDelta) -> Timestamp {
    at.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// A bare geographic coordinate in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lat: {:.6}, Lng: {:.6}", self.lat, self.lng)
    }
}

/// One successfully obtained position reading (a "fix").
///
/// Only a `LocationSource` should produce these. The fields are private so a
/// fix cannot be edited after the provider hands it over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    location: LatLng,
    accuracy_meters: f64,
    captured_at: Timestamp,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64, accuracy_meters: f64, captured_at: Timestamp) -> Self {
        Self {
            location: LatLng::new(latitude, longitude),
            accuracy_meters,
            captured_at,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.location.lat
    }

    pub fn longitude(&self) -> f64 {
        self.location.lng
    }

    pub fn location(&self) -> LatLng {
        self.location
    }

    pub fn accuracy_meters(&self) -> f64 {
        self.accuracy_meters
    }

    pub fn captured_at(&self) -> Timestamp {
        self.captured_at
    }
}

/// Severity of a hazard point.
///
/// Simulated incidents only ever draw from `SIMULATED`; `Emergency` is the
/// fixed tag carried by operator reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Emergency,
}

impl Severity {
    pub const SIMULATED: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Emergency => "Emergency",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
