// firewatch_core/src/snapshot/mod.rs

//! Persistence of the latest fix and its portable handoff form.

pub mod address;
pub mod backend;
pub mod handoff;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use crate::config::SnapshotConfig;
use crate::error::{HandoffError, StorageError};
use crate::types::{LatLng, Position, Timestamp};

pub use backend::{FileBackend, MemoryBackend, SnapshotBackend};
pub use handoff::{decode_handoff, encode_handoff, HandoffToken};

/// Identifies one install of the widget.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceTag(String);

impl DeviceTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// A fresh random tag for a first run.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The persisted record of the latest fix.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSnapshot {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: f64,
    pub approximate_address: String,
    pub captured_at: Timestamp,
    pub device_tag: String,
}

impl LocationSnapshot {
    pub fn from_position(position: &Position, approximate_address: String, device: &DeviceTag) -> Self {
        Self {
            latitude: position.latitude(),
            longitude: position.longitude(),
            accuracy_meters: position.accuracy_meters(),
            approximate_address,
            captured_at: position.captured_at(),
            device_tag: device.as_str().to_string(),
        }
    }

    pub fn location(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// The snapshot as a position, e.g. to draw a restored marker.
    pub fn to_position(&self) -> Position {
        Position::new(self.latitude, self.longitude, self.accuracy_meters, self.captured_at)
    }

    /// Coordinates in range and a finite, non-negative accuracy.
    pub fn is_well_formed(&self) -> bool {
        self.location().is_valid() && self.accuracy_meters.is_finite() && self.accuracy_meters >= 0.0
    }
}

/// The staleness rule: usable iff `now - captured_at < window`.
pub fn is_within_window(snapshot: &LocationSnapshot, now: Timestamp, window: TimeDelta) -> bool {
    now.signed_duration_since(snapshot.captured_at) < window
}

// =========================================================================
// == Flat Record Layout ==
// =========================================================================

const FIELD_LATITUDE: &str = "latitude";
const FIELD_LONGITUDE: &str = "longitude";
const FIELD_ACCURACY: &str = "accuracy_meters";
const FIELD_ADDRESS: &str = "approximate_address";
const FIELD_CAPTURED_AT: &str = "captured_at";
const FIELD_DEVICE: &str = "device_tag";

/// A snapshot as flat string/number entries, the way it sits in storage.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SnapshotRecord(pub BTreeMap<String, toml::Value>);

impl SnapshotRecord {
    pub fn from_snapshot(snapshot: &LocationSnapshot) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(FIELD_LATITUDE.to_string(), toml::Value::Float(snapshot.latitude));
        entries.insert(FIELD_LONGITUDE.to_string(), toml::Value::Float(snapshot.longitude));
        entries.insert(FIELD_ACCURACY.to_string(), toml::Value::Float(snapshot.accuracy_meters));
        entries.insert(
            FIELD_ADDRESS.to_string(),
            toml::Value::String(snapshot.approximate_address.clone()),
        );
        entries.insert(
            FIELD_CAPTURED_AT.to_string(),
            toml::Value::String(snapshot.captured_at.to_rfc3339_opts(SecondsFormat::Nanos, true)),
        );
        entries.insert(FIELD_DEVICE.to_string(), toml::Value::String(snapshot.device_tag.clone()));
        Self(entries)
    }

    /// Reads the record back. Any missing or unparseable field means there is
    /// no snapshot at all.
    pub fn to_snapshot(&self) -> Option<LocationSnapshot> {
        let snapshot = LocationSnapshot {
            latitude: self.number(FIELD_LATITUDE)?,
            longitude: self.number(FIELD_LONGITUDE)?,
            accuracy_meters: self.number(FIELD_ACCURACY)?,
            approximate_address: self.text(FIELD_ADDRESS)?.to_string(),
            captured_at: DateTime::parse_from_rfc3339(self.text(FIELD_CAPTURED_AT)?)
                .ok()?
                .with_timezone(&Utc),
            device_tag: self.text(FIELD_DEVICE)?.to_string(),
        };
        snapshot.is_well_formed().then_some(snapshot)
    }

    fn number(&self, field: &str) -> Option<f64> {
        match self.0.get(field)? {
            toml::Value::Float(value) => Some(*value),
            toml::Value::Integer(value) => Some(*value as f64),
            toml::Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    fn text(&self, field: &str) -> Option<&str> {
        self.0.get(field)?.as_str()
    }
}

// =========================================================================
// == Store ==
// =========================================================================

/// One logical snapshot slot per device install.
pub struct SnapshotStore {
    backend: Box<dyn SnapshotBackend>,
    device: DeviceTag,
    key: String,
    staleness: TimeDelta,
    failed_writes: u64,
}

impl SnapshotStore {
    pub fn new(backend: Box<dyn SnapshotBackend>, device: DeviceTag, config: &SnapshotConfig) -> Self {
        let key = format!("{}:{}", config.key_prefix, device.as_str());
        Self {
            backend,
            device,
            key,
            staleness: config.staleness_window(),
            failed_writes: 0,
        }
    }

    pub fn device(&self) -> &DeviceTag {
        &self.device
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Replaces the slot with `snapshot` in one step. Failures are logged and
    /// counted, never returned.
    pub fn write(&mut self, snapshot: &LocationSnapshot) {
        if let Err(err) = self.backend.replace(&self.key, SnapshotRecord::from_snapshot(snapshot)) {
            self.failed_writes += 1;
            warn!(key = %self.key, error = %err, "failed to persist location snapshot");
        } else {
            debug!(key = %self.key, "persisted location snapshot");
        }
    }

    /// The stored snapshot regardless of age, if one is readable.
    pub fn read_latest(&self) -> Option<LocationSnapshot> {
        match self.backend.load(&self.key) {
            Ok(Some(record)) => {
                let snapshot = record.to_snapshot();
                if snapshot.is_none() {
                    debug!(key = %self.key, "ignoring incomplete snapshot record");
                }
                snapshot
            }
            Ok(None) => None,
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to read location snapshot");
                None
            }
        }
    }

    pub fn is_valid(&self, snapshot: &LocationSnapshot, now: Timestamp) -> bool {
        is_within_window(snapshot, now, self.staleness)
    }

    /// The stored snapshot only if it passes the staleness rule.
    pub fn read_valid(&self, now: Timestamp) -> Option<LocationSnapshot> {
        self.read_latest().filter(|snapshot| self.is_valid(snapshot, now))
    }

    pub fn encode_handoff(&self, snapshot: &LocationSnapshot) -> HandoffToken {
        encode_handoff(snapshot)
    }

    pub fn decode_handoff(&self, token: &str) -> Result<LocationSnapshot, HandoffError> {
        decode_handoff(token)
    }

    pub fn failed_writes(&self) -> u64 {
        self.failed_writes
    }
}

/// A file-backed store for `device`, or for the install's persisted tag when
/// none is given. An unusable state directory fails here rather than on the
/// first write.
pub fn open_file_store(
    backend: FileBackend,
    device: Option<DeviceTag>,
    config: &SnapshotConfig,
) -> Result<SnapshotStore, StorageError> {
    let device = match device {
        Some(device) => {
            backend.create_root()?;
            device
        }
        None => backend.load_or_create_device_tag()?,
    };
    Ok(SnapshotStore::new(Box::new(backend), device, config))
}
