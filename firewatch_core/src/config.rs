// firewatch_core/src/config.rs

use chrono::TimeDelta;
use serde::Deserialize;
use url::Url;

use crate::error::InvalidSetting;
use crate::hazards::HazardConfig;
use crate::hydrants::{santa_cruz_hydrants, Hydrant};
use crate::location::RequestOptions;
use crate::snapshot::address::AddressConfig;
use crate::types::LatLng;

/// Upper bound on `hazards.generation.max_count`.
pub const MAX_HAZARDS_PER_PASS: u32 = 100;

/// Upper bound on every report timing and request timeout.
pub const MAX_DELAY_MS: u64 = 24 * 60 * 60 * 1_000;

// =========================================================================
// == Top-Level Coordinator Configuration ==
// =========================================================================

/// # CoordinatorConfig
/// Every tunable of the marker lifecycle coordinator. All sections are
/// optional in the source file; missing ones take the Santa Cruz demo values.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatorConfig {
    pub map: MapConfig,
    pub geolocation: GeolocationConfig,
    pub hazards: HazardSettings,
    pub report: ReportConfig,
    pub snapshot: SnapshotConfig,
    pub address: AddressConfig,
    pub handoff: HandoffConfig,
    pub hydrants: Vec<Hydrant>,
    pub contacts: Vec<EmergencyContact>,
    pub features: FeatureFlags,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            map: MapConfig::default(),
            geolocation: GeolocationConfig::default(),
            hazards: HazardSettings::default(),
            report: ReportConfig::default(),
            snapshot: SnapshotConfig::default(),
            address: AddressConfig::default(),
            handoff: HandoffConfig::default(),
            hydrants: santa_cruz_hydrants(),
            contacts: default_contacts(),
            features: FeatureFlags::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Rejects values the coordinator cannot run with. Hosts call this once
    /// after loading, before building the coordinator.
    pub fn validate(&self) -> Result<(), InvalidSetting> {
        let map = &self.map;
        if !map.center.is_valid() {
            return Err(InvalidSetting::new("map.center", format!("{} is not a coordinate", map.center)));
        }
        if map.min_zoom > map.max_zoom {
            return Err(InvalidSetting::new(
                "map.min_zoom",
                format!("{} is above max_zoom {}", map.min_zoom, map.max_zoom),
            ));
        }
        if let Some(bounds) = map.bounds {
            if !bounds.is_valid() {
                return Err(InvalidSetting::new(
                    "map.bounds",
                    "corners must be valid with south_west below and left of north_east",
                ));
            }
        }

        for (field, options) in [
            ("geolocation.one_shot.timeout_ms", self.geolocation.one_shot),
            ("geolocation.continuous.timeout_ms", self.geolocation.continuous),
        ] {
            if options.timeout_ms == 0 || options.timeout_ms > MAX_DELAY_MS {
                return Err(InvalidSetting::new(
                    field,
                    format!("must be in 1..={MAX_DELAY_MS}, got {}", options.timeout_ms),
                ));
            }
        }

        let generation = &self.hazards.generation;
        finite_positive("hazards.generation.radius_meters", generation.radius_meters)?;
        finite_positive("hazards.generation.meters_per_degree", generation.meters_per_degree)?;
        let (_, max_count) = generation.count_range();
        if max_count > MAX_HAZARDS_PER_PASS {
            return Err(InvalidSetting::new(
                "hazards.generation.max_count",
                format!("at most {MAX_HAZARDS_PER_PASS} hazards per pass, got {max_count}"),
            ));
        }
        finite_non_negative(
            "hazards.displacement_threshold_meters",
            self.hazards.displacement_threshold_meters,
        )?;

        let report = &self.report;
        for (field, ms) in [
            ("report.cooldown_ms", report.cooldown_ms),
            ("report.response_delay_ms", report.response_delay_ms),
            ("report.response_lifetime_ms", report.response_lifetime_ms),
        ] {
            if ms > MAX_DELAY_MS {
                return Err(InvalidSetting::new(field, format!("must be <= {MAX_DELAY_MS}, got {ms}")));
            }
        }
        finite_non_negative("report.response_jitter_degrees", report.response_jitter_degrees)?;

        if self.snapshot.staleness_secs == 0 {
            return Err(InvalidSetting::new("snapshot.staleness_secs", "must be > 0"));
        }
        if let Some(index) = self.hydrants.iter().position(|h| !h.location().is_valid()) {
            return Err(InvalidSetting::new(
                "hydrants",
                format!("entry {index} is not a valid coordinate"),
            ));
        }
        if let Some(base) = &self.handoff.share_base_url {
            Url::parse(base)
                .map_err(|err| InvalidSetting::new("handoff.share_base_url", err.to_string()))?;
        }
        Ok(())
    }
}

fn finite_positive(field: &'static str, value: f64) -> Result<(), InvalidSetting> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(InvalidSetting::new(field, format!("must be finite and > 0, got {value}")))
    }
}

fn finite_non_negative(field: &'static str, value: f64) -> Result<(), InvalidSetting> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(InvalidSetting::new(field, format!("must be finite and >= 0, got {value}")))
    }
}

// =========================================================================
// == Configuration Sub-Structs ==
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl MapBounds {
    pub fn contains(&self, point: LatLng) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&point.lat)
            && (self.south_west.lng..=self.north_east.lng).contains(&point.lng)
    }

    /// Both corners valid and the south-west corner not north or east of
    /// the north-east one.
    pub fn is_valid(&self) -> bool {
        self.south_west.is_valid()
            && self.north_east.is_valid()
            && self.south_west.lat <= self.north_east.lat
            && self.south_west.lng <= self.north_east.lng
    }

    /// The closest point inside the bounds. Invalid bounds leave `point` as is.
    pub fn clamp(&self, point: LatLng) -> LatLng {
        if !self.is_valid() {
            return point;
        }
        LatLng::new(
            point.lat.max(self.south_west.lat).min(self.north_east.lat),
            point.lng.max(self.south_west.lng).min(self.north_east.lng),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    pub center: LatLng,
    pub zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Zoom used when centering on a fresh fix or a report.
    pub locate_zoom: u8,
    pub bounds: Option<MapBounds>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: LatLng::new(14.2833, 121.4194),
            zoom: 13,
            min_zoom: 10,
            max_zoom: 18,
            locate_zoom: 15,
            bounds: Some(MapBounds {
                south_west: LatLng::new(14.20, 121.35),
                north_east: LatLng::new(14.32, 121.45),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeolocationConfig {
    pub one_shot: RequestOptions,
    pub continuous: RequestOptions,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            one_shot: RequestOptions::ONE_SHOT,
            continuous: RequestOptions::CONTINUOUS,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HazardSettings {
    pub generation: HazardConfig,
    /// Continuous fixes closer than this to the last generation point leave
    /// the hazard set alone.
    pub displacement_threshold_meters: f64,
}

impl Default for HazardSettings {
    fn default() -> Self {
        Self {
            generation: HazardConfig::default(),
            displacement_threshold_meters: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// How long the Report control stays disabled after a report.
    pub cooldown_ms: u64,
    pub response_delay_ms: u64,
    pub response_lifetime_ms: u64,
    pub eta_minutes_min: u32,
    pub eta_minutes_max: u32,
    /// Maximum offset of the response marker from the report, per axis.
    pub response_jitter_degrees: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 2_000,
            response_delay_ms: 1_000,
            response_lifetime_ms: 30_000,
            eta_minutes_min: 3,
            eta_minutes_max: 7,
            response_jitter_degrees: 0.005,
        }
    }
}

impl ReportConfig {
    pub fn cooldown(&self) -> TimeDelta {
        millis(self.cooldown_ms)
    }

    pub fn response_delay(&self) -> TimeDelta {
        millis(self.response_delay_ms)
    }

    pub fn response_lifetime(&self) -> TimeDelta {
        millis(self.response_lifetime_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnapshotConfig {
    /// Snapshots at least this old are ignored.
    pub staleness_secs: u64,
    /// The storage key is `"{key_prefix}:{device_tag}"`.
    pub key_prefix: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            staleness_secs: 3_600,
            key_prefix: "firewatch.location".to_string(),
        }
    }
}

impl SnapshotConfig {
    pub fn staleness_window(&self) -> TimeDelta {
        i64::try_from(self.staleness_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HandoffConfig {
    /// Page that accepts a `loc` query parameter, e.g. the dashboard.
    pub share_base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmergencyContact {
    pub agency: String,
    pub number: String,
}

fn default_contacts() -> Vec<EmergencyContact> {
    [
        ("BFP Santa Cruz", "(049) 808-1234"),
        ("Police", "(049) 808-5678"),
        ("Hospital", "(049) 808-9012"),
    ]
    .into_iter()
    .map(|(agency, number)| EmergencyContact {
        agency: agency.to_string(),
        number: number.to_string(),
    })
    .collect()
}

/// Switches between the feature sets of the widget variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureFlags {
    pub hydrants: bool,
    /// Start continuous tracking after the first successful locate.
    pub auto_track: bool,
    pub persist_snapshots: bool,
    pub response_team: bool,
    pub handoff: bool,
    /// Show a still-valid persisted snapshot on start.
    pub restore_on_start: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            hydrants: true,
            auto_track: true,
            persist_snapshots: true,
            response_team: true,
            handoff: true,
            restore_on_start: true,
        }
    }
}

pub(crate) fn millis(ms: u64) -> TimeDelta {
    i64::try_from(ms)
        .ok()
        .and_then(TimeDelta::try_milliseconds)
        .unwrap_or(TimeDelta::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_demo_defaults() {
        let config: CoordinatorConfig = toml::from_str("").expect("empty config parses");
        assert_eq!(config.map.center, LatLng::new(14.2833, 121.4194));
        assert_eq!(config.map.locate_zoom, 15);
        assert_eq!(config.hazards.displacement_threshold_meters, 100.0);
        assert_eq!(config.hazards.generation.min_count, 2);
        assert_eq!(config.hazards.generation.max_count, 4);
        assert_eq!(config.hydrants.len(), 10);
        assert_eq!(config.contacts.len(), 3);
        assert_eq!(config.snapshot.staleness_window(), TimeDelta::hours(1));
        assert!(config.features.auto_track);
    }

    #[test]
    fn test_partial_sections_override_only_named_fields() {
        let config: CoordinatorConfig = toml::from_str(
            r#"
            [hazards]
            displacement_threshold_meters = 250.0

            [geolocation.one_shot]
            high_accuracy = true
            timeout_ms = 12000
            maximum_age_ms = 0

            [features]
            hydrants = false
            "#,
        )
        .expect("config parses");

        assert_eq!(config.hazards.displacement_threshold_meters, 250.0);
        assert_eq!(config.hazards.generation.radius_meters, 3_000.0);
        assert_eq!(config.geolocation.one_shot.timeout_ms, 12_000);
        assert_eq!(config.geolocation.continuous.maximum_age_ms, 30_000);
        assert!(!config.features.hydrants);
        assert!(config.features.handoff);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result: Result<CoordinatorConfig, _> = toml::from_str("[map]\nzooom = 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_defaults_validate() {
        assert_eq!(CoordinatorConfig::default().validate(), Ok(()));
    }

    fn assert_rejected(field: &str, mutate: impl FnOnce(&mut CoordinatorConfig)) {
        let mut config = CoordinatorConfig::default();
        mutate(&mut config);
        let err = config.validate().expect_err(field);
        assert_eq!(err.field, field, "{err}");
    }

    #[test]
    fn test_validate_names_the_offending_setting() {
        assert_rejected("map.center", |c| c.map.center = LatLng::new(f64::NAN, 121.0));
        assert_rejected("map.min_zoom", |c| c.map.min_zoom = 19);
        assert_rejected("map.bounds", |c| {
            c.map.bounds = Some(MapBounds {
                south_west: LatLng::new(14.32, 121.35),
                north_east: LatLng::new(14.20, 121.45),
            })
        });
        assert_rejected("map.bounds", |c| {
            c.map.bounds = Some(MapBounds {
                south_west: LatLng::new(14.20, f64::NAN),
                north_east: LatLng::new(14.32, 121.45),
            })
        });
        assert_rejected("geolocation.one_shot.timeout_ms", |c| c.geolocation.one_shot.timeout_ms = 0);
        assert_rejected("geolocation.continuous.timeout_ms", |c| {
            c.geolocation.continuous.timeout_ms = u64::MAX
        });
        assert_rejected("hazards.generation.radius_meters", |c| {
            c.hazards.generation.radius_meters = f64::INFINITY
        });
        assert_rejected("hazards.generation.radius_meters", |c| c.hazards.generation.radius_meters = -5.0);
        assert_rejected("hazards.generation.meters_per_degree", |c| {
            c.hazards.generation.meters_per_degree = 0.0
        });
        assert_rejected("hazards.generation.max_count", |c| c.hazards.generation.max_count = 1_000_000);
        assert_rejected("hazards.displacement_threshold_meters", |c| {
            c.hazards.displacement_threshold_meters = f64::NAN
        });
        assert_rejected("report.cooldown_ms", |c| c.report.cooldown_ms = 9_000_000_000_000_000);
        assert_rejected("report.response_delay_ms", |c| c.report.response_delay_ms = u64::MAX);
        assert_rejected("report.response_lifetime_ms", |c| c.report.response_lifetime_ms = u64::MAX);
        assert_rejected("report.response_jitter_degrees", |c| {
            c.report.response_jitter_degrees = f64::INFINITY
        });
        assert_rejected("report.response_jitter_degrees", |c| c.report.response_jitter_degrees = -0.1);
        assert_rejected("snapshot.staleness_secs", |c| c.snapshot.staleness_secs = 0);
        assert_rejected("hydrants", |c| c.hydrants[3].lat = 95.0);
        assert_rejected("handoff.share_base_url", |c| {
            c.handoff.share_base_url = Some("not a url".to_string())
        });
    }

    #[test]
    fn test_invalid_bounds_leave_points_unclamped() {
        let bounds = MapBounds {
            south_west: LatLng::new(14.32, 121.45),
            north_east: LatLng::new(14.20, 121.35),
        };
        assert!(!bounds.is_valid());
        assert_eq!(bounds.clamp(LatLng::new(14.5, 121.0)), LatLng::new(14.5, 121.0));
    }

    #[test]
    fn test_oversized_durations_saturate() {
        assert_eq!(millis(u64::MAX), TimeDelta::MAX);
        let snapshot = SnapshotConfig {
            staleness_secs: u64::MAX / 2,
            ..SnapshotConfig::default()
        };
        assert_eq!(snapshot.staleness_window(), TimeDelta::MAX);
    }

    #[test]
    fn test_bounds_clamp_and_contains() {
        let bounds = MapConfig::default().bounds.expect("default bounds");
        assert!(bounds.contains(LatLng::new(14.28, 121.41)));
        assert!(!bounds.contains(LatLng::new(14.40, 121.41)));
        assert_eq!(bounds.clamp(LatLng::new(14.40, 121.30)), LatLng::new(14.32, 121.35));
    }
}
