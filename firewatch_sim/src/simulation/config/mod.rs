// firewatch_sim/src/simulation/config/mod.rs

//! Loads and validates the scenario file and the hydrant catalog.
//!
//! Loading happens before the bevy `App` is built, so a broken scenario is
//! reported on the command line instead of inside a half-initialised run.

mod catalog;

pub mod structs;

use bevy::prelude::*;
use figment::{
    providers::{Format, Toml},
    Figment,
};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cli::Cli;
use firewatch_core::prelude::InvalidSetting;
pub use catalog::{load_hydrant_catalog, HydrantCatalogFile};
pub use structs::{
    DeviceConfig, OperatorAction, OperatorStep, OutageWindow, PermissionSetting, ScenarioConfig,
    SimulationSettings, Waypoint,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("scenario file not found at {0:?}")]
    MissingScenario(PathBuf),
    #[error("failed to parse scenario {path:?}: {source}")]
    Scenario {
        path: PathBuf,
        #[source]
        source: Box<figment::Error>,
    },
    #[error("failed to parse hydrant catalog entry {path:?}: {source}")]
    Catalog {
        path: PathBuf,
        #[source]
        source: Box<figment::Error>,
    },
    #[error("invalid scenario: {0}")]
    Invalid(String),
    #[error("invalid scenario: {0}")]
    Coordinator(#[from] InvalidSetting),
}

/// Reads the scenario named on the command line, applies the CLI overrides
/// and validates the result.
pub fn load_scenario(cli: &Cli) -> Result<ScenarioConfig, ConfigError> {
    let path = cli.scenario.as_path();
    if !path.exists() {
        return Err(ConfigError::MissingScenario(path.to_path_buf()));
    }
    info!("Loading scenario from: {:?}", path);

    let mut config = extract(Figment::new().merge(Toml::file(path)), path)?;
    apply_overrides(&mut config, cli);
    validate(&config)?;
    Ok(config)
}

/// Parses and validates a scenario held in memory.
pub fn parse_scenario(text: &str) -> Result<ScenarioConfig, ConfigError> {
    let config = extract(Figment::new().merge(Toml::string(text)), Path::new("<inline>"))?;
    validate(&config)?;
    Ok(config)
}

fn extract(figment: Figment, path: &Path) -> Result<ScenarioConfig, ConfigError> {
    figment.extract().map_err(|source| ConfigError::Scenario {
        path: path.to_path_buf(),
        source: Box::new(source),
    })
}

pub fn apply_overrides(config: &mut ScenarioConfig, cli: &Cli) {
    if let Some(seed) = cli.seed {
        config.simulation.seed = Some(seed);
    }
    if let Some(dir) = &cli.state_dir {
        config.simulation.state_dir = dir.clone();
    }
    if let Some(tag) = &cli.device_tag {
        config.simulation.device_tag = Some(tag.clone());
    }
}

/// Rejects values the run loop or the simulated handset cannot work with.
pub fn validate(config: &ScenarioConfig) -> Result<(), ConfigError> {
    let sim = &config.simulation;
    positive("simulation.duration_seconds", sim.duration_seconds)?;
    positive("simulation.frame_rate_hz", sim.frame_rate_hz)?;
    if !sim.summary_interval_seconds.is_finite() || sim.summary_interval_seconds < 0.0 {
        return Err(invalid("simulation.summary_interval_seconds must be >= 0"));
    }

    let device = &config.device;
    positive("device.watch_rate_hz", device.watch_rate_hz)?;
    if !device.noise_stddev_meters.is_finite() || device.noise_stddev_meters < 0.0 {
        return Err(invalid("device.noise_stddev_meters must be >= 0"));
    }
    if !device.reported_accuracy_meters.is_finite() || device.reported_accuracy_meters < 0.0 {
        return Err(invalid("device.reported_accuracy_meters must be >= 0"));
    }
    if device.track.is_empty() {
        return Err(invalid("device.track needs at least one waypoint"));
    }
    for pair in device.track.windows(2) {
        if pair[1].at_secs < pair[0].at_secs {
            return Err(invalid(format!(
                "device.track waypoints must be in time order (t={} after t={})",
                pair[1].at_secs, pair[0].at_secs
            )));
        }
    }
    if let Some(bad) = device.track.iter().find(|w| !w.location().is_valid()) {
        return Err(invalid(format!(
            "device.track waypoint at t={} is not a valid coordinate",
            bad.at_secs
        )));
    }
    if let Some(bad) = device
        .outages
        .iter()
        .find(|o| o.start_secs.partial_cmp(&o.end_secs) != Some(Ordering::Less)) {
        return Err(invalid(format!(
            "device.outages window {}..{} is empty",
            bad.start_secs, bad.end_secs
        )));
    }

    if let Some(bad) = config
        .operator
        .iter()
        .find(|step| !step.at_secs.is_finite() || step.at_secs < 0.0)
    {
        return Err(invalid(format!(
            "operator step {:?} has a negative or non-finite time",
            bad.action
        )));
    }

    config.coordinator.validate()?;
    Ok(())
}

fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be > 0, got {value}")))
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}
