// firewatch_sim/src/simulation/config/catalog.rs

//! Surveyed hydrants kept as one TOML file per district under the catalog
//! directory.

use bevy::prelude::*;
use figment::{
    providers::{Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::path::Path;
use walkdir::WalkDir;

use super::ConfigError;
use firewatch_core::prelude::Hydrant;

/// The contents of one catalog file.
///
/// ```toml
/// district = "Poblacion"
///
/// [[hydrants]]
/// lat = 14.280248
/// lng = 121.394529
/// condition = "Operational"
/// pressure = "Low"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct HydrantCatalogFile {
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub hydrants: Vec<Hydrant>,
}

/// Walks `dir` for `.toml` files and concatenates their hydrants in file-name
/// order. A missing directory yields an empty list; a malformed file is an
/// error.
pub fn load_hydrant_catalog(dir: &Path) -> Result<Vec<Hydrant>, ConfigError> {
    if !dir.exists() {
        warn!(
            "Hydrant catalog not found at {:?}, keeping the configured registry.",
            dir
        );
        return Ok(Vec::new());
    }

    info!("Loading hydrant catalog from: {:?}", dir);

    let mut hydrants = Vec::new();
    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| {
            !e.file_type().is_dir() && e.path().extension().is_some_and(|ext| ext == "toml")
        })
    {
        let path = entry.path();
        let file: HydrantCatalogFile = Figment::new()
            .merge(Toml::file(path))
            .extract()
            .map_err(|source| ConfigError::Catalog {
                path: path.to_path_buf(),
                source: Box::new(source),
            })?;

        info!(
            "Loaded {} hydrants for '{}'",
            file.hydrants.len(),
            file.district.as_deref().unwrap_or("unnamed district")
        );
        hydrants.extend(file.hydrants);
    }
    Ok(hydrants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use firewatch_core::hydrants::{HydrantCondition, WaterPressure};

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).expect("write catalog file");
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let hydrants = load_hydrant_catalog(&dir.path().join("nope")).expect("no error");
        assert!(hydrants.is_empty());
    }

    #[test]
    fn test_files_are_read_in_name_order_and_others_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            "b_lakeshore.toml",
            "[[hydrants]]\nlat = 14.27\nlng = 121.41\ncondition = \"Unserviceable\"\npressure = \"N/A\"\n",
        );
        write(
            dir.path(),
            "a_poblacion.toml",
            "district = \"Poblacion\"\n[[hydrants]]\nlat = 14.28\nlng = 121.39\ncondition = \"Operational\"\npressure = \"High\"\n",
        );
        write(dir.path(), "README.md", "not a catalog file");

        let hydrants = load_hydrant_catalog(dir.path()).expect("catalog loads");
        assert_eq!(hydrants.len(), 2);
        assert_eq!(hydrants[0].lat, 14.28);
        assert_eq!(hydrants[0].pressure, WaterPressure::High);
        assert_eq!(hydrants[1].condition, HydrantCondition::Unserviceable);
        assert_eq!(hydrants[1].pressure, WaterPressure::Unknown);
    }

    #[test]
    fn test_malformed_file_names_the_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            "broken.toml",
            "[[hydrants]]\nlat = 14.27\nlng = 121.41\ncondition = \"Leaking\"\npressure = \"Low\"\n",
        );
        match load_hydrant_catalog(dir.path()) {
            Err(ConfigError::Catalog { path, .. }) => assert!(path.ends_with("broken.toml")),
            other => panic!("expected a catalog error, got {other:?}"),
        }
    }
}
