// firewatch_sim/src/cli.rs

use bevy::prelude::Resource;
use clap::Parser;
use std::path::PathBuf;

/// Firewatch: a headless run of the fire-hazard map widget against a
/// simulated handset.
///
/// This struct defines the command-line arguments that can be passed to any
/// binary application that uses the Firewatch simulation library.
#[derive(Parser, Debug, Resource, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(
        short,
        long,
        default_value = "assets/scenarios/santa_cruz_patrol.toml"
    )]
    pub scenario: PathBuf,

    /// Overrides the scenario's PRNG seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Overrides where snapshots and the device tag are kept.
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    /// Runs as this device instead of the persisted (or generated) tag.
    #[arg(long)]
    pub device_tag: Option<String>,
}
