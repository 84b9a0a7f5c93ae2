// firewatch_core/src/lib.rs

// This file defines the public modules of the library.
pub mod config;
pub mod coordinator;
pub mod error;
pub mod geo;
pub mod hazards;
pub mod hydrants;
pub mod location;
pub mod prelude;
pub mod snapshot;
pub mod surface;
pub mod types;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_support;
