// firewatch_sim/src/prelude.rs

// Re-export bevy's prelude for convenience
pub use bevy::prelude::*;

// Re-export the shared coordinator types used across the plugins.
pub use firewatch_core::prelude::{
    ActionError, CoordinatorConfig, LatLng, LocationError, LocationEvent, LocationSource,
    MarkerLifecycleCoordinator, Position, RequestOptions, RequestTicket, SessionPhase,
    SubscriptionHandle, Timestamp,
};

// Re-export the most commonly used simulation types.
pub use crate::simulation::config::{DeviceConfig, OperatorAction, OperatorStep, ScenarioConfig};
pub use crate::simulation::core::app_state::{AppState, LoadSet, SimulationSet};
pub use crate::simulation::core::clock::SimClock;
