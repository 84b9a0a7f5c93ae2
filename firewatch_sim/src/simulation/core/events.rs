// firewatch_sim/src/simulation/core/events.rs
use bevy::prelude::Event;

use crate::simulation::config::OperatorAction;

/// An operator action due this frame.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct OperatorCommand(pub OperatorAction);
