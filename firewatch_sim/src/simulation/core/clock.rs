// firewatch_sim/src/simulation/core/clock.rs

use bevy::prelude::*;
use chrono::TimeDelta;
use std::time::Duration;

use firewatch_core::prelude::Timestamp;

/// Maps elapsed simulation time onto the wall-clock instants the coordinator
/// works with.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct SimClock {
    epoch: Timestamp,
}

impl SimClock {
    pub fn new(epoch: Timestamp) -> Self {
        Self { epoch }
    }

    pub fn epoch(&self) -> Timestamp {
        self.epoch
    }

    pub fn at(&self, elapsed: Duration) -> Timestamp {
        TimeDelta::from_std(elapsed)
            .ok()
            .and_then(|delta| self.epoch.checked_add_signed(delta))
            .unwrap_or(self.epoch)
    }

    /// The instant of the current frame.
    pub fn now(&self, time: &Time) -> Timestamp {
        self.at(time.elapsed())
    }
}
