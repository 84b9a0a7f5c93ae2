// firewatch_sim/src/simulation/core/prng.rs

use bevy::prelude::Resource;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The run's root generator, seeded from the scenario (or from entropy when
/// no seed is given). Everything random in a run is forked from it.
#[derive(Resource)]
pub struct SimulationRng(pub ChaCha8Rng);

impl SimulationRng {
    /// Derives an independent generator, e.g. for the handset noise or the
    /// coordinator. The sequence of forks is fixed by the seed.
    pub fn fork(&mut self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.0.next_u64())
    }
}
