// firewatch_sim/src/simulation/plugins/mod.rs

pub mod coordinator;
pub mod debugging;
pub mod device;
pub mod operator;
