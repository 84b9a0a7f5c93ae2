// firewatch_sim/src/simulation/plugins/operator/mod.rs

//! Replays the scenario's operator actions at their scheduled times.

use bevy::prelude::*;
use std::collections::VecDeque;

use crate::prelude::*;
use crate::simulation::core::events::OperatorCommand;

/// The actions still to come, earliest first.
#[derive(Resource, Debug, Default)]
pub struct OperatorScript {
    steps: VecDeque<OperatorStep>,
}

impl OperatorScript {
    /// Steps sharing a time keep their order from the scenario file.
    pub fn new(mut steps: Vec<OperatorStep>) -> Self {
        steps.sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));
        Self {
            steps: steps.into(),
        }
    }

    /// Removes and returns every action due at `elapsed_secs`.
    pub fn due(&mut self, elapsed_secs: f64) -> Vec<OperatorAction> {
        let mut due = Vec::new();
        while self
            .steps
            .front()
            .is_some_and(|step| step.at_secs <= elapsed_secs)
        {
            if let Some(step) = self.steps.pop_front() {
                due.push(step.action);
            }
        }
        due
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

pub struct OperatorPlugin;

impl Plugin for OperatorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<OperatorScript>()
            .add_systems(
                OnEnter(AppState::Loading),
                load_operator_script.in_set(LoadSet::Catalog),
            )
            .add_systems(
                Update,
                fire_operator_steps
                    .in_set(SimulationSet::Operator)
                    .run_if(in_state(AppState::Running)),
            );
    }
}

fn load_operator_script(config: Res<ScenarioConfig>, mut script: ResMut<OperatorScript>) {
    *script = OperatorScript::new(config.operator.clone());
    info!("Operator script: {} steps", script.remaining());
}

fn fire_operator_steps(
    time: Res<Time>,
    mut script: ResMut<OperatorScript>,
    mut writer: EventWriter<OperatorCommand>,
) {
    for action in script.due(time.elapsed_secs_f64()) {
        writer.write(OperatorCommand(action));
    }
}
