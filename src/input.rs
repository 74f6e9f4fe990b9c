use crate::prelude::*;

use crate::fixed_update_utils::did_fixed_timestep_run_this_frame;

pub(super) fn plugin(app: &mut App) {
    app.add_observer(apply_movement)
        .add_observer(apply_jump)
        .add_observer(apply_run)
        .add_observer(apply_look)
        .add_systems(
            RunFixedMainLoop,
            clear_accumulated_input
                .run_if(did_fixed_timestep_run_this_frame)
                .in_set(RunFixedMainLoopSystems::AfterFixedMainLoop),
        );
}

#[derive(Debug, InputAction)]
#[action_output(Vec2)]
pub struct Movement;

#[derive(Debug, InputAction)]
#[action_output(bool)]
pub struct Jump;

#[derive(Debug, InputAction)]
#[action_output(bool)]
pub struct Run;

#[derive(Debug, InputAction)]
#[action_output(Vec2)]
pub struct RotateCamera;

/// Input accumulated since the last fixed update loop.
#[derive(Component, Clone, Reflect, Default, Debug)]
#[reflect(Component)]
pub struct AccumulatedInput {
    // The last non-zero move that was input since the last fixed update loop
    pub last_movement: Option<Vec2>,
    // Look delta summed over every frame since the last tick
    pub look: Vec2,
    // Whether run was held on any frame since the last fixed update loop
    pub running: bool,
    // A jump press started since the last tick. Cleared when a tick reads it.
    pub jumped: bool,
}

impl AccumulatedInput {
    /// Reads the input for one tick. Edge events and look deltas are consumed so a second fixed
    /// step in the same frame does not see them again.
    pub fn take_sample(&mut self) -> InputSample {
        InputSample {
            move_axis: self.last_movement.unwrap_or_default(),
            look_delta: core::mem::take(&mut self.look),
            run: self.running,
            jump_pressed: core::mem::take(&mut self.jumped),
        }
    }
}

#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct InputSample {
    /// `x` strafes, `y` moves forward. Each component in [-1, 1].
    pub move_axis: Vec2,
    /// Raw look delta. Positive `x` turns right, positive `y` looks down.
    pub look_delta: Vec2,
    pub run: bool,
    /// Edge: set only on the tick the press started.
    pub jump_pressed: bool,
}

impl InputSample {
    pub fn sanitized(self, dead_zone: f32) -> Self {
        Self {
            move_axis: sample_move_axis(self.move_axis, dead_zone),
            ..self
        }
    }
}

/// Zeroes `raw` below `dead_zone` magnitude and clamps it to unit magnitude.
pub fn sample_move_axis(raw: Vec2, dead_zone: f32) -> Vec2 {
    if !raw.is_finite() || raw.length() < dead_zone {
        return Vec2::ZERO;
    }
    raw.clamp_length_max(1.0)
}

fn apply_movement(
    movement: On<Fire<Movement>>,
    mut accumulated_inputs: Query<&mut AccumulatedInput>,
) {
    if let Ok(mut accumulated_inputs) = accumulated_inputs.get_mut(movement.context) {
        accumulated_inputs.last_movement = Some(movement.value);
    }
}

fn apply_jump(jump: On<Start<Jump>>, mut accumulated_inputs: Query<&mut AccumulatedInput>) {
    if let Ok(mut accumulated_inputs) = accumulated_inputs.get_mut(jump.context) {
        accumulated_inputs.jumped = true;
    }
}

fn apply_run(run: On<Fire<Run>>, mut accumulated_inputs: Query<&mut AccumulatedInput>) {
    if let Ok(mut accumulated_inputs) = accumulated_inputs.get_mut(run.context) {
        accumulated_inputs.running = true;
    }
}

fn apply_look(rotate: On<Fire<RotateCamera>>, mut accumulated_inputs: Query<&mut AccumulatedInput>) {
    if let Ok(mut accumulated_inputs) = accumulated_inputs.get_mut(rotate.context) {
        accumulated_inputs.look += rotate.value;
    }
}

fn clear_accumulated_input(mut accumulated_inputs: Query<&mut AccumulatedInput>) {
    for mut accumulated_input in &mut accumulated_inputs {
        *accumulated_input = AccumulatedInput {
            last_movement: default(),
            look: accumulated_input.look,
            running: default(),
            jumped: accumulated_input.jumped,
        }
    }
}
