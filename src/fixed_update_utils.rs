use crate::prelude::*;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<DidFixedTimestepRunThisFrame>()
        // At the beginning of each frame, clear the flag that indicates whether the fixed timestep has run this frame.
        .add_systems(PreUpdate, clear_fixed_timestep_flag)
        // At the beginning of each fixed timestep, set the flag that indicates whether the fixed timestep has run this frame.
        .add_systems(FixedPreUpdate, set_fixed_time_step_flag);
}

/// Whether the fixed timestep ran this frame. Accumulated input is only cleared once a tick
/// has consumed it.
#[derive(Resource, Debug, Deref, DerefMut, Default)]
pub(crate) struct DidFixedTimestepRunThisFrame(bool);

fn clear_fixed_timestep_flag(mut did_run: ResMut<DidFixedTimestepRunThisFrame>) {
    **did_run = false;
}

fn set_fixed_time_step_flag(mut did_run: ResMut<DidFixedTimestepRunThisFrame>) {
    **did_run = true;
}

pub(crate) fn did_fixed_timestep_run_this_frame(did_run: Res<DidFixedTimestepRunThisFrame>) -> bool {
    **did_run
}
