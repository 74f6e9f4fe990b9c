use crate::{
    CharacterState, ClimbController,
    locomotion::Ctx,
    physics::{Mover, SpatialQueries},
    prelude::*,
};
use bevy_time::Stopwatch;

pub fn foot_position(cfg: &ClimbController, state: &CharacterState) -> Vec3 {
    match cfg.foot_offset {
        Some(offset) => state.position + offset,
        None => {
            let dims = state.dims;
            state.position + Vec3::NEG_Y * (dims.half_height() - dims.radius + 0.02)
        }
    }
}

pub fn is_grounded(
    cfg: &ClimbController,
    state: &CharacterState,
    queries: &impl SpatialQueries,
    mover: &impl Mover,
) -> bool {
    queries.check_sphere(foot_position(cfg, state), cfg.ground_radius, cfg.ground_mask)
        || mover.resting_contact()
}

pub(crate) fn update_grounded(
    state: &mut CharacterState,
    queries: &impl SpatialQueries,
    mover: &impl Mover,
    ctx: &Ctx,
) {
    state.grounded = is_grounded(ctx.cfg, state, queries, mover);
    if !state.grounded {
        return;
    }
    state.last_ground.get_or_insert_with(Stopwatch::new).reset();
    if state.vertical_velocity < 0.0 {
        state.vertical_velocity = ctx.cfg.grounded_velocity;
    }
}

/// Keeps a grounded character from accumulating fall speed past `grounded_velocity`.
pub(crate) fn clamp_grounded_velocity(state: &mut CharacterState, cfg: &ClimbController) {
    if state.grounded && state.vertical_velocity < cfg.grounded_velocity {
        state.vertical_velocity = cfg.grounded_velocity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{StubMover, StubWorld};
    use core::time::Duration;

    #[test]
    fn foot_probe_sits_in_the_lower_hemisphere() {
        let cfg = ClimbController::default();
        let state = CharacterState {
            position: vec3(0.0, 0.9, 0.0),
            ..default()
        };
        // 0.9 - (0.9 - 0.3 + 0.02)
        let foot = foot_position(&cfg, &state);
        assert!((foot.y - 0.28).abs() < 1e-5);

        let cfg = ClimbController {
            foot_offset: Some(vec3(0.0, -0.5, 0.0)),
            ..default()
        };
        assert!((foot_position(&cfg, &state).y - 0.4).abs() < 1e-5);
    }

    #[test]
    fn resting_contact_covers_a_missed_sphere_query() {
        let cfg = ClimbController::default();
        let state = CharacterState {
            position: vec3(0.0, 5.0, 0.0),
            ..default()
        };
        let world = StubWorld::flat();
        let mut mover = StubMover::free();
        assert!(!is_grounded(&cfg, &state, &world, &mover));
        mover.resting = true;
        assert!(is_grounded(&cfg, &state, &world, &mover));
    }

    #[test]
    fn grounding_arms_coyote_time_and_holds_velocity() {
        let cfg = ClimbController::default();
        let ctx = Ctx::new(&cfg, default(), Duration::from_millis(16), true);
        let mut state = CharacterState {
            position: vec3(0.0, 0.9, 0.0),
            vertical_velocity: -7.0,
            ..default()
        };
        update_grounded(&mut state, &StubWorld::flat(), &StubMover::free(), &ctx);
        assert!(state.grounded);
        assert_eq!(state.last_ground.as_ref().map(Stopwatch::elapsed), Some(Duration::ZERO));
        assert_eq!(state.vertical_velocity, -2.0);

        // upward velocity is left alone, a jump has to be able to leave the ground
        state.vertical_velocity = 3.0;
        update_grounded(&mut state, &StubWorld::flat(), &StubMover::free(), &ctx);
        assert_eq!(state.vertical_velocity, 3.0);
    }
}
