use crate::{
    CharacterState, ClimbController, ClimbSensing, LocomotionMode,
    locomotion::{Ctx, apply_movement},
    look, mantle,
    physics::{Mover, SpatialQueries, WallContact},
    prelude::*,
};
use bevy_time::Stopwatch;
use tracing::debug;

/// Below this the character counts as already at the stand-off distance.
const GLUE_EPSILON: f32 = 0.0005;
const LEDGE_PROBE_INSET: f32 = 0.05;

/// The wall probe starts at the top of the capsule.
pub fn detection_origin(state: &CharacterState) -> Vec3 {
    state.position + Vec3::Y * state.dims.half_height()
}

pub fn detect_wall(
    cfg: &ClimbController,
    state: &CharacterState,
    queries: &impl SpatialQueries,
) -> Option<WallContact> {
    let direction = Dir3::new(look::forward(state.yaw)).ok()?;
    queries.sphere_cast(
        detection_origin(state),
        state.dims.radius * 0.9,
        direction,
        cfg.detect_distance,
        cfg.climbable_mask,
    )
}

pub fn can_enter(cfg: &ClimbController, yaw: f32, contact: &WallContact, move_axis: Vec2) -> bool {
    let angle = (-contact.normal).angle_between(look::forward(yaw)).to_degrees();
    let forward_input = move_axis.y > cfg.forward_input_threshold;
    angle <= cfg.max_align_angle && (!cfg.require_forward_input || forward_input)
}

/// Displacement that brings the character back to `stick_distance`, if it drifted away.
pub fn glue_displacement(cfg: &ClimbController, contact: &WallContact) -> Option<Vec3> {
    let need = contact.distance - cfg.stick_distance;
    (need > -GLUE_EPSILON).then(|| -contact.normal * (need + cfg.extra_push))
}

/// `None` if the space above and behind the wall top is blocked.
pub fn mantle_displacement(
    cfg: &ClimbController,
    contact: &WallContact,
    queries: &impl SpatialQueries,
) -> Option<Vec3> {
    let inward = Dir3::new(-contact.normal).ok()?;
    let origin = contact.point + Vec3::Y * cfg.top_check_height + inward * LEDGE_PROBE_INSET;
    if queries.raycast(origin, inward, cfg.top_check_forward, cfg.climbable_mask) {
        return None;
    }
    Some(Vec3::Y * cfg.mantle_up_offset + inward * cfg.mantle_forward_offset)
}

pub(crate) fn update_climb(
    state: &mut CharacterState,
    queries: &impl SpatialQueries,
    mover: &mut impl Mover,
    ctx: &Ctx,
) {
    match ctx.cfg.sensing {
        ClimbSensing::Cast => update_from_cast(state, queries, mover, ctx),
        ClimbSensing::Volume => update_from_volume(state, queries, ctx),
    }
}

fn update_from_cast(
    state: &mut CharacterState,
    queries: &impl SpatialQueries,
    mover: &mut impl Mover,
    ctx: &Ctx,
) {
    let contact = detect_wall(ctx.cfg, state, queries);
    match state.mode {
        LocomotionMode::Locomoting => {
            let Some(contact) = contact else {
                return;
            };
            if !can_enter(ctx.cfg, state.yaw, &contact, ctx.input.move_axis) {
                return;
            }
            debug!(normal = ?contact.normal, distance = contact.distance, "climb started");
            state.mode = LocomotionMode::Climbing { grace: false };
            state.jump_pressed = None;
            glue_to_wall(state, &contact, mover, ctx);
            report_wall(state, &contact);
        }
        LocomotionMode::Climbing { .. } => {
            // a jump while climbing is either a mantle attempt or nothing
            if ctx.input.jump_pressed {
                state.jump_pressed = None;
            }
            let Some(contact) = contact else {
                hold_without_wall(state, ctx);
                return;
            };
            state.mode = LocomotionMode::Climbing { grace: false };
            glue_to_wall(state, &contact, mover, ctx);
            report_wall(state, &contact);
            if ctx.input.jump_pressed {
                try_mantle(state, &contact, queries, ctx);
            }
        }
        LocomotionMode::Mantling => {}
    }
}

fn hold_without_wall(state: &mut CharacterState, ctx: &Ctx) {
    let expired = state
        .last_wall
        .as_ref()
        .is_none_or(|last_wall| last_wall.elapsed() > ctx.cfg.detach_grace);
    if expired {
        debug!("wall lost, climb ended");
        leave_climb(state);
        return;
    }
    state.mode = LocomotionMode::Climbing { grace: true };
    if let Some(normal) = state.last_wall_normal {
        look::turn_toward_wall(state, normal, ctx.cfg.align_lerp * ctx.dt);
    }
}

fn update_from_volume(state: &mut CharacterState, queries: &impl SpatialQueries, ctx: &Ctx) {
    let inside = queries.check_capsule(state.position, state.dims, ctx.cfg.climb_zone_mask);
    let entered = inside && !state.in_climb_zone;
    let exited = !inside && state.in_climb_zone;
    state.in_climb_zone = inside;

    if entered && state.mode == LocomotionMode::Locomoting {
        debug!("entered climb zone");
        state.mode = LocomotionMode::Climbing { grace: false };
        state.jump_pressed = None;
    } else if exited && state.mode.is_climbing() {
        debug!("left climb zone");
        leave_climb(state);
    } else if state.mode.is_climbing() && ctx.input.jump_pressed {
        state.jump_pressed = None;
    }
}

fn glue_to_wall(
    state: &mut CharacterState,
    contact: &WallContact,
    mover: &mut impl Mover,
    ctx: &Ctx,
) {
    if !state.movement_enabled {
        return;
    }
    if let Some(push) = glue_displacement(ctx.cfg, contact) {
        apply_movement(state, mover, push);
    }
    look::turn_toward_wall(state, contact.normal, ctx.cfg.align_lerp * ctx.dt);
}

fn report_wall(state: &mut CharacterState, contact: &WallContact) {
    state.last_wall_normal = Some(contact.normal);
    state.last_wall.get_or_insert_with(Stopwatch::new).reset();
}

fn try_mantle(
    state: &mut CharacterState,
    contact: &WallContact,
    queries: &impl SpatialQueries,
    ctx: &Ctx,
) -> bool {
    let Some(displacement) = mantle_displacement(ctx.cfg, contact, queries) else {
        debug!("ledge blocked, mantle ignored");
        return false;
    };
    mantle::start_mantle(state, displacement, ctx.cfg.mantle_duration)
}

fn leave_climb(state: &mut CharacterState) {
    state.mode = LocomotionMode::Locomoting;
    state.last_wall = None;
    state.last_wall_normal = None;
    state.jump_pressed = None;
}
