use bevy_ecs::{intern::Interned, schedule::ScheduleLabel};
use bevy_time::Stopwatch;
use core::time::Duration;
use tracing::{debug, warn};

use crate::{
    CharacterState, LocomotionMode,
    anim::{AnimBool, AnimFloat, AnimTrigger, AnimationParameters, AnimationSink},
    climb, ground,
    input::{AccumulatedInput, InputSample},
    look, mantle,
    physics::{AvianQueries, KinematicMover, Mover, SpatialQueries},
    prelude::*,
};

pub(super) fn plugin(schedule: Interned<dyn ScheduleLabel>) -> impl Fn(&mut App) {
    move |app: &mut App| {
        app.add_systems(schedule, run_controller.in_set(ClamberSystems::MoveCharacters));
    }
}

/// Everything a tick reads but does not own.
#[derive(Debug)]
pub(crate) struct Ctx<'a> {
    pub(crate) cfg: &'a ClimbController,
    pub(crate) input: InputSample,
    pub(crate) dt: f32,
    pub(crate) dt_duration: Duration,
    pub(crate) has_camera: bool,
}

impl<'a> Ctx<'a> {
    pub(crate) fn new(
        cfg: &'a ClimbController,
        input: InputSample,
        dt_duration: Duration,
        has_camera: bool,
    ) -> Self {
        Self {
            cfg,
            input: input.sanitized(cfg.dead_zone),
            dt: dt_duration.as_secs_f32(),
            dt_duration,
            has_camera,
        }
    }
}

fn run_controller(
    mut kccs: Query<(
        &ClimbController,
        &mut CharacterState,
        &mut AccumulatedInput,
        &mut AnimationParameters,
        &mut Transform,
        &Collider,
        Has<CharacterControllerCamera>,
    )>,
    time: Res<Time>,
    move_and_slide: MoveAndSlide,
) {
    for (cfg, mut state, mut input, mut anim, mut transform, collider, has_camera) in &mut kccs {
        let sample = input.take_sample();
        state.position = transform.translation;
        if state.mode != LocomotionMode::Mantling {
            depenetrate_character(&mut state, &transform, collider, &move_and_slide, cfg);
        }

        let queries = AvianQueries::new(&move_and_slide.query_pipeline, &cfg.filter);
        let mut mover = KinematicMover::new(
            &move_and_slide,
            collider,
            transform.rotation,
            cfg,
            time.delta(),
            state.position,
        );
        step(
            cfg,
            &mut state,
            sample,
            time.delta(),
            has_camera,
            &queries,
            &mut mover,
            &mut *anim,
        );

        transform.translation = state.position;
        transform.rotation = look::body_rotation(state.yaw);
    }
}

fn depenetrate_character(
    state: &mut CharacterState,
    transform: &Transform,
    collider: &Collider,
    move_and_slide: &MoveAndSlide,
    cfg: &ClimbController,
) {
    let offset = move_and_slide.depenetrate(
        collider,
        state.position,
        transform.rotation,
        &((&cfg.move_and_slide).into()),
        &cfg.filter,
    );
    state.position += offset;
}

/// Advances one character by one tick.
///
/// Order: timing windows, jump stamp, look, then either the active mantle or
/// grounding → climb detection → movement → animation parameters, and finally rotation
/// stabilization, which runs on every tick.
pub fn step(
    cfg: &ClimbController,
    state: &mut CharacterState,
    input: InputSample,
    dt: Duration,
    has_camera: bool,
    queries: &impl SpatialQueries,
    mover: &mut impl Mover,
    sink: &mut impl AnimationSink,
) {
    let ctx = Ctx::new(cfg, input, dt, has_camera);
    tick(state, queries, mover, sink, &ctx);
}

fn tick(
    state: &mut CharacterState,
    queries: &impl SpatialQueries,
    mover: &mut impl Mover,
    sink: &mut impl AnimationSink,
    ctx: &Ctx,
) {
    state.tick_windows(ctx.dt_duration);
    if ctx.input.jump_pressed && state.mode != LocomotionMode::Mantling {
        state.jump_pressed = Some(Stopwatch::new());
    }

    look::integrate_look(state, ctx);

    if state.mode == LocomotionMode::Mantling {
        mantle::advance_mantle(state, ctx.dt_duration);
    } else {
        ground::update_grounded(state, queries, mover, ctx);
        climb::update_climb(state, queries, mover, ctx);

        match state.mode {
            LocomotionMode::Mantling => {
                sink.set_bool(AnimBool::IsClimbing, false);
                sink.set_bool(AnimBool::IsFalling, false);
                sink.fire(AnimTrigger::Mantle);
            }
            LocomotionMode::Climbing { .. } => {
                climb_move(state, mover, ctx);
                write_animation(state, sink, ctx);
            }
            LocomotionMode::Locomoting => {
                if handle_jump(state, ctx) {
                    sink.fire(AnimTrigger::Jump);
                }
                ground_move(state, mover, ctx);
                write_animation(state, sink, ctx);
            }
        }
    }

    look::stabilize(state, ctx.cfg.pitch_clamp);
}

/// The only place position changes outside of a mantle.
pub(crate) fn apply_movement(state: &mut CharacterState, mover: &mut impl Mover, displacement: Vec3) {
    if !state.movement_enabled {
        debug!("movement disabled, dropping displacement {displacement}");
        return;
    }
    if !displacement.is_finite() {
        warn!("displacement is not finite: {displacement}, ignoring");
        return;
    }
    if displacement == Vec3::ZERO {
        return;
    }
    state.position = mover.move_by(state.position, displacement);
}

fn ground_move(state: &mut CharacterState, mover: &mut impl Mover, ctx: &Ctx) {
    let axis = ctx.input.move_axis;
    let wish_dir = (look::right(state.yaw) * axis.x + look::forward(state.yaw) * axis.y)
        .normalize_or_zero();
    let speed = if ctx.input.run {
        ctx.cfg.run_speed
    } else {
        ctx.cfg.walk_speed
    };
    let horizontal = wish_dir * speed * ctx.dt;

    state.vertical_velocity += ctx.cfg.gravity * ctx.dt;
    ground::clamp_grounded_velocity(state, ctx.cfg);
    validate_velocity(state, ctx);

    apply_movement(
        state,
        mover,
        horizontal + Vec3::Y * state.vertical_velocity * ctx.dt,
    );
}

fn climb_move(state: &mut CharacterState, mover: &mut impl Mover, ctx: &Ctx) {
    let axis = ctx.input.move_axis;
    let climb = Vec3::Y * axis.y * ctx.cfg.climb_speed;
    let strafe = look::right(state.yaw) * axis.x * ctx.cfg.climb_speed * ctx.cfg.climb_strafe_scale;
    // gravity is off while on the wall
    state.vertical_velocity = 0.0;
    apply_movement(state, mover, (climb + strafe) * ctx.dt);
}

/// Jumps when a buffered press and the coyote window overlap. Returns whether it jumped.
fn handle_jump(state: &mut CharacterState, ctx: &Ctx) -> bool {
    let Some(pressed) = state.jump_pressed.as_ref() else {
        return false;
    };
    let Some(last_ground) = state.last_ground.as_ref() else {
        return false;
    };
    if pressed.elapsed() > ctx.cfg.jump_buffer || last_ground.elapsed() > ctx.cfg.coyote_time {
        return false;
    }
    state.jump_pressed = None;

    // v^2 = 2 * g * h, with gravity pointing down
    state.vertical_velocity = (ctx.cfg.jump_height * -2.0 * ctx.cfg.gravity).sqrt();
    debug!(velocity = state.vertical_velocity, "jump");
    true
}

fn validate_velocity(state: &mut CharacterState, ctx: &Ctx) {
    if !state.vertical_velocity.is_finite() {
        warn!(
            "vertical velocity is not finite: {}, setting to 0",
            state.vertical_velocity
        );
        state.vertical_velocity = 0.0;
    }
    state.vertical_velocity = state
        .vertical_velocity
        .clamp(-ctx.cfg.max_speed, ctx.cfg.max_speed);
}

fn write_animation(state: &mut CharacterState, sink: &mut impl AnimationSink, ctx: &Ctx) {
    let axis = ctx.input.move_axis;
    let climbing = state.mode.is_climbing();

    let gait = if ctx.input.run { 1.0 } else { 0.5 };
    state.speed = damp(
        state.speed,
        axis.length() * gait,
        ctx.cfg.speed_damp_time,
        ctx.dt,
    );
    sink.set_float(AnimFloat::Speed, state.speed);

    let falling = !state.grounded
        && state.vertical_velocity < ctx.cfg.falling_velocity_threshold
        && !climbing;
    sink.set_bool(AnimBool::IsFalling, falling);
    sink.set_bool(AnimBool::IsClimbing, climbing);

    let target = if climbing && axis != Vec2::ZERO {
        1.0
    } else {
        0.0
    };
    let max_delta = ctx.cfg.climb_play_rate_speed * ctx.dt;
    let rate = state.climb_play_rate + (target - state.climb_play_rate).clamp(-max_delta, max_delta);
    state.climb_play_rate = rate.clamp(0.0, 1.0);
    sink.set_float(AnimFloat::ClimbPlayRate, state.climb_play_rate);
}

/// Exponential approach toward `target` with time constant `damp_time`.
fn damp(current: f32, target: f32, damp_time: Duration, dt: f32) -> f32 {
    let damp_time = damp_time.as_secs_f32();
    if damp_time <= 0.0 {
        return target;
    }
    current + (target - current) * (1.0 - (-dt / damp_time).exp())
}
