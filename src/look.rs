use crate::{CharacterState, locomotion::Ctx, prelude::*};
use core::f32::consts::{PI, TAU};
use tracing::warn;

/// Yaw 0 faces -Z, positive pitch looks up. Pitch is skipped without a camera.
pub(crate) fn integrate_look(state: &mut CharacterState, ctx: &Ctx) {
    let scale = (ctx.cfg.mouse_sensitivity * ctx.dt).to_radians();
    let delta = ctx.input.look_delta;
    if !delta.is_finite() {
        return;
    }

    if !state.is_yaw_locked() {
        state.yaw -= delta.x * scale;
    }
    if ctx.has_camera {
        let clamp = ctx.cfg.pitch_clamp.to_radians();
        state.pitch = (state.pitch - delta.y * scale).clamp(-clamp, clamp);
    }
}

/// Turns the body toward facing into the wall with outward `normal`, by fraction `t`.
pub fn turn_toward_wall(state: &mut CharacterState, normal: Vec3, t: f32) {
    let Some(target) = yaw_facing(-normal) else {
        return;
    };
    let current = body_rotation(state.yaw);
    let rotation = current.slerp(body_rotation(target), t.clamp(0.0, 1.0));
    state.yaw = yaw_of(rotation);
}

pub(crate) fn stabilize(state: &mut CharacterState, pitch_clamp: f32) {
    if !state.yaw.is_finite() {
        warn!("yaw is not finite: {}, setting to 0", state.yaw);
        state.yaw = 0.0;
    }
    if !state.pitch.is_finite() {
        warn!("pitch is not finite: {}, setting to 0", state.pitch);
        state.pitch = 0.0;
    }
    state.yaw = wrap_angle(state.yaw);
    let clamp = pitch_clamp.to_radians();
    state.pitch = state.pitch.clamp(-clamp, clamp);
}

pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

pub fn body_rotation(yaw: f32) -> Quat {
    Quat::from_rotation_y(yaw)
}

pub fn view_rotation(yaw: f32, pitch: f32) -> Quat {
    Quat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0)
}

pub fn yaw_of(rotation: Quat) -> f32 {
    let (yaw, _, _) = rotation.to_euler(EulerRot::YXZ);
    yaw
}

/// Yaw that faces along the horizontal part of `direction`.
pub fn yaw_facing(direction: Vec3) -> Option<f32> {
    let flat = vec3(direction.x, 0.0, direction.z);
    if flat.length_squared() < 1e-6 {
        return None;
    }
    Some(f32::atan2(-flat.x, -flat.z))
}

pub fn forward(yaw: f32) -> Vec3 {
    body_rotation(yaw) * Vec3::NEG_Z
}

pub fn right(yaw: f32) -> Vec3 {
    body_rotation(yaw) * Vec3::X
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClimbController, LocomotionMode, input::InputSample};
    use approx::assert_relative_eq;
    use core::time::Duration;

    fn ctx(cfg: &ClimbController, look_delta: Vec2, has_camera: bool) -> Ctx<'_> {
        Ctx::new(
            cfg,
            InputSample {
                look_delta,
                ..default()
            },
            Duration::from_millis(100),
            has_camera,
        )
    }

    #[test]
    fn yaw_and_pitch_follow_input() {
        let cfg = ClimbController::default();
        let mut state = CharacterState::default();
        // 120 deg/unit/s * 0.1 s = 12 deg per unit
        integrate_look(&mut state, &ctx(&cfg, vec2(1.0, -1.0), true));
        assert_relative_eq!(state.yaw, -12f32.to_radians(), epsilon = 1e-5);
        assert_relative_eq!(state.pitch, 12f32.to_radians(), epsilon = 1e-5);
    }

    #[test]
    fn pitch_is_clamped() {
        let cfg = ClimbController::default();
        let mut state = CharacterState::default();
        integrate_look(&mut state, &ctx(&cfg, vec2(0.0, -100.0), true));
        assert_relative_eq!(state.pitch, 85f32.to_radians(), epsilon = 1e-5);
        integrate_look(&mut state, &ctx(&cfg, vec2(0.0, 500.0), true));
        assert_relative_eq!(state.pitch, -85f32.to_radians(), epsilon = 1e-5);
    }

    #[test]
    fn climbing_locks_yaw_but_not_pitch() {
        let cfg = ClimbController::default();
        let mut state = CharacterState {
            mode: LocomotionMode::Climbing { grace: true },
            last_wall_normal: Some(Vec3::Z),
            ..default()
        };
        integrate_look(&mut state, &ctx(&cfg, vec2(5.0, 1.0), true));
        assert_eq!(state.yaw, 0.0);
        assert!(state.pitch < 0.0);
    }

    #[test]
    fn zone_climbing_keeps_yaw_on_input() {
        let cfg = ClimbController::default();
        let mut state = CharacterState {
            mode: LocomotionMode::Climbing { grace: false },
            ..default()
        };
        integrate_look(&mut state, &ctx(&cfg, vec2(1.0, 0.0), true));
        assert_relative_eq!(state.yaw, -12f32.to_radians(), epsilon = 1e-5);
    }

    #[test]
    fn pitch_is_skipped_without_camera() {
        let cfg = ClimbController::default();
        let mut state = CharacterState::default();
        integrate_look(&mut state, &ctx(&cfg, vec2(1.0, 1.0), false));
        assert_eq!(state.pitch, 0.0);
        assert!(state.yaw != 0.0);
    }

    #[test]
    fn facing_conventions() {
        assert_relative_eq!(yaw_facing(Vec3::NEG_Z).unwrap(), 0.0);
        let yaw = yaw_facing(Vec3::NEG_X).unwrap();
        assert!(forward(yaw).abs_diff_eq(Vec3::NEG_X, 1e-5));
        assert!(yaw_facing(Vec3::Y).is_none());
        assert!(right(0.0).abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn turning_toward_a_wall_is_gradual() {
        let mut state = CharacterState {
            yaw: 0.5,
            ..default()
        };
        // wall ahead on -Z, so facing it means yaw 0
        turn_toward_wall(&mut state, Vec3::Z, 0.5);
        assert!(state.yaw > 0.0 && state.yaw < 0.5);
        turn_toward_wall(&mut state, Vec3::Z, 1.0);
        assert_relative_eq!(state.yaw, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn stabilize_wraps_and_sanitizes() {
        let mut state = CharacterState {
            yaw: 2.5 * PI,
            pitch: f32::NAN,
            ..default()
        };
        stabilize(&mut state, 85.0);
        assert_relative_eq!(state.yaw, 0.5 * PI, epsilon = 1e-4);
        assert_eq!(state.pitch, 0.0);

        let rotation = view_rotation(0.3, 0.2);
        let (_, _, roll) = rotation.to_euler(EulerRot::YXZ);
        assert_relative_eq!(roll, 0.0, epsilon = 1e-6);
    }
}
