use crate::{CharacterState, LocomotionMode, prelude::*};
use core::time::Duration;
use tracing::debug;

#[derive(Clone, Copy, Reflect, Debug, PartialEq)]
pub struct MantleTask {
    pub start: Vec3,
    pub target: Vec3,
    pub elapsed: Duration,
    pub duration: Duration,
}

impl MantleTask {
    pub fn new(start: Vec3, displacement: Vec3, duration: Duration) -> Self {
        Self {
            start,
            target: start + displacement,
            elapsed: Duration::ZERO,
            duration,
        }
    }

    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Eased position for the current progress. Exactly `target` once finished.
    pub fn position(&self) -> Vec3 {
        if self.is_finished() {
            return self.target;
        }
        self.start.lerp(self.target, smoothstep(self.progress()))
    }

    pub fn advance(&mut self, delta: Duration) -> Vec3 {
        self.elapsed = self.elapsed.saturating_add(delta);
        self.position()
    }
}

pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Starts a mantle from the current position. Returns `false` without touching the active task
/// if a mantle is already running.
pub fn start_mantle(state: &mut CharacterState, displacement: Vec3, duration: Duration) -> bool {
    if state.mode == LocomotionMode::Mantling {
        debug!("mantle already in progress, ignoring request");
        return false;
    }
    if let Some(stale) = state.mantle.take() {
        debug!(?stale, "discarding stale mantle task");
    }

    debug!(?displacement, ?duration, "mantle started");
    state.movement_enabled = false;
    state.mode = LocomotionMode::Mantling;
    state.vertical_velocity = 0.0;
    state.jump_pressed = None;
    state.mantle = Some(MantleTask::new(state.position, displacement, duration));
    true
}

/// Advances the active mantle by one tick. Returns `true` on the tick it finishes.
pub fn advance_mantle(state: &mut CharacterState, delta: Duration) -> bool {
    let Some(task) = state.mantle.as_mut() else {
        // mantling without a task, nothing owns the position anymore
        finish_mantle(state);
        return true;
    };
    state.position = task.advance(delta);
    if !task.is_finished() {
        return false;
    }
    state.mantle = None;
    finish_mantle(state);
    true
}

fn finish_mantle(state: &mut CharacterState) {
    debug!(position = ?state.position, "mantle finished");
    state.movement_enabled = true;
    state.mode = LocomotionMode::Locomoting;
    state.last_wall = None;
    state.last_wall_normal = None;
}
