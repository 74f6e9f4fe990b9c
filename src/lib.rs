#![doc = include_str!("../readme.md")]

/// Everything you need to get started with `bevy_clamber`
pub mod prelude {
    pub(crate) use {
        avian3d::prelude::*,
        bevy_app::prelude::*,
        bevy_derive::{Deref, DerefMut},
        bevy_ecs::prelude::*,
        bevy_enhanced_input::prelude::*,
        bevy_math::prelude::*,
        bevy_reflect::prelude::*,
        bevy_time::prelude::*,
        bevy_transform::prelude::*,
        bevy_utils::prelude::*,
    };

    pub use crate::{
        CapsuleDims, CharacterState, ClamberPlugin, ClamberSystems, ClimbController, ClimbSensing,
        LocomotionMode,
        anim::{AnimBool, AnimFloat, AnimTrigger, AnimationParameters, AnimationSink},
        camera::{CharacterControllerCamera, CharacterControllerCameraOf},
        error::ConfigError,
        input::{InputSample, Jump, Movement, RotateCamera, Run},
        locomotion::step,
        mantle::MantleTask,
        physics::{ClamberLayer, Mover, SpatialQueries, WallContact},
    };
}

use crate::{anim::AnimationParameters, input::AccumulatedInput, mantle::MantleTask, prelude::*};
use bevy_ecs::{
    intern::Interned, lifecycle::HookContext,
    relationship::RelationshipSourceCollection as _, schedule::ScheduleLabel, world::DeferredWorld,
};
use bevy_time::Stopwatch;
use core::time::Duration;
use tracing::error;

pub mod anim;
pub mod camera;
pub mod climb;
pub mod error;
mod fixed_update_utils;
pub mod ground;
pub mod input;
pub mod locomotion;
pub mod look;
pub mod mantle;
pub mod physics;

#[cfg(test)]
mod test_utils;

/// Also requires you to add [`PhysicsPlugins`] and [`EnhancedInputPlugin`] to work properly.
pub struct ClamberPlugin {
    schedule: Interned<dyn ScheduleLabel>,
}

impl ClamberPlugin {
    /// Create a new plugin in the given schedule. The default is [`FixedPostUpdate`].
    pub fn new(schedule: impl ScheduleLabel) -> Self {
        Self {
            schedule: schedule.intern(),
        }
    }
}

impl Default for ClamberPlugin {
    fn default() -> Self {
        Self {
            schedule: FixedPostUpdate.intern(),
        }
    }
}

impl Plugin for ClamberPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            self.schedule,
            ClamberSystems::MoveCharacters.in_set(PhysicsSystems::First),
        )
        .add_plugins((
            camera::plugin,
            input::plugin,
            locomotion::plugin(self.schedule),
            fixed_update_utils::plugin,
        ));
    }
}

/// System set used by all systems of `bevy_clamber`.
#[derive(SystemSet, Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum ClamberSystems {
    MoveCharacters,
}

#[derive(Clone, Copy, Reflect, Debug, Default, PartialEq, Eq)]
pub enum ClimbSensing {
    #[default]
    Cast,
    /// Entering a climb zone starts a climb, leaving ends it. No gluing or mantling.
    Volume,
}

/// Tuning for a first-person character. Angles are in degrees, distances in world units.
#[derive(Component, Clone, Reflect, Debug)]
#[reflect(Component)]
#[require(
    AccumulatedInput,
    CharacterState,
    AnimationParameters,
    TranslationInterpolation,
    RigidBody = RigidBody::Kinematic,
    Collider = Collider::capsule(0.3, 1.2),
    CustomPositionIntegration,
    Transform,
    SpeculativeMargin::ZERO,
)]
#[component(on_add=ClimbController::on_add)]
pub struct ClimbController {
    pub filter: SpatialQueryFilter,
    pub move_and_slide: MoveAndSlideConfig,

    pub mouse_sensitivity: f32,
    pub pitch_clamp: f32,
    pub view_height: f32,
    pub dead_zone: f32,

    pub walk_speed: f32,
    pub run_speed: f32,
    pub jump_height: f32,
    pub gravity: f32,
    pub max_speed: f32,
    /// Vertical velocity held while grounded, keeps the capsule pressed onto slopes.
    pub grounded_velocity: f32,
    pub coyote_time: Duration,
    pub jump_buffer: Duration,

    pub foot_offset: Option<Vec3>,
    pub ground_radius: f32,
    pub ground_mask: LayerMask,
    pub ground_distance: f32,
    pub min_walk_cos: f32,

    pub sensing: ClimbSensing,
    pub climbable_mask: LayerMask,
    pub climb_zone_mask: LayerMask,
    pub climb_speed: f32,
    pub climb_strafe_scale: f32,
    pub detect_distance: f32,
    pub stick_distance: f32,
    pub max_align_angle: f32,
    pub require_forward_input: bool,
    pub forward_input_threshold: f32,
    pub detach_grace: Duration,
    pub align_lerp: f32,
    pub extra_push: f32,

    pub top_check_height: f32,
    pub top_check_forward: f32,
    pub mantle_up_offset: f32,
    pub mantle_forward_offset: f32,
    pub mantle_duration: Duration,

    pub climb_play_rate_speed: f32,
    pub speed_damp_time: Duration,
    pub falling_velocity_threshold: f32,
}

impl Default for ClimbController {
    fn default() -> Self {
        Self {
            filter: SpatialQueryFilter::from_mask(ClamberLayer::solid()),
            move_and_slide: MoveAndSlideConfig {
                skin_width: 0.0075,
                ..default()
            },
            mouse_sensitivity: 120.0,
            pitch_clamp: 85.0,
            view_height: 1.6,
            dead_zone: 0.05,
            walk_speed: 2.0,
            run_speed: 5.0,
            jump_height: 2.0,
            gravity: -9.81,
            max_speed: 100.0,
            grounded_velocity: -2.0,
            coyote_time: Duration::from_millis(120),
            jump_buffer: Duration::from_millis(120),
            foot_offset: None,
            ground_radius: 0.28,
            ground_mask: ClamberLayer::solid(),
            ground_distance: 0.05,
            min_walk_cos: 0.766,
            sensing: ClimbSensing::Cast,
            climbable_mask: ClamberLayer::Climbable.into(),
            climb_zone_mask: ClamberLayer::ClimbZone.into(),
            climb_speed: 2.0,
            climb_strafe_scale: 0.7,
            detect_distance: 0.9,
            stick_distance: 0.30,
            max_align_angle: 80.0,
            require_forward_input: true,
            forward_input_threshold: 0.1,
            detach_grace: Duration::from_millis(200),
            align_lerp: 15.0,
            extra_push: 0.01,
            top_check_height: 1.4,
            top_check_forward: 0.6,
            mantle_up_offset: 0.9,
            mantle_forward_offset: 0.4,
            mantle_duration: Duration::from_millis(600),
            climb_play_rate_speed: 6.0,
            speed_damp_time: Duration::from_millis(100),
            falling_velocity_threshold: -0.1,
        }
    }
}

impl ClimbController {
    pub fn on_add(mut world: DeferredWorld, ctx: HookContext) {
        {
            let Some(mut cfg) = world.get_mut::<Self>(ctx.entity) else {
                return;
            };
            cfg.filter.excluded_entities.add(ctx.entity);
        }

        let Some(collider) = world.entity(ctx.entity).get::<Collider>().cloned() else {
            return;
        };
        let yaw = world
            .get::<Transform>(ctx.entity)
            .map(|transform| look::yaw_of(transform.rotation))
            .unwrap_or_default();

        let prepared = {
            let Some(mut cfg) = world.get_mut::<Self>(ctx.entity) else {
                return;
            };
            CapsuleDims::from_collider(&collider).and_then(|dims| cfg.prepare(dims).map(|()| dims))
        };

        match prepared {
            Ok(dims) => {
                let Some(mut state) = world.get_mut::<CharacterState>(ctx.entity) else {
                    return;
                };
                state.dims = dims;
                state.yaw = yaw;
            }
            Err(err) => {
                error!("invalid climb controller on {}: {err}", ctx.entity);
                world.commands().entity(ctx.entity).remove::<Self>();
            }
        }
    }

    /// Validates the tuning against the capsule and raises `stick_distance` to keep the
    /// capsule off the wall.
    pub fn prepare(&mut self, dims: CapsuleDims) -> Result<(), ConfigError> {
        self.validate()?;
        self.stick_distance = self.stick_distance.max(dims.radius + 0.02);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.dead_zone) {
            return Err(ConfigError::DeadZone(self.dead_zone));
        }
        if !(self.gravity < 0.0) {
            return Err(ConfigError::Gravity(self.gravity));
        }
        if !(self.grounded_velocity < 0.0) {
            return Err(ConfigError::GroundedVelocity(self.grounded_velocity));
        }
        if !(0.0..=180.0).contains(&self.max_align_angle) {
            return Err(ConfigError::AlignAngle(self.max_align_angle));
        }
        if !(0.0..=90.0).contains(&self.pitch_clamp) {
            return Err(ConfigError::PitchClamp(self.pitch_clamp));
        }
        for (name, value) in [
            ("walk_speed", self.walk_speed),
            ("run_speed", self.run_speed),
            ("jump_height", self.jump_height),
            ("max_speed", self.max_speed),
            ("climb_speed", self.climb_speed),
            ("detect_distance", self.detect_distance),
            ("ground_radius", self.ground_radius),
            ("align_lerp", self.align_lerp),
            ("extra_push", self.extra_push),
            ("climb_play_rate_speed", self.climb_play_rate_speed),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::Negative { name, value });
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Reflect, Debug, PartialEq)]
pub struct CapsuleDims {
    pub radius: f32,
    pub height: f32,
}

impl Default for CapsuleDims {
    fn default() -> Self {
        Self {
            radius: 0.3,
            height: 1.8,
        }
    }
}

impl CapsuleDims {
    pub fn new(radius: f32, height: f32) -> Result<Self, ConfigError> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(ConfigError::Radius(radius));
        }
        if !(height >= 2.0 * radius && height.is_finite()) {
            return Err(ConfigError::Height { height, radius });
        }
        Ok(Self { radius, height })
    }

    pub fn from_collider(collider: &Collider) -> Result<Self, ConfigError> {
        let aabb = collider.aabb(default(), Rotation::default());
        let size = aabb.max - aabb.min;
        Self::new(size.x.min(size.z) / 2.0, size.y)
    }

    pub fn half_height(&self) -> f32 {
        self.height / 2.0
    }
}

#[derive(Clone, Copy, Reflect, Debug, Default, PartialEq, Eq)]
pub enum LocomotionMode {
    #[default]
    Locomoting,
    /// Attached to a wall. `grace` is set while the wall is lost but the detach window is open.
    Climbing { grace: bool },
    Mantling,
}

impl LocomotionMode {
    /// Climbing, grace included.
    pub fn is_climbing(self) -> bool {
        matches!(self, Self::Climbing { .. })
    }
}

/// Per-character state, written once per tick by [`locomotion::step`].
#[derive(Component, Clone, Reflect, Debug)]
#[reflect(Component)]
pub struct CharacterState {
    /// Capsule centre.
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub vertical_velocity: f32,
    pub mode: LocomotionMode,
    pub dims: CapsuleDims,
    pub grounded: bool,
    /// Time since the last grounded tick. `None` if never grounded.
    pub last_ground: Option<Stopwatch>,
    pub jump_pressed: Option<Stopwatch>,
    pub last_wall: Option<Stopwatch>,
    pub last_wall_normal: Option<Vec3>,
    pub climb_play_rate: f32,
    /// Damped value behind [`AnimFloat::Speed`].
    pub speed: f32,
    pub movement_enabled: bool,
    pub mantle: Option<MantleTask>,
    pub in_climb_zone: bool,
}

impl Default for CharacterState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            vertical_velocity: 0.0,
            mode: LocomotionMode::Locomoting,
            dims: CapsuleDims::default(),
            grounded: false,
            last_ground: None,
            jump_pressed: None,
            last_wall: None,
            last_wall_normal: None,
            climb_play_rate: 0.0,
            speed: 0.0,
            movement_enabled: true,
            mantle: None,
            in_climb_zone: false,
        }
    }
}

impl CharacterState {
    pub fn new(position: Vec3, yaw: f32, dims: CapsuleDims) -> Self {
        Self {
            position,
            yaw,
            dims,
            ..default()
        }
    }

    /// Yaw follows the wall instead of input. Volume climbs have no wall to follow.
    pub fn is_yaw_locked(&self) -> bool {
        self.mode.is_climbing() && self.last_wall_normal.is_some()
    }

    pub(crate) fn tick_windows(&mut self, delta: Duration) {
        for window in [
            &mut self.last_ground,
            &mut self.jump_pressed,
            &mut self.last_wall,
        ]
        .into_iter()
        .flatten()
        {
            window.tick(delta);
        }
    }
}
