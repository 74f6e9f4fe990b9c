use std::collections::HashMap;

use core::time::Duration;

use crate::{
    CapsuleDims, CharacterState, ClimbController,
    anim::{AnimBool, AnimFloat, AnimTrigger, AnimationSink},
    input::InputSample,
    locomotion,
    physics::{ClamberLayer, Mover, SpatialQueries, WallContact},
    prelude::*,
};

/// Front face of the test wall. The character starts at the origin facing it.
pub(crate) const WALL_Z: f32 = -1.0;

const CONTACT_EPSILON: f32 = 1e-3;

pub(crate) fn prepared_config() -> ClimbController {
    let mut cfg = ClimbController::default();
    cfg.prepare(CapsuleDims::default()).unwrap();
    cfg
}

fn overlaps(mask: LayerMask, layer: ClamberLayer) -> bool {
    mask.0 & LayerMask::from(layer).0 != 0
}

/// Climbable slab spanning the whole x axis, between `front_z - thickness` and `front_z`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Wall {
    pub front_z: f32,
    pub thickness: f32,
    pub bottom: f32,
    pub top: f32,
}

impl Wall {
    fn back_z(&self) -> f32 {
        self.front_z - self.thickness
    }
}

/// An infinite ground plane, at most one wall and a list of climb zones.
#[derive(Clone, Debug, Default)]
pub(crate) struct StubWorld {
    pub ground: Option<f32>,
    pub wall: Option<Wall>,
    /// Axis-aligned climb zones as `(min, max)`.
    pub zones: Vec<(Vec3, Vec3)>,
}

impl StubWorld {
    pub fn flat() -> Self {
        Self {
            ground: Some(0.0),
            ..default()
        }
    }

    pub fn with_wall(front_z: f32, top: f32) -> Self {
        Self {
            wall: Some(Wall {
                front_z,
                thickness: 1.0,
                bottom: 0.0,
                top,
            }),
            ..Self::flat()
        }
    }
}

impl SpatialQueries for StubWorld {
    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Dir3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<WallContact> {
        let wall = self.wall?;
        if !overlaps(mask, ClamberLayer::Climbable) || direction.z >= 0.0 {
            return None;
        }
        if origin.z + radius <= wall.back_z() {
            return None;
        }
        let distance = ((origin.z - radius - wall.front_z) / -direction.z).max(0.0);
        if distance > max_distance {
            return None;
        }
        let center = origin + direction * distance;
        if !(wall.bottom..=wall.top).contains(&center.y) {
            return None;
        }
        Some(WallContact {
            point: vec3(center.x, center.y, wall.front_z),
            normal: Vec3::Z,
            distance,
        })
    }

    fn raycast(&self, origin: Vec3, direction: Dir3, max_distance: f32, mask: LayerMask) -> bool {
        let Some(wall) = self.wall else {
            return false;
        };
        if !overlaps(mask, ClamberLayer::Climbable) {
            return false;
        }
        // slab test over y and z, the wall is unbounded along x
        let mut near = 0.0f32;
        let mut far = max_distance;
        for (start, dir, min, max) in [
            (origin.y, direction.y, wall.bottom, wall.top),
            (origin.z, direction.z, wall.back_z(), wall.front_z),
        ] {
            if dir.abs() < 1e-6 {
                if start < min || start > max {
                    return false;
                }
                continue;
            }
            let (a, b) = ((min - start) / dir, (max - start) / dir);
            near = near.max(a.min(b));
            far = far.min(a.max(b));
        }
        near <= far
    }

    fn check_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> bool {
        if !overlaps(mask, ClamberLayer::Ground) && !overlaps(mask, ClamberLayer::Default) {
            return false;
        }
        self.ground
            .is_some_and(|ground| center.y - radius <= ground + CONTACT_EPSILON)
    }

    fn check_capsule(&self, center: Vec3, dims: CapsuleDims, mask: LayerMask) -> bool {
        if !overlaps(mask, ClamberLayer::ClimbZone) {
            return false;
        }
        let half = vec3(dims.radius, dims.half_height(), dims.radius);
        let (min, max) = (center - half, center + half);
        self.zones.iter().any(|(zone_min, zone_max)| {
            min.cmple(*zone_max).all() && max.cmpge(*zone_min).all()
        })
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct StubMover {
    pub resting: bool,
    pub moves: Vec<Vec3>,
    pub floor: Option<f32>,
    pub half_height: f32,
}

impl StubMover {
    pub fn free() -> Self {
        Self {
            half_height: CapsuleDims::default().half_height(),
            ..default()
        }
    }

    pub fn on_floor(floor: f32) -> Self {
        Self {
            floor: Some(floor),
            ..Self::free()
        }
    }
}

impl Mover for StubMover {
    fn move_by(&mut self, position: Vec3, displacement: Vec3) -> Vec3 {
        self.moves.push(displacement);
        let mut end = position + displacement;
        self.resting = false;
        if let Some(floor) = self.floor {
            let lowest = floor + self.half_height;
            if end.y <= lowest + CONTACT_EPSILON {
                end.y = end.y.max(lowest);
                self.resting = true;
            }
        }
        end
    }

    fn resting_contact(&self) -> bool {
        self.resting
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingSink {
    pub floats: HashMap<AnimFloat, f32>,
    pub bools: HashMap<AnimBool, bool>,
    pub fired: Vec<AnimTrigger>,
    pub writes: usize,
}

impl RecordingSink {
    pub fn float(&self, param: AnimFloat) -> f32 {
        self.floats.get(&param).copied().unwrap_or_default()
    }

    pub fn flag(&self, param: AnimBool) -> bool {
        self.bools.get(&param).copied().unwrap_or_default()
    }

    pub fn count(&self, trigger: AnimTrigger) -> usize {
        self.fired.iter().filter(|fired| **fired == trigger).count()
    }
}

impl AnimationSink for RecordingSink {
    fn set_float(&mut self, param: AnimFloat, value: f32) {
        self.writes += 1;
        self.floats.insert(param, value);
    }

    fn set_bool(&mut self, param: AnimBool, value: bool) {
        self.writes += 1;
        self.bools.insert(param, value);
    }

    fn fire(&mut self, trigger: AnimTrigger) {
        self.fired.push(trigger);
    }
}

pub(crate) struct Rig {
    pub cfg: ClimbController,
    pub state: CharacterState,
    pub world: StubWorld,
    pub mover: StubMover,
    pub sink: RecordingSink,
}

impl Rig {
    /// Capsule resting on y = 0 at the origin, facing -Z.
    pub fn new(world: StubWorld) -> Self {
        let dims = CapsuleDims::default();
        Self {
            cfg: prepared_config(),
            state: CharacterState::new(vec3(0.0, dims.half_height(), 0.0), 0.0, dims),
            world,
            mover: StubMover::on_floor(0.0),
            sink: default(),
        }
    }

    pub fn facing_wall(front_z: f32, top: f32) -> Self {
        Self::new(StubWorld::with_wall(front_z, top))
    }

    pub fn tick(&mut self, input: InputSample, dt: f32) {
        locomotion::step(
            &self.cfg,
            &mut self.state,
            input,
            Duration::from_secs_f32(dt),
            true,
            &self.world,
            &mut self.mover,
            &mut self.sink,
        );
    }
}
