use crate::{CapsuleDims, ClimbController, prelude::*};
use core::time::Duration;

#[derive(PhysicsLayer, Default, Clone, Copy, Debug)]
pub enum ClamberLayer {
    #[default]
    Default,
    Ground,
    Climbable,
    ClimbZone,
}

impl ClamberLayer {
    /// Every layer that blocks movement.
    pub fn solid() -> LayerMask {
        [
            ClamberLayer::Default,
            ClamberLayer::Ground,
            ClamberLayer::Climbable,
        ]
        .into()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallContact {
    pub point: Vec3,
    /// Outward normal of the wall.
    pub normal: Vec3,
    pub distance: f32,
}

pub trait SpatialQueries {
    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Dir3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<WallContact>;

    fn raycast(&self, origin: Vec3, direction: Dir3, max_distance: f32, mask: LayerMask) -> bool;

    fn check_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> bool;

    fn check_capsule(&self, center: Vec3, dims: CapsuleDims, mask: LayerMask) -> bool;
}

/// The only sanctioned way to change a character's position.
pub trait Mover {
    fn move_by(&mut self, position: Vec3, displacement: Vec3) -> Vec3;

    /// Whether the last move left the character resting on walkable ground.
    fn resting_contact(&self) -> bool;
}

pub struct AvianQueries<'a> {
    pipeline: &'a SpatialQueryPipeline,
    filter: &'a SpatialQueryFilter,
}

impl<'a> AvianQueries<'a> {
    pub fn new(pipeline: &'a SpatialQueryPipeline, filter: &'a SpatialQueryFilter) -> Self {
        Self { pipeline, filter }
    }

    fn filter(&self, mask: LayerMask) -> SpatialQueryFilter {
        self.filter.clone().with_mask(mask)
    }

    fn intersects(&self, shape: &Collider, center: Vec3, mask: LayerMask) -> bool {
        let mut intersecting = false;
        self.pipeline.shape_intersections_callback(
            shape,
            center,
            Quat::IDENTITY,
            &self.filter(mask),
            |_| {
                intersecting = true;
                false
            },
        );
        intersecting
    }
}

impl SpatialQueries for AvianQueries<'_> {
    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Dir3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<WallContact> {
        let hit = self.pipeline.cast_shape(
            &Collider::sphere(radius),
            origin,
            Quat::IDENTITY,
            direction,
            &ShapeCastConfig::from_max_distance(max_distance),
            &self.filter(mask),
        )?;
        Some(WallContact {
            point: hit.point1,
            normal: hit.normal1,
            distance: hit.distance,
        })
    }

    fn raycast(&self, origin: Vec3, direction: Dir3, max_distance: f32, mask: LayerMask) -> bool {
        self.pipeline
            .cast_ray(origin, direction, max_distance, true, &self.filter(mask))
            .is_some()
    }

    fn check_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> bool {
        self.intersects(&Collider::sphere(radius), center, mask)
    }

    fn check_capsule(&self, center: Vec3, dims: CapsuleDims, mask: LayerMask) -> bool {
        let length = (dims.height - 2.0 * dims.radius).max(0.0);
        self.intersects(&Collider::capsule(dims.radius, length), center, mask)
    }
}

pub struct KinematicMover<'a, 'w, 's> {
    move_and_slide: &'a MoveAndSlide<'w, 's>,
    collider: &'a Collider,
    rotation: Quat,
    cfg: &'a ClimbController,
    dt: Duration,
    resting: bool,
}

impl<'a, 'w, 's> KinematicMover<'a, 'w, 's> {
    pub fn new(
        move_and_slide: &'a MoveAndSlide<'w, 's>,
        collider: &'a Collider,
        rotation: Quat,
        cfg: &'a ClimbController,
        dt: Duration,
        position: Vec3,
    ) -> Self {
        let mut mover = Self {
            move_and_slide,
            collider,
            rotation,
            cfg,
            dt,
            resting: false,
        };
        mover.resting = mover.probe_resting(position);
        mover
    }

    fn probe_resting(&self, position: Vec3) -> bool {
        let hit = self.move_and_slide.cast_move(
            self.collider,
            position,
            self.rotation,
            Dir3::NEG_Y * self.cfg.ground_distance,
            self.cfg.move_and_slide.skin_width,
            &self.cfg.filter,
        );
        hit.is_some_and(|hit| hit.normal1.y >= self.cfg.min_walk_cos)
    }
}

impl Mover for KinematicMover<'_, '_, '_> {
    fn move_by(&mut self, position: Vec3, displacement: Vec3) -> Vec3 {
        let dt = self.dt.as_secs_f32();
        if dt <= 0.0 || displacement == Vec3::ZERO {
            return position;
        }
        // move-and-slide works in velocities, so spread the displacement over the step
        let out = self.move_and_slide.move_and_slide(
            self.collider,
            position,
            self.rotation,
            displacement / dt,
            self.dt,
            &self.cfg.move_and_slide,
            &self.cfg.filter,
            |_| true,
        );
        self.resting = self.probe_resting(out.position);
        out.position
    }

    fn resting_contact(&self) -> bool {
        self.resting
    }
}
