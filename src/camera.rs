use crate::{CharacterState, look, prelude::*};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        RunFixedMainLoop,
        sync_camera_transform.after(TransformEasingSystems::UpdateEasingTick),
    );
}

/// Put this on the camera that should follow a character's view.
#[derive(Component, Clone, Copy)]
#[relationship(relationship_target = CharacterControllerCamera)]
pub struct CharacterControllerCameraOf(pub Entity);

#[derive(Component, Clone, Copy)]
#[relationship_target(relationship = CharacterControllerCameraOf)]
pub struct CharacterControllerCamera(Entity);

impl CharacterControllerCamera {
    pub fn get(self) -> Entity {
        self.0
    }
}

pub(crate) fn sync_camera_transform(
    mut cameras: Query<
        (&mut Transform, &CharacterControllerCameraOf),
        (Without<CharacterState>,),
    >,
    kccs: Query<(&Transform, &ClimbController, &CharacterState)>,
) {
    // Can't use GlobalTransform directly: outdated -> jitter
    for (mut camera_transform, camera_of) in cameras.iter_mut() {
        if let Ok((kcc_transform, cfg, state)) = kccs.get(camera_of.0) {
            camera_transform.translation = eye_position(kcc_transform.translation, cfg, state);
            camera_transform.rotation = look::view_rotation(state.yaw, state.pitch);
        }
    }
}

/// `view_height` is measured from the feet, the transform sits at the capsule centre.
pub fn eye_position(center: Vec3, cfg: &ClimbController, state: &CharacterState) -> Vec3 {
    center + Vec3::Y * (-state.dims.half_height() + cfg.view_height)
}
