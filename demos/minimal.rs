use avian3d::prelude::*;
use bevy::{
    input::common_conditions::input_just_pressed,
    prelude::*,
    window::{CursorGrabMode, CursorOptions},
};
use bevy_clamber::prelude::*;
use bevy_enhanced_input::prelude::*;

fn main() -> AppExit {
    App::new()
        .add_plugins((
            DefaultPlugins,
            PhysicsPlugins::default(),
            EnhancedInputPlugin,
            ClamberPlugin::default(),
        ))
        .add_input_context::<PlayerInput>()
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (
                capture_cursor.run_if(input_just_pressed(MouseButton::Left)),
                release_cursor.run_if(input_just_pressed(KeyCode::Escape)),
                log_mantles,
            ),
        )
        .run()
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Spawn the player
    let player = commands
        .spawn((
            // The default tuning expects a 0.3 x 1.8 capsule
            ClimbController::default(),
            Collider::capsule(0.3, 1.2),
            Transform::from_xyz(0.0, 2.0, 6.0),
            // The actions `Movement`, `Jump`, etc. are provided by the crate, you just need to bind them.
            PlayerInput,
            actions!(PlayerInput[
                (
                    Action::<Movement>::new(),
                    DeadZone::default(),
                    Bindings::spawn((
                        Cardinal::wasd_keys(),
                        Axial::left_stick()
                    ))
                ),
                (
                    Action::<Jump>::new(),
                    bindings![KeyCode::Space, GamepadButton::South],
                ),
                (
                    Action::<Run>::new(),
                    bindings![KeyCode::ShiftLeft, GamepadButton::LeftThumb],
                ),
                (
                    Action::<RotateCamera>::new(),
                    Bindings::spawn((
                        Spawn((Binding::mouse_motion(), Scale::splat(0.5))),
                        Axial::right_stick().with((Scale::splat(10.0), DeadZone::default())),
                    ))
                ),
            ]),
        ))
        .id();

    commands.spawn((Camera3d::default(), CharacterControllerCameraOf(player)));

    commands.spawn((
        Transform::from_xyz(0.0, 1.0, 0.0).looking_at(vec3(1.0, -2.0, -2.0), Vec3::Y),
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
    ));

    // Ground
    commands.spawn((
        RigidBody::Static,
        Collider::cuboid(40.0, 1.0, 40.0),
        CollisionLayers::new(ClamberLayer::Ground, LayerMask::ALL),
        Mesh3d(meshes.add(Cuboid::new(40.0, 1.0, 40.0))),
        MeshMaterial3d(materials.add(Color::srgb(0.3, 0.5, 0.3))),
        Transform::from_xyz(0.0, -0.5, 0.0),
    ));

    // A climbable wall low enough to mantle over, and a tall one
    for (x, height) in [(-3.0, 2.4), (3.0, 8.0)] {
        commands.spawn((
            RigidBody::Static,
            Collider::cuboid(4.0, height, 1.0),
            CollisionLayers::new(ClamberLayer::Climbable, LayerMask::ALL),
            Mesh3d(meshes.add(Cuboid::new(4.0, height, 1.0))),
            MeshMaterial3d(materials.add(Color::srgb(0.6, 0.4, 0.3))),
            Transform::from_xyz(x, height / 2.0, 0.0),
        ));
    }
}

fn log_mantles(mut characters: Query<&mut AnimationParameters>) {
    for mut anim in &mut characters {
        if anim.take_trigger(AnimTrigger::Mantle) {
            info!("mantle");
        }
        if anim.take_trigger(AnimTrigger::Jump) {
            info!("jump");
        }
    }
}

#[derive(Component, Default)]
pub(crate) struct PlayerInput;

fn capture_cursor(mut cursor: Single<&mut CursorOptions>) {
    cursor.grab_mode = CursorGrabMode::Locked;
    cursor.visible = false;
}

fn release_cursor(mut cursor: Single<&mut CursorOptions>) {
    cursor.visible = true;
    cursor.grab_mode = CursorGrabMode::None;
}
