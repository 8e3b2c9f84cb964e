//! Startup system: lights, the camera and the player.
//!
//! Level geometry is not spawned here; the scene plugin loads the first level
//! on its own.
use bevy::prelude::*;
use cinderfrost::player::{spawn_camera, spawn_player};
use cinderfrost::settings::Settings;

/// Spawn the entities that persist across level loads.
#[allow(clippy::needless_pass_by_value)]
pub fn setup(mut commands: Commands, settings: Res<Settings>) {
    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            shadows_enabled: true,
            illuminance: 8000.0,
            ..default()
        },
        transform: Transform::from_rotation(Quat::from_euler(EulerRot::YXZ, 0.6, -0.9, 0.0)),
        ..default()
    });

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 300.0,
    });

    spawn_camera(&mut commands);
    spawn_player(&mut commands, &settings, Vec3::new(0.0, 2.0, 0.0));
}
