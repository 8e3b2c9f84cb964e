//! Display-related systems: vsync and debug outlines.
use bevy::prelude::*;
use bevy::window::{PresentMode, PrimaryWindow};
use cinderfrost::input::ActionState;
use cinderfrost::physics::{Collider, Sensor, Shape, Tag, TriggerVolume};
use cinderfrost::settings::Settings;

/// Sync `Settings.graphics.vsync` into the present mode of the primary window.
/// Allows toggling vsync at runtime (settings hot-reload) without restarting.
pub fn sync_vsync_settings(
    settings: Res<Settings>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut last: Local<Option<bool>>,
) {
    let desired = settings.graphics.vsync;
    if *last == Some(desired) {
        return;
    }

    for mut w in &mut windows {
        w.present_mode = if desired { PresentMode::Fifo } else { PresentMode::AutoNoVsync };
    }
    *last = Some(desired);
}

/// Flip collider/trigger outlines on the toggle action.
#[allow(clippy::needless_pass_by_value)]
pub fn toggle_gizmos(actions: Res<ActionState>, mut settings: ResMut<Settings>) {
    if actions.toggle_gizmos {
        settings.graphics.gizmos = !settings.graphics.gizmos;
        info!("gizmos {}", if settings.graphics.gizmos { "on" } else { "off" });
    }
}

fn tag_color(tag: Tag) -> Color {
    match tag {
        Tag::Fire | Tag::Hazard => Color::srgb(1.0, 0.35, 0.1),
        Tag::Ice => Color::srgb(0.5, 0.85, 1.0),
        Tag::KillPlane => Color::srgb(0.6, 0.0, 0.0),
        Tag::Teleporter => Color::srgb(0.7, 0.3, 1.0),
        Tag::Flammable => Color::srgb(0.8, 0.6, 0.2),
        _ => Color::srgb(0.6, 0.6, 0.6),
    }
}

fn draw_shape(gizmos: &mut Gizmos, shape: &Shape, tf: &Transform, color: Color) {
    match *shape {
        Shape::Cuboid { half_extents } => {
            let outline = Transform { translation: tf.translation, rotation: tf.rotation, scale: half_extents * 2.0 * tf.scale };
            gizmos.cuboid(outline, color);
        }
        Shape::Sphere { radius } => {
            gizmos.sphere(tf.translation, tf.rotation, radius, color);
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn draw_gizmos(
    settings: Res<Settings>,
    mut gizmos: Gizmos,
    colliders: Query<(&Collider, &Transform)>,
    volumes: Query<(&TriggerVolume, &Transform)>,
    sensors: Query<(&Sensor, &Transform)>,
) {
    if !settings.graphics.gizmos {
        return;
    }
    for (collider, tf) in &colliders {
        draw_shape(&mut gizmos, &collider.shape, tf, tag_color(collider.tag));
    }
    for (volume, tf) in volumes.iter().filter(|(v, _)| v.active) {
        draw_shape(&mut gizmos, &volume.shape, tf, tag_color(volume.tag).with_alpha(0.5));
    }
    for (sensor, tf) in &sensors {
        gizmos.sphere(tf.translation, Quat::IDENTITY, sensor.radius, Color::srgb(0.2, 1.0, 0.3));
    }
}
