//! Third-person camera, player orientation and cursor lock.
//!
//! The camera orbits a pivot above the player using yaw/pitch accumulated
//! from the look delta. The player's [`Orientation`] is the flattened
//! camera-to-player direction, and the visible model turns smoothly towards
//! the direction of movement input.

use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};

use crate::input::ActionState;
use crate::player::{Player, PlayerModel};
use crate::settings::{CameraSettings, ControlsSettings, Settings};

/// Radians of rotation per unit of mouse motion at sensitivity 1.0.
const LOOK_RADIANS_PER_COUNT: f32 = 0.0025;

/// Movement basis of the player, derived from the camera every frame.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    /// Unit vector in the horizontal plane.
    pub forward: Vec3,
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation { forward: Vec3::NEG_Z }
    }
}

impl Orientation {
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.forward.cross(Vec3::Y).normalize_or_zero()
    }
}

/// Orbit state of the camera, in radians.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct ThirdPersonCamera {
    pub yaw: f32,
    pub pitch: f32,
}

impl ThirdPersonCamera {
    /// Apply a look delta (already inverted per settings) and clamp pitch.
    pub fn apply_delta(&mut self, delta: Vec2, controls: &ControlsSettings, camera: &CameraSettings) {
        let max_pitch = camera.max_pitch.to_radians();
        let scale = controls.mouse_sensitivity * LOOK_RADIANS_PER_COUNT;
        self.yaw -= delta.x * scale;
        self.pitch = (self.pitch - delta.y * scale).clamp(-max_pitch, max_pitch);
    }

    #[must_use]
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Camera transform orbiting `target` (the player origin).
    #[must_use]
    pub fn placement(&self, target: Vec3, camera: &CameraSettings) -> Transform {
        let rotation = self.rotation();
        let pivot = target + Vec3::Y * camera.height;
        Transform { translation: pivot + rotation * Vec3::Z * camera.distance, rotation, scale: Vec3::ONE }
    }
}

/// Horizontal direction from the camera towards the player; `fallback` when
/// the camera is directly above or below.
#[must_use]
pub fn flat_forward(camera: Vec3, player: Vec3, fallback: Vec3) -> Vec3 {
    let dir = (player - Vec3::new(camera.x, player.y, camera.z)).normalize_or_zero();
    if dir == Vec3::ZERO { fallback } else { dir }
}

/// Rotate `current` towards facing `dir` by interpolation factor `t`.
#[must_use]
pub fn turn_towards(current: Quat, dir: Vec3, t: f32) -> Quat {
    let flat = Vec3::new(dir.x, 0.0, dir.z);
    if flat.length_squared() < 1e-6 {
        return current;
    }
    let target = Transform::IDENTITY.looking_to(flat, Vec3::Y).rotation;
    current.slerp(target, t.clamp(0.0, 1.0))
}

/// Whether the cursor should be grabbed and hidden.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorLock {
    pub locked: bool,
}

impl Default for CursorLock {
    fn default() -> Self {
        CursorLock { locked: true }
    }
}

pub fn spawn_camera(commands: &mut Commands) -> Entity {
    commands
        .spawn((
            Camera3dBundle { transform: Transform::from_xyz(0.0, 4.0, 8.0), ..default() },
            ThirdPersonCamera::default(),
            Name::new("camera"),
        ))
        .id()
}

#[allow(clippy::needless_pass_by_value)]
pub fn orbit_camera(
    actions: Res<ActionState>,
    settings: Res<Settings>,
    cursor: Res<CursorLock>,
    players: Query<&Transform, (With<Player>, Without<ThirdPersonCamera>)>,
    mut cameras: Query<(&mut Transform, &mut ThirdPersonCamera)>,
) {
    let Ok(player) = players.get_single() else { return };
    for (mut tf, mut cam) in &mut cameras {
        if cursor.locked && actions.look_delta != Vec2::ZERO {
            cam.apply_delta(actions.look_delta, &settings.controls, &settings.camera);
        }
        *tf = cam.placement(player.translation, &settings.camera);
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn update_orientation(
    time: Res<Time>,
    actions: Res<ActionState>,
    settings: Res<Settings>,
    cameras: Query<&Transform, With<ThirdPersonCamera>>,
    mut players: Query<(&Transform, &mut Orientation), (With<Player>, Without<PlayerModel>)>,
    mut models: Query<(&Parent, &mut Transform), (With<PlayerModel>, Without<Player>, Without<ThirdPersonCamera>)>,
) {
    let Ok(camera) = cameras.get_single() else { return };
    for (tf, mut orientation) in &mut players {
        orientation.forward = flat_forward(camera.translation, tf.translation, orientation.forward);
    }

    if actions.move_axis == Vec2::ZERO {
        return;
    }
    let t = time.delta_seconds() * settings.camera.rotation_speed;
    for (parent, mut model) in &mut models {
        let Ok((_, orientation)) = players.get(parent.get()) else { continue };
        let input_dir = orientation.forward * actions.move_axis.y + orientation.right() * actions.move_axis.x;
        model.rotation = turn_towards(model.rotation, input_dir, t);
    }
}

/// Push [`CursorLock`] into the primary window.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_cursor(lock: Res<CursorLock>, mut windows: Query<&mut Window, With<PrimaryWindow>>) {
    if !lock.is_changed() {
        return;
    }
    for mut w in &mut windows {
        w.cursor.grab_mode = if lock.locked { CursorGrabMode::Locked } else { CursorGrabMode::None };
        w.cursor.visible = !lock.locked;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_is_clamped() {
        let mut cam = ThirdPersonCamera::default();
        let camera = CameraSettings::default();
        cam.apply_delta(Vec2::new(0.0, -1.0e6), &ControlsSettings::default(), &camera);
        assert!((cam.pitch - camera.max_pitch.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn default_orbit_sits_behind_player() {
        let cam = ThirdPersonCamera::default();
        let settings = CameraSettings::default();
        let placed = cam.placement(Vec3::ZERO, &settings);
        assert!((placed.translation - Vec3::new(0.0, settings.height, settings.distance)).length() < 1e-5);
        let fwd = flat_forward(placed.translation, Vec3::ZERO, Vec3::X);
        assert!((fwd - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn flat_forward_falls_back_when_overhead() {
        assert_eq!(flat_forward(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO, Vec3::X), Vec3::X);
    }

    #[test]
    fn right_is_perpendicular() {
        let o = Orientation::default();
        assert!((o.right() - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn model_turns_towards_input() {
        let target = Vec3::X;
        let mut rot = Quat::IDENTITY;
        for _ in 0..200 {
            rot = turn_towards(rot, target, 0.1);
        }
        let facing = rot * Vec3::NEG_Z;
        assert!((facing - target).length() < 1e-3);
        assert_eq!(turn_towards(rot, Vec3::Y, 0.5), rot);
    }
}
