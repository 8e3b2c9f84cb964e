//! Fire breath: a `Fire` trigger volume in front of the player.
//!
//! Holding the fire action keeps the volume alive, but it blinks off and on
//! every toggle interval so that entities already inside get a fresh enter
//! contact (which is what re-ignites a put-out flammable or restarts a melt).

use bevy::prelude::*;

use crate::input::ActionState;
use crate::physics::{Shape, Tag, TriggerVolume};
use crate::player::{Player, PlayerModel, ThirdPersonCamera};
use crate::settings::{Settings, SpellSettings};

/// Toggle state of the fire breath hitbox.
#[derive(Component, Debug, Clone, Default)]
pub struct FireBreath {
    pub lit: bool,
    timer: f32,
}

impl FireBreath {
    /// Advance by `dt` with the fire action `held`; returns whether the
    /// hitbox should be active.
    pub fn step(&mut self, held: bool, interval: f32, dt: f32) -> bool {
        if !held {
            self.lit = false;
            self.timer = 0.0;
            return false;
        }
        if self.timer <= 0.0 && !self.lit {
            self.lit = true;
            self.timer = interval;
            return true;
        }
        self.timer -= dt;
        if self.timer <= 0.0 {
            self.lit = !self.lit;
            self.timer = interval;
        }
        self.lit
    }
}

/// World placement of the hitbox: ahead of the player along the model's yaw,
/// tilted by the camera pitch plus the configured adjustment.
#[must_use]
pub fn breath_placement(player: Vec3, model_rotation: Quat, camera_pitch: f32, spells: &SpellSettings) -> Transform {
    let (yaw, _, _) = model_rotation.to_euler(EulerRot::YXZ);
    let pitch = camera_pitch - spells.fire_angle_adjustment.to_radians();
    let rotation = Quat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0);
    Transform {
        translation: player + rotation * Vec3::NEG_Z * spells.fire_reach,
        rotation,
        scale: Vec3::ONE,
    }
}

pub fn spawn_fire_breath(commands: &mut Commands, spells: &SpellSettings) -> Entity {
    let mut volume = TriggerVolume::new(Shape::Cuboid { half_extents: spells.fire_half_extents }, Tag::Fire);
    volume.active = false;
    commands
        .spawn((FireBreath::default(), volume, Name::new("fire breath"), SpatialBundle::default()))
        .id()
}

#[allow(clippy::needless_pass_by_value)]
pub fn update_fire_breath(
    time: Res<Time>,
    actions: Res<ActionState>,
    settings: Res<Settings>,
    players: Query<&Transform, (With<Player>, Without<FireBreath>)>,
    models: Query<&Transform, (With<PlayerModel>, Without<FireBreath>)>,
    cameras: Query<&ThirdPersonCamera>,
    mut breaths: Query<(&mut FireBreath, &mut TriggerVolume, &mut Transform)>,
) {
    let spells = &settings.spells;
    let Ok(player) = players.get_single() else { return };
    let model_rotation = models.get_single().map_or(Quat::IDENTITY, |m| m.rotation);
    let pitch = cameras.get_single().map_or(0.0, |c| c.pitch);

    for (mut breath, mut volume, mut tf) in &mut breaths {
        let was_lit = breath.lit;
        volume.active = breath.step(actions.fire_held, spells.fire_toggle_interval, time.delta_seconds());
        volume.shape = Shape::Cuboid { half_extents: spells.fire_half_extents };
        *tf = breath_placement(player.translation, model_rotation, pitch, spells);
        if was_lit != breath.lit {
            trace!("fire breath {}", if breath.lit { "on" } else { "off" });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_fire_blinks_at_interval() {
        let mut breath = FireBreath::default();
        assert!(breath.step(true, 0.1, 0.016));
        let mut states = Vec::new();
        for _ in 0..4 {
            states.push(breath.step(true, 0.1, 0.1));
        }
        assert_eq!(states, vec![false, true, false, true]);
    }

    #[test]
    fn release_turns_hitbox_off_immediately() {
        let mut breath = FireBreath::default();
        breath.step(true, 0.1, 0.016);
        assert!(!breath.step(false, 0.1, 0.016));
        assert!(breath.step(true, 0.1, 0.016));
    }

    #[test]
    fn hitbox_sits_in_front_of_the_model() {
        let spells = SpellSettings::default();
        let facing_x = Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2);
        let tf = breath_placement(Vec3::ZERO, facing_x, 0.0, &spells);
        assert!((tf.translation - Vec3::X * spells.fire_reach).length() < 1e-4);
    }

    #[test]
    fn angle_adjustment_aims_lower() {
        let spells = SpellSettings { fire_angle_adjustment: 30.0, ..Default::default() };
        let tf = breath_placement(Vec3::ZERO, Quat::IDENTITY, 0.0, &spells);
        assert!(tf.translation.y < 0.0);
    }
}
