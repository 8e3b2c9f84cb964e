//! Player components and systems (locomotion, camera).
//!
//! The player root carries the physics body, the trigger sensor, health and
//! locomotion state. Its only child is the visible model, which turns to face
//! the direction of movement.
//!
//! # Example:
//!
//! ```
//! use bevy::prelude::*;
//! use cinderfrost::player::{Player, spawn_player};
//! use cinderfrost::settings::Settings;
//!
//! let mut world = World::new();
//! let settings = Settings::default();
//! let mut queue = bevy::ecs::world::CommandQueue::default();
//! let player = spawn_player(&mut Commands::new(&mut queue, &world), &settings, Vec3::new(0.0, 2.0, 0.0));
//! queue.apply(&mut world);
//! assert!(world.get::<Player>(player).is_some());
//! ```
pub mod camera;
pub mod movement;

use bevy::prelude::*;

use crate::health::Health;
use crate::input::InputSet;
use crate::physics::{Body, PhysicsSet, Sensor};
use crate::settings::Settings;
use crate::spells::IceCaster;

pub use camera::{
    CursorLock, Orientation, ThirdPersonCamera, flat_forward, orbit_camera, spawn_camera, sync_cursor, turn_towards,
    update_orientation,
};
pub use movement::{GroundProbe, Locomotion, MovementState, classify, locomotion_fixed, locomotion_frame, probe_ground};

/// Radius of the sphere used to detect hazards, pickups and teleporters.
pub const PLAYER_SENSOR_RADIUS: f32 = 0.9;

/// Marker for the player root entity.
#[derive(Component, Debug, Default)]
pub struct Player;

/// Marker for the player's visible model (child of the root).
#[derive(Component, Debug, Default)]
pub struct PlayerModel;

/// Spawn the player root and its model at `at`.
pub fn spawn_player(commands: &mut Commands, settings: &Settings, at: Vec3) -> Entity {
    let half_height = settings.movement.player_height * 0.5;
    commands
        .spawn((
            Player,
            Name::new("player"),
            SpatialBundle::from_transform(Transform::from_translation(at)),
            Body::with_half_height(half_height),
            Sensor::new(PLAYER_SENSOR_RADIUS),
            Locomotion::new(&settings.movement, 1.0),
            Orientation::default(),
            Health::new(&settings.health),
            IceCaster::default(),
        ))
        .with_children(|root| {
            root.spawn((PlayerModel, Name::new("player model"), SpatialBundle::default()));
        })
        .id()
}

/// Move the player to `at` and clear any motion and stale contacts.
pub fn place_player(tf: &mut Transform, body: &mut Body, sensor: &mut Sensor, at: Vec3) {
    tf.translation = at;
    body.reset();
    sensor.clear();
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerSet;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CursorLock>()
            .configure_sets(Update, PlayerSet.after(InputSet).after(PhysicsSet::Snapshot))
            .add_systems(Update, (locomotion_frame, orbit_camera, update_orientation).chain().in_set(PlayerSet))
            .add_systems(Update, sync_cursor)
            .add_systems(FixedUpdate, locomotion_fixed.before(PhysicsSet::Integrate));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawned_player_has_model_child() {
        let mut app = App::new();
        let settings = Settings::default();
        let player = {
            let world = app.world_mut();
            let mut queue = bevy::ecs::world::CommandQueue::default();
            let id = spawn_player(&mut Commands::new(&mut queue, world), &settings, Vec3::Y);
            queue.apply(world);
            id
        };
        let world = app.world();
        let children = world.get::<Children>(player).unwrap();
        assert_eq!(children.len(), 1);
        assert!(world.get::<PlayerModel>(children[0]).is_some());
        assert_eq!(world.get::<Body>(player).unwrap().half_height, settings.movement.player_height * 0.5);
    }

    #[test]
    fn place_player_resets_motion() {
        let mut tf = Transform::default();
        let mut body = Body { velocity: Vec3::ONE, ..Default::default() };
        let mut sensor = Sensor::new(1.0);
        place_player(&mut tf, &mut body, &mut sensor, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(tf.translation, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(body.velocity, Vec3::ZERO);
    }
}
