//! Mesh and material attachment for gameplay entities.
//!
//! Gameplay code spawns bare spatial entities; these systems give them
//! something to render once they appear.
use bevy::prelude::*;
use cinderfrost::physics::{Collider, Shape, Tag};
use cinderfrost::player::PlayerModel;
use cinderfrost::thermal::FireEffect;

fn base_color(tag: Tag) -> Color {
    match tag {
        Tag::Ground => Color::srgb(0.35, 0.4, 0.3),
        Tag::Wall => Color::srgb(0.45, 0.45, 0.5),
        Tag::Hazard => Color::srgb(0.9, 0.3, 0.05),
        Tag::Ice => Color::srgba(0.7, 0.9, 1.0, 0.8),
        Tag::Flammable => Color::srgb(0.55, 0.35, 0.15),
        Tag::Teleporter => Color::srgb(0.6, 0.3, 0.9),
        _ => Color::srgb(0.8, 0.8, 0.8),
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn attach_collider_meshes(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    added: Query<(Entity, &Collider), Added<Collider>>,
) {
    for (entity, collider) in &added {
        let mesh = match collider.shape {
            Shape::Cuboid { half_extents } => meshes.add(Cuboid::from_size(half_extents * 2.0)),
            Shape::Sphere { radius } => meshes.add(Sphere::new(radius).mesh().uv(16, 12)),
        };
        let color = base_color(collider.tag);
        let material = materials.add(StandardMaterial {
            base_color: color,
            perceptual_roughness: if collider.tag == Tag::Ice { 0.1 } else { 0.8 },
            alpha_mode: if collider.tag == Tag::Ice { AlphaMode::Blend } else { AlphaMode::Opaque },
            emissive: if collider.tag == Tag::Hazard { LinearRgba::rgb(2.0, 0.4, 0.0) } else { LinearRgba::BLACK },
            ..default()
        });
        commands.entity(entity).insert((mesh, material));
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn attach_fire_meshes(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    added: Query<Entity, Added<FireEffect>>,
) {
    for entity in &added {
        commands.entity(entity).insert((
            meshes.add(Sphere::new(0.45).mesh().ico(2).unwrap_or_else(|_| Sphere::new(0.45).mesh().uv(12, 8))),
            materials.add(StandardMaterial {
                base_color: Color::srgba(1.0, 0.5, 0.1, 0.7),
                emissive: LinearRgba::rgb(8.0, 2.5, 0.3),
                alpha_mode: AlphaMode::Add,
                unlit: true,
                ..default()
            }),
            Transform::from_xyz(0.0, 0.6, 0.0),
        ));
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn attach_player_mesh(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    added: Query<Entity, Added<PlayerModel>>,
) {
    for entity in &added {
        commands.entity(entity).insert((
            meshes.add(Capsule3d::new(0.45, 1.1)),
            materials.add(StandardMaterial { base_color: Color::srgb(0.2, 0.3, 0.8), ..default() }),
        ));
    }
}
