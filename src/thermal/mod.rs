//! Fire and ice.
//!
//! Flammable entities ignite on contact with fire volumes, burn for a bounded
//! or unbounded time and may spread to their neighbours. Meltable entities
//! shrink while touched by fire (and for a residual window afterwards) or
//! after a natural delay, and are destroyed at their floor scale. Ice volumes
//! put fires out.
//!
//! The state machines live in plain structs ([`Flammable`], [`Meltable`],
//! [`FireSpread`]) so they can be stepped without an `App`; the systems below
//! only route contacts and apply the outcomes to the world.

pub mod flammable;
pub mod melting;
pub mod spread;

use bevy::prelude::*;

use crate::physics::{ColliderSet, ContactKind, PhysicsSet, Tag, TriggerEvent};

pub use flammable::{BurnLimit, BurnOutcome, Flammable, FlammableParams};
pub use melting::{MeltOutcome, Meltable, MeltableParams};
pub use spread::{Candidate, FireSpread, SpreadParams, Spreader, propagate};

/// Marker on the child entity that renders a fire.
#[derive(Component, Debug, Default)]
pub struct FireEffect;

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThermalSet;

pub struct ThermalPlugin;

impl Plugin for ThermalPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(Update, ThermalSet.after(PhysicsSet::Triggers)).add_systems(
            Update,
            (light_initial_fires, apply_elemental_contacts, burn_flammables, spread_fire, melt_meltables)
                .chain()
                .in_set(ThermalSet),
        );
    }
}

fn label(names: &Query<&Name>, entity: Entity) -> String {
    names.get(entity).map_or_else(|_| format!("{entity:?}"), |n| n.as_str().to_owned())
}

/// Spawn the fire effect child when the flammable wants one.
pub fn attach_fire_effect(commands: &mut Commands, entity: Entity, flammable: &mut Flammable) {
    if !flammable.emits_particles || flammable.effect.is_some() {
        return;
    }
    let effect = commands.spawn((FireEffect, Name::new("fire"), SpatialBundle::default())).id();
    commands.entity(entity).add_child(effect);
    flammable.effect = Some(effect);
}

pub fn detach_fire_effect(commands: &mut Commands, flammable: &mut Flammable) {
    if let Some(effect) = flammable.effect.take() {
        commands.entity(effect).despawn_recursive();
    }
}

/// Level layouts may place entities that start out burning.
#[allow(clippy::needless_pass_by_value)]
pub fn light_initial_fires(mut commands: Commands, mut flammables: Query<(Entity, &mut Flammable), Added<Flammable>>) {
    for (entity, mut flammable) in &mut flammables {
        if flammable.on_fire {
            attach_fire_effect(&mut commands, entity, &mut flammable);
        }
    }
}

/// Fire contacts ignite and melt; ice contacts extinguish.
#[allow(clippy::needless_pass_by_value)]
pub fn apply_elemental_contacts(
    mut commands: Commands,
    mut events: EventReader<TriggerEvent>,
    mut flammables: Query<&mut Flammable>,
    mut meltables: Query<&mut Meltable>,
    names: Query<&Name>,
) {
    for ev in events.read() {
        if ev.kind != ContactKind::Enter {
            continue;
        }
        match ev.tag {
            Tag::Fire => {
                if let Ok(mut flammable) = flammables.get_mut(ev.sensor)
                    && flammable.ignite()
                {
                    info!("{} caught fire", label(&names, ev.sensor));
                    attach_fire_effect(&mut commands, ev.sensor, &mut flammable);
                }
                if let Ok(mut meltable) = meltables.get_mut(ev.sensor) {
                    meltable.fire_contact();
                }
            }
            Tag::Ice => {
                if let Ok(mut flammable) = flammables.get_mut(ev.sensor)
                    && flammable.extinguish()
                {
                    info!("{} was put out by ice", label(&names, ev.sensor));
                    detach_fire_effect(&mut commands, &mut flammable);
                }
            }
            _ => {}
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn burn_flammables(
    time: Res<Time>,
    mut commands: Commands,
    mut flammables: Query<(Entity, &mut Flammable)>,
    names: Query<&Name>,
) {
    let dt = time.delta_seconds();
    for (entity, mut flammable) in &mut flammables {
        match flammable.tick_burn(dt) {
            BurnOutcome::Extinguished => {
                info!("{} burnt out", label(&names, entity));
                detach_fire_effect(&mut commands, &mut flammable);
            }
            BurnOutcome::Destroyed => {
                info!("{} burnt down", label(&names, entity));
                commands.entity(entity).despawn_recursive();
            }
            BurnOutcome::Unlit | BurnOutcome::Burning => {}
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn spread_fire(
    time: Res<Time>,
    colliders: Res<ColliderSet>,
    mut commands: Commands,
    mut flammables: Query<(Entity, &mut Flammable, &Transform)>,
    names: Query<&Name>,
) {
    let dt = time.delta_seconds();
    let mut spreaders = Vec::new();
    for (entity, mut flammable, tf) in &mut flammables {
        let on_fire = flammable.on_fire && !flammable.is_burnt_out();
        if flammable.spread.tick(on_fire, dt) {
            spreaders.push(Spreader { entity, position: tf.translation, radius: flammable.spread.radius });
        }
    }
    if spreaders.is_empty() {
        return;
    }
    spreaders.sort_by_key(|s| s.entity);

    let mut candidates: Vec<Candidate> = flammables
        .iter()
        .filter(|(_, f, _)| !f.is_burnt_out())
        .map(|(entity, f, _)| Candidate { entity, on_fire: f.on_fire })
        .collect();

    for entity in propagate(&spreaders, &mut candidates, &*colliders) {
        if let Ok((_, mut flammable, _)) = flammables.get_mut(entity)
            && flammable.ignite()
        {
            debug!("fire spread to {}", label(&names, entity));
            attach_fire_effect(&mut commands, entity, &mut flammable);
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn melt_meltables(
    time: Res<Time>,
    mut commands: Commands,
    mut meltables: Query<(Entity, &mut Meltable, &mut Transform)>,
    names: Query<&Name>,
) {
    let dt = time.delta_seconds();
    for (entity, mut meltable, mut tf) in &mut meltables {
        match meltable.tick(dt) {
            MeltOutcome::Idle => {}
            MeltOutcome::Melting => tf.scale = meltable.scale,
            MeltOutcome::Halted => {
                tf.scale = meltable.scale;
                debug!("{} stopped melting at {:?}", label(&names, entity), meltable.scale);
            }
            MeltOutcome::Destroyed => {
                info!("{} melted away", label(&names, entity));
                commands.entity(entity).despawn_recursive();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::physics::{Collider, LayerMask, Sensor, Shape, TriggerVolume, detect_triggers, refresh_collider_set};

    fn app() -> App {
        let mut app = App::new();
        app.init_resource::<Time>()
            .init_resource::<ColliderSet>()
            .add_event::<TriggerEvent>()
            .add_systems(
                Update,
                (
                    refresh_collider_set,
                    detect_triggers,
                    light_initial_fires,
                    apply_elemental_contacts,
                    burn_flammables,
                    spread_fire,
                    melt_meltables,
                )
                    .chain(),
            );
        app
    }

    fn step(app: &mut App, secs: f32) {
        app.world_mut().resource_mut::<Time>().advance_by(Duration::from_secs_f32(secs));
        app.update();
    }

    fn crate_at(app: &mut App, x: f32, params: FlammableParams) -> Entity {
        app.world_mut()
            .spawn((
                Flammable::new(&params),
                Collider::cuboid(Vec3::splat(0.5), Tag::Flammable, LayerMask::DEFAULT),
                Sensor::new(0.5),
                Transform::from_xyz(x, 0.0, 0.0),
                Name::new("crate"),
            ))
            .id()
    }

    #[test]
    fn fire_contact_ignites_and_adds_effect() {
        let mut app = app();
        let target = crate_at(&mut app, 0.0, FlammableParams::default());
        app.world_mut().spawn((TriggerVolume::new(Shape::Sphere { radius: 1.0 }, Tag::Fire), Transform::default()));
        step(&mut app, 0.1);

        let f = app.world().get::<Flammable>(target).unwrap();
        assert!(f.on_fire);
        let effect = f.effect.unwrap();
        assert!(app.world().get::<FireEffect>(effect).is_some());
    }

    #[test]
    fn ice_contact_extinguishes_and_removes_effect() {
        let mut app = app();
        let target = crate_at(&mut app, 0.0, FlammableParams { lit: true, ..Default::default() });
        step(&mut app, 0.1);
        assert!(app.world().get::<Flammable>(target).unwrap().effect.is_some());

        app.world_mut().spawn((TriggerVolume::new(Shape::Sphere { radius: 1.0 }, Tag::Ice), Transform::default()));
        step(&mut app, 0.1);
        let f = app.world().get::<Flammable>(target).unwrap();
        assert!(!f.on_fire);
        assert!(f.effect.is_none());
    }

    #[test]
    fn destructible_burns_down() {
        let mut app = app();
        let params = FlammableParams { lit: true, destructible: true, burn_limit: 1.0.into(), ..Default::default() };
        let target = crate_at(&mut app, 0.0, params);
        for _ in 0..12 {
            step(&mut app, 0.1);
        }
        assert!(app.world().get_entity(target).is_none());
    }

    #[test]
    fn fire_spreads_to_neighbour_within_one_interval() {
        let mut app = app();
        let spread = SpreadParams { enabled: true, radius: 3.0, interval: 1.0 };
        let a = crate_at(&mut app, 0.0, FlammableParams { lit: true, spread, ..Default::default() });
        let b = crate_at(&mut app, 2.0, FlammableParams { spread, ..Default::default() });
        let far = crate_at(&mut app, 20.0, FlammableParams::default());

        step(&mut app, 0.5);
        assert!(!app.world().get::<Flammable>(b).unwrap().on_fire);
        step(&mut app, 0.5);
        assert!(app.world().get::<Flammable>(a).unwrap().on_fire);
        assert!(app.world().get::<Flammable>(b).unwrap().on_fire);
        assert!(!app.world().get::<Flammable>(far).unwrap().on_fire);
    }

    #[test]
    fn doused_neighbour_is_relit_on_the_next_interval() {
        let mut app = app();
        let spread = SpreadParams { enabled: true, radius: 3.0, interval: 1.0 };
        let a = crate_at(&mut app, 0.0, FlammableParams { lit: true, spread, ..Default::default() });
        let b = crate_at(&mut app, 2.0, FlammableParams::default());
        step(&mut app, 0.5);
        step(&mut app, 0.5);
        assert!(app.world().get::<Flammable>(b).unwrap().on_fire);

        let ice = app
            .world_mut()
            .spawn((TriggerVolume::new(Shape::Sphere { radius: 0.6 }, Tag::Ice), Transform::from_xyz(2.0, 0.0, 0.0)))
            .id();
        step(&mut app, 0.25);
        assert!(!app.world().get::<Flammable>(b).unwrap().on_fire);
        assert!(app.world().get::<Flammable>(a).unwrap().on_fire);

        app.world_mut().despawn(ice);
        step(&mut app, 0.25);
        step(&mut app, 0.25);
        assert!(!app.world().get::<Flammable>(b).unwrap().on_fire);
        step(&mut app, 0.25);
        let relit = app.world().get::<Flammable>(b).unwrap();
        assert!(relit.on_fire);
        let effect = relit.effect;
        assert!(effect.is_some());

        step(&mut app, 1.0);
        let still = app.world().get::<Flammable>(b).unwrap();
        assert!(still.on_fire);
        assert_eq!(still.effect, effect);
        let mut effects = app.world_mut().query::<&FireEffect>();
        assert_eq!(effects.iter(app.world()).count(), 2);
    }

    #[test]
    fn ice_melts_near_fire_and_syncs_scale() {
        let mut app = app();
        let params = MeltableParams { melt_speed: 0.5, residual_melt_time: 0.5, ..Default::default() };
        let ice = app
            .world_mut()
            .spawn((Meltable::new(&params, Vec3::ONE), Sensor::new(0.5), Transform::default()))
            .id();
        app.world_mut().spawn((TriggerVolume::new(Shape::Sphere { radius: 1.0 }, Tag::Fire), Transform::from_xyz(5.0, 0.0, 0.0)));
        step(&mut app, 0.1);
        assert_eq!(app.world().get::<Transform>(ice).unwrap().scale, Vec3::ONE);

        app.world_mut().entity_mut(ice).insert(Transform::from_xyz(5.0, 0.0, 0.0));
        step(&mut app, 0.2);
        let scale = app.world().get::<Transform>(ice).unwrap().scale;
        assert!(scale.x < 1.0 && scale.x > 0.0);
        assert!(app.world().get::<Meltable>(ice).unwrap().melting);
    }
}
