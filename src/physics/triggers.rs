//! Trigger volumes and enter/exit contact events.
//!
//! A [`TriggerVolume`] is a tagged shape that does not block movement. A
//! [`Sensor`] is an entity that wants to hear about volumes it touches. Each
//! frame `detect_triggers` compares the volumes a sensor overlaps with the set
//! it overlapped last frame and emits one [`TriggerEvent`] per change, sorted
//! by entity so replays are deterministic.

use std::collections::HashMap;

use bevy::prelude::*;

use super::{Shape, Tag};

#[derive(Component, Debug, Clone, Copy)]
pub struct TriggerVolume {
    pub shape: Shape,
    pub tag: Tag,
    /// Inactive volumes are ignored (and count as exited).
    pub active: bool,
}

impl TriggerVolume {
    #[must_use]
    pub fn new(shape: Shape, tag: Tag) -> Self {
        TriggerVolume { shape, tag, active: true }
    }
}

/// Receives trigger events for volumes touching a sphere around the entity.
#[derive(Component, Debug, Clone, Default)]
pub struct Sensor {
    pub radius: f32,
    contacts: HashMap<Entity, Tag>,
}

impl Sensor {
    #[must_use]
    pub fn new(radius: f32) -> Self {
        Sensor { radius, contacts: HashMap::new() }
    }

    #[must_use]
    pub fn is_touching(&self, volume: Entity) -> bool {
        self.contacts.contains_key(&volume)
    }

    /// Forget all contacts without emitting exits (used after teleports).
    pub fn clear(&mut self) {
        self.contacts.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Enter,
    Exit,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEvent {
    pub sensor: Entity,
    pub other: Entity,
    /// Tag of `other`.
    pub tag: Tag,
    pub kind: ContactKind,
}

/// Replace `previous` with `current` and return the resulting transitions,
/// exits first, each group ordered by entity.
pub fn diff_contacts(previous: &mut HashMap<Entity, Tag>, current: HashMap<Entity, Tag>) -> Vec<(Entity, Tag, ContactKind)> {
    let mut exits: Vec<_> = previous
        .iter()
        .filter(|(e, _)| !current.contains_key(e))
        .map(|(e, t)| (*e, *t, ContactKind::Exit))
        .collect();
    let mut enters: Vec<_> = current
        .iter()
        .filter(|(e, _)| !previous.contains_key(e))
        .map(|(e, t)| (*e, *t, ContactKind::Enter))
        .collect();
    exits.sort_by_key(|(e, _, _)| *e);
    enters.sort_by_key(|(e, _, _)| *e);
    *previous = current;
    exits.extend(enters);
    exits
}

/// Overlap test between a sensor sphere and a placed volume shape.
#[must_use]
pub fn sensor_touches(shape: &Shape, volume_tf: &Transform, center: Vec3, radius: f32) -> bool {
    let scaled = match *shape {
        Shape::Cuboid { half_extents } => Shape::Cuboid { half_extents: half_extents * volume_tf.scale },
        other => other,
    };
    scaled.overlaps_sphere(volume_tf.translation, volume_tf.rotation, center, radius)
}

#[allow(clippy::needless_pass_by_value)]
pub fn detect_triggers(
    volumes: Query<(Entity, &TriggerVolume, &Transform)>,
    mut sensors: Query<(Entity, &mut Sensor, &Transform)>,
    mut events: EventWriter<TriggerEvent>,
) {
    let mut ordered: Vec<_> = sensors.iter_mut().collect();
    ordered.sort_by_key(|(e, _, _)| *e);

    for (sensor_entity, mut sensor, sensor_tf) in ordered {
        let current: HashMap<Entity, Tag> = volumes
            .iter()
            .filter(|(e, v, _)| *e != sensor_entity && v.active)
            .filter(|(_, v, tf)| sensor_touches(&v.shape, tf, sensor_tf.translation, sensor.radius))
            .map(|(e, v, _)| (e, v.tag))
            .collect();

        let radius = sensor.radius;
        for (other, tag, kind) in diff_contacts(&mut sensor.contacts, current) {
            debug!("trigger {:?}: sensor {:?} (r={}) {:?} {:?}", kind, sensor_entity, radius, tag, other);
            events.send(TriggerEvent { sensor: sensor_entity, other, tag, kind });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_reports_enters_and_exits() {
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        let mut prev = HashMap::from([(a, Tag::Hazard)]);
        let out = diff_contacts(&mut prev, HashMap::from([(b, Tag::Fire)]));
        assert_eq!(out, vec![(a, Tag::Hazard, ContactKind::Exit), (b, Tag::Fire, ContactKind::Enter)]);
        assert!(prev.contains_key(&b) && !prev.contains_key(&a));
    }

    #[test]
    fn unchanged_contacts_emit_nothing() {
        let a = Entity::from_raw(7);
        let mut prev = HashMap::from([(a, Tag::Ice)]);
        assert!(diff_contacts(&mut prev, HashMap::from([(a, Tag::Ice)])).is_empty());
    }

    #[test]
    fn detection_emits_enter_then_exit() {
        let mut app = App::new();
        app.add_event::<TriggerEvent>().add_systems(Update, detect_triggers);

        let sensor = app.world_mut().spawn((Sensor::new(0.5), Transform::from_xyz(0.0, 0.0, 0.0))).id();
        let hazard = app
            .world_mut()
            .spawn((TriggerVolume::new(Shape::Cuboid { half_extents: Vec3::ONE }, Tag::Hazard), Transform::from_xyz(1.0, 0.0, 0.0)))
            .id();

        app.update();
        let entered: Vec<TriggerEvent> = app.world_mut().resource_mut::<Events<TriggerEvent>>().drain().collect();
        assert_eq!(entered, vec![TriggerEvent { sensor, other: hazard, tag: Tag::Hazard, kind: ContactKind::Enter }]);

        app.world_mut().entity_mut(sensor).insert(Transform::from_xyz(10.0, 0.0, 0.0));
        app.update();
        let exited: Vec<TriggerEvent> = app.world_mut().resource_mut::<Events<TriggerEvent>>().drain().collect();
        assert_eq!(exited, vec![TriggerEvent { sensor, other: hazard, tag: Tag::Hazard, kind: ContactKind::Exit }]);
    }

    #[test]
    fn toggling_a_volume_refires_enter() {
        let mut app = App::new();
        app.add_event::<TriggerEvent>().add_systems(Update, detect_triggers);
        app.world_mut().spawn((Sensor::new(0.5), Transform::default()));
        let flame = app
            .world_mut()
            .spawn((TriggerVolume::new(Shape::Sphere { radius: 1.0 }, Tag::Fire), Transform::default()))
            .id();

        let mut kinds = Vec::new();
        for active in [true, false, true] {
            app.world_mut().get_mut::<TriggerVolume>(flame).unwrap().active = active;
            app.update();
            kinds.extend(app.world_mut().resource_mut::<Events<TriggerEvent>>().drain().map(|e| e.kind));
        }
        assert_eq!(kinds, vec![ContactKind::Enter, ContactKind::Exit, ContactKind::Enter]);
    }
}
