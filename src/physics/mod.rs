//! Spatial queries used by the gameplay systems.
//!
//! Static colliders (oriented boxes and spheres) carry a [`Tag`] and a
//! [`LayerMask`]. Every frame `refresh_collider_set` snapshots them into the
//! [`ColliderSet`] resource, which answers raycasts and sphere overlaps through
//! the [`SpatialQuery`] trait. Gameplay code only talks to the trait so the
//! step functions can be driven by hand-built sets in tests and benchmarks.
//!
//! # Example:
//!
//! ```
//! use bevy::math::{Quat, Vec3};
//! use cinderfrost::physics::{Collider, ColliderSet, LayerMask, SpatialQuery, Tag};
//!
//! let mut set = ColliderSet::default();
//! set.push(None, Collider::cuboid(Vec3::new(50.0, 0.5, 50.0), Tag::Ground, LayerMask::GROUND), Vec3::ZERO, Quat::IDENTITY);
//! let hit = set.raycast(Vec3::new(0.0, 2.0, 0.0), Vec3::NEG_Y, 5.0, LayerMask::GROUND).unwrap();
//! assert!((hit.distance - 1.5).abs() < 1e-5);
//! ```
pub mod body;
pub mod triggers;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub use body::{Body, GRAVITY, integrate_bodies, resolve_ground_contact};
pub use triggers::{ContactKind, Sensor, TriggerEvent, TriggerVolume, detect_triggers};

/// Category attached to colliders and trigger volumes. Gameplay reacts to the
/// tag of the *other* party in a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tag {
    #[default]
    Untagged,
    Player,
    Ground,
    Wall,
    Fire,
    Ice,
    Hazard,
    KillPlane,
    Flammable,
    Teleporter,
}

/// Bit set of collision layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const DEFAULT: LayerMask = LayerMask(1);
    pub const GROUND: LayerMask = LayerMask(1 << 1);
    pub const PLAYER: LayerMask = LayerMask(1 << 2);
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    #[must_use]
    pub const fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub const fn union(self, other: LayerMask) -> LayerMask {
        LayerMask(self.0 | other.0)
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        LayerMask::DEFAULT
    }
}

/// Collision shape in the local frame of its entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Box centred on the entity, rotated with it.
    Cuboid { half_extents: Vec3 },
    /// Sphere centred on the entity.
    Sphere { radius: f32 },
}

impl Shape {
    /// Whether a sphere at `center` with `radius` touches this shape placed at
    /// `translation`/`rotation`.
    #[must_use]
    pub fn overlaps_sphere(&self, translation: Vec3, rotation: Quat, center: Vec3, radius: f32) -> bool {
        match *self {
            Shape::Cuboid { half_extents } => {
                let local = rotation.inverse() * (center - translation);
                let closest = local.clamp(-half_extents, half_extents);
                local.distance_squared(closest) <= radius * radius
            }
            Shape::Sphere { radius: r } => translation.distance_squared(center) <= (r + radius) * (r + radius),
        }
    }

    /// Distance along `dir` (unit length) to the first surface hit and the
    /// world-space surface normal. Rays starting inside the shape do not hit it.
    #[must_use]
    pub fn ray_intersection(&self, translation: Vec3, rotation: Quat, origin: Vec3, dir: Vec3) -> Option<(f32, Vec3)> {
        match *self {
            Shape::Cuboid { half_extents } => ray_obb(translation, rotation, half_extents, origin, dir),
            Shape::Sphere { radius } => ray_sphere(translation, radius, origin, dir),
        }
    }
}

fn ray_obb(translation: Vec3, rotation: Quat, half: Vec3, origin: Vec3, dir: Vec3) -> Option<(f32, Vec3)> {
    let inv = rotation.inverse();
    let o = inv * (origin - translation);
    let d = inv * dir;

    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut enter_normal = Vec3::ZERO;

    for axis in 0..3 {
        let (oi, di, hi) = (o[axis], d[axis], half[axis]);
        if di.abs() < 1e-8 {
            if oi.abs() > hi {
                return None;
            }
            continue;
        }
        let mut t1 = (-hi - oi) / di;
        let mut t2 = (hi - oi) / di;
        let mut sign = -1.0;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
            sign = 1.0;
        }
        if t1 > t_enter {
            t_enter = t1;
            enter_normal = Vec3::ZERO;
            enter_normal[axis] = sign;
        }
        t_exit = t_exit.min(t2);
        if t_enter > t_exit {
            return None;
        }
    }

    if t_enter < 0.0 {
        return None;
    }
    Some((t_enter, (rotation * enter_normal).normalize_or_zero()))
}

fn ray_sphere(center: Vec3, radius: f32, origin: Vec3, dir: Vec3) -> Option<(f32, Vec3)> {
    let oc = origin - center;
    let c = oc.length_squared() - radius * radius;
    if c <= 0.0 {
        return None;
    }
    let b = oc.dot(dir);
    let disc = b * b - c;
    if disc < 0.0 || b > 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    let normal = (origin + dir * t - center).normalize_or_zero();
    Some((t, normal))
}

/// Static (non-trigger) collider component.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Collider {
    pub shape: Shape,
    pub tag: Tag,
    pub layer: LayerMask,
}

impl Collider {
    #[must_use]
    pub fn cuboid(half_extents: Vec3, tag: Tag, layer: LayerMask) -> Self {
        Collider { shape: Shape::Cuboid { half_extents }, tag, layer }
    }

    #[must_use]
    pub fn sphere(radius: f32, tag: Tag, layer: LayerMask) -> Self {
        Collider { shape: Shape::Sphere { radius }, tag, layer }
    }
}

/// Result of a successful raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    pub entity: Option<Entity>,
    pub tag: Tag,
}

/// Result entry of a sphere overlap query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    pub entity: Option<Entity>,
    pub tag: Tag,
}

/// Read-only spatial queries provided to gameplay code.
pub trait SpatialQuery {
    /// Closest hit along `dir` within `max_distance` against colliders whose
    /// layer intersects `mask`.
    fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32, mask: LayerMask) -> Option<RayHit>;

    /// Every collider touching the sphere, in insertion order.
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Overlap>;
}

#[derive(Debug, Clone, Copy)]
struct PlacedCollider {
    entity: Option<Entity>,
    collider: Collider,
    translation: Vec3,
    rotation: Quat,
}

/// Snapshot of every static collider for this frame.
#[derive(Resource, Debug, Default, Clone)]
pub struct ColliderSet {
    placed: Vec<PlacedCollider>,
}

impl ColliderSet {
    pub fn push(&mut self, entity: Option<Entity>, collider: Collider, translation: Vec3, rotation: Quat) {
        self.placed.push(PlacedCollider { entity, collider, translation, rotation });
    }

    pub fn clear(&mut self) {
        self.placed.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.placed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }
}

impl SpatialQuery for ColliderSet {
    fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        let dir = dir.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        let mut best: Option<RayHit> = None;
        for p in &self.placed {
            if !p.collider.layer.intersects(mask) {
                continue;
            }
            let Some((t, normal)) = p.collider.shape.ray_intersection(p.translation, p.rotation, origin, dir) else {
                continue;
            };
            if t > max_distance || best.is_some_and(|b| b.distance <= t) {
                continue;
            }
            best = Some(RayHit {
                point: origin + dir * t,
                normal,
                distance: t,
                entity: p.entity,
                tag: p.collider.tag,
            });
        }
        best
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Overlap> {
        self.placed
            .iter()
            .filter(|p| p.collider.shape.overlaps_sphere(p.translation, p.rotation, center, radius))
            .map(|p| Overlap { entity: p.entity, tag: p.collider.tag })
            .collect()
    }
}

/// Rebuild the [`ColliderSet`] from every entity carrying a [`Collider`].
#[allow(clippy::needless_pass_by_value)]
pub fn refresh_collider_set(mut set: ResMut<ColliderSet>, colliders: Query<(Entity, &Collider, &Transform)>) {
    set.clear();
    for (entity, collider, tf) in &colliders {
        let mut scaled = *collider;
        if let Shape::Cuboid { half_extents } = collider.shape {
            scaled.shape = Shape::Cuboid { half_extents: half_extents * tf.scale };
        }
        set.push(Some(entity), scaled, tf.translation, tf.rotation);
    }
}

/// Registers the collider snapshot, trigger detection and body integration.
pub struct PhysicsPlugin;

/// Ordering for the per-frame spatial bookkeeping.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum PhysicsSet {
    /// Collider snapshot refresh.
    Snapshot,
    /// Trigger enter/exit detection.
    Triggers,
    /// Fixed-step body integration.
    Integrate,
}

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ColliderSet>()
            .add_event::<TriggerEvent>()
            .configure_sets(Update, (PhysicsSet::Snapshot, PhysicsSet::Triggers).chain())
            .add_systems(Update, refresh_collider_set.in_set(PhysicsSet::Snapshot))
            .add_systems(Update, detect_triggers.in_set(PhysicsSet::Triggers))
            .add_systems(FixedUpdate, (refresh_collider_set, integrate_bodies).chain().in_set(PhysicsSet::Integrate));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_set() -> ColliderSet {
        let mut set = ColliderSet::default();
        set.push(None, Collider::cuboid(Vec3::new(10.0, 0.5, 10.0), Tag::Ground, LayerMask::GROUND), Vec3::ZERO, Quat::IDENTITY);
        set
    }

    #[test]
    fn downward_ray_hits_floor_top() {
        let hit = floor_set().raycast(Vec3::new(1.0, 3.0, 1.0), Vec3::NEG_Y, 10.0, LayerMask::GROUND).unwrap();
        assert!((hit.point.y - 0.5).abs() < 1e-5);
        assert!((hit.normal - Vec3::Y).length() < 1e-5);
        assert_eq!(hit.tag, Tag::Ground);
    }

    #[test]
    fn ray_respects_max_distance_and_mask() {
        let set = floor_set();
        assert!(set.raycast(Vec3::new(0.0, 3.0, 0.0), Vec3::NEG_Y, 2.0, LayerMask::GROUND).is_none());
        assert!(set.raycast(Vec3::new(0.0, 3.0, 0.0), Vec3::NEG_Y, 10.0, LayerMask::PLAYER).is_none());
    }

    #[test]
    fn rotated_box_reports_tilted_normal() {
        let mut set = ColliderSet::default();
        let tilt = Quat::from_rotation_z(20f32.to_radians());
        set.push(None, Collider::cuboid(Vec3::new(10.0, 0.5, 10.0), Tag::Ground, LayerMask::GROUND), Vec3::ZERO, tilt);
        let hit = set.raycast(Vec3::new(0.0, 3.0, 0.0), Vec3::NEG_Y, 10.0, LayerMask::ALL).unwrap();
        let angle = Vec3::Y.angle_between(hit.normal).to_degrees();
        assert!((angle - 20.0).abs() < 1e-3);
    }

    #[test]
    fn ray_starting_inside_sphere_misses_it() {
        let mut set = ColliderSet::default();
        set.push(None, Collider::sphere(1.0, Tag::Player, LayerMask::PLAYER), Vec3::ZERO, Quat::IDENTITY);
        assert!(set.raycast(Vec3::ZERO, Vec3::X, 10.0, LayerMask::ALL).is_none());
        let hit = set.raycast(Vec3::new(-5.0, 0.0, 0.0), Vec3::X, 10.0, LayerMask::ALL).unwrap();
        assert!((hit.distance - 4.0).abs() < 1e-5);
    }

    #[test]
    fn closest_hit_wins() {
        let mut set = floor_set();
        set.push(None, Collider::cuboid(Vec3::splat(0.5), Tag::Wall, LayerMask::DEFAULT), Vec3::new(0.0, 2.0, 0.0), Quat::IDENTITY);
        let hit = set.raycast(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, 10.0, LayerMask::ALL).unwrap();
        assert_eq!(hit.tag, Tag::Wall);
    }

    #[test]
    fn sphere_overlap_finds_touching_colliders() {
        let mut set = floor_set();
        set.push(None, Collider::sphere(0.5, Tag::Hazard, LayerMask::DEFAULT), Vec3::new(5.0, 1.0, 0.0), Quat::IDENTITY);
        let near_floor = set.overlap_sphere(Vec3::new(0.0, 1.2, 0.0), 1.0);
        assert_eq!(near_floor.len(), 1);
        assert_eq!(near_floor[0].tag, Tag::Ground);
        let both = set.overlap_sphere(Vec3::new(4.0, 1.0, 0.0), 1.0);
        assert_eq!(both.len(), 2);
    }
}
