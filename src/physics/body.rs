//! Minimal rigid body: accumulated forces, impulses, linear drag, gravity and
//! a downward ground contact so bodies rest on static colliders.
//!
//! Forces are accumulated during the frame and consumed by
//! [`Body::integrate`] on the next fixed step.

use bevy::prelude::*;

use super::{ColliderSet, LayerMask, SpatialQuery};

/// Gravitational acceleration in world units per second squared.
pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

/// Layers a body can stand on.
pub const SOLID_LAYERS: LayerMask = LayerMask(!LayerMask::PLAYER.0);

#[derive(Component, Debug, Clone)]
pub struct Body {
    /// Current velocity in world units per second.
    pub velocity: Vec3,
    /// Force accumulated since the last integration step.
    pub force: Vec3,
    pub mass: f32,
    /// Linear drag coefficient (fraction of velocity removed per second).
    pub drag: f32,
    pub use_gravity: bool,
    /// Distance from the body origin to its feet; zero disables ground contact.
    pub half_height: f32,
}

impl Default for Body {
    fn default() -> Self {
        Body {
            velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            mass: 1.0,
            drag: 0.0,
            use_gravity: true,
            half_height: 0.0,
        }
    }
}

impl Body {
    #[must_use]
    pub fn with_half_height(half_height: f32) -> Self {
        Body { half_height, ..Default::default() }
    }

    /// Continuous force, applied over the next step.
    pub fn add_force(&mut self, force: Vec3) {
        self.force += force;
    }

    /// Instant change in momentum.
    pub fn add_impulse(&mut self, impulse: Vec3) {
        self.velocity += impulse / self.mass.max(f32::EPSILON);
    }

    /// Advance velocity by one step and return the displacement to apply.
    pub fn integrate(&mut self, dt: f32) -> Vec3 {
        let mut accel = self.force / self.mass.max(f32::EPSILON);
        if self.use_gravity {
            accel += GRAVITY;
        }
        self.velocity += accel * dt;
        self.velocity *= (1.0 - self.drag * dt).max(0.0);
        self.force = Vec3::ZERO;
        self.velocity * dt
    }

    /// Clear all motion (used when teleporting or respawning).
    pub fn reset(&mut self) {
        self.velocity = Vec3::ZERO;
        self.force = Vec3::ZERO;
    }
}

/// Keep a body from sinking below the surface under it.
///
/// Casts from the pre-step position so fast falls cannot tunnel through thin
/// floors. Returns `true` when the body ends the step resting on a surface.
pub fn resolve_ground_contact(previous: Vec3, translation: &mut Vec3, body: &mut Body, query: &impl SpatialQuery) -> bool {
    if body.half_height <= 0.0 {
        return false;
    }
    let fall = (previous.y - translation.y).max(0.0);
    let probe = body.half_height + fall + 1e-3;
    let origin = Vec3::new(translation.x, previous.y, translation.z);
    let Some(hit) = query.raycast(origin, Vec3::NEG_Y, probe, SOLID_LAYERS) else {
        return false;
    };
    let rest_y = hit.point.y + body.half_height;
    if translation.y > rest_y + 1e-3 {
        return false;
    }
    translation.y = rest_y;
    let into_surface = body.velocity.dot(hit.normal);
    if into_surface < 0.0 {
        body.velocity -= hit.normal * into_surface;
    }
    true
}

/// Fixed-step integration of every [`Body`].
#[allow(clippy::needless_pass_by_value)]
pub fn integrate_bodies(time: Res<Time>, colliders: Res<ColliderSet>, mut bodies: Query<(&mut Transform, &mut Body)>) {
    let dt = time.delta_seconds();
    if dt <= 0.0 {
        return;
    }
    for (mut tf, mut body) in &mut bodies {
        let previous = tf.translation;
        let displacement = body.integrate(dt);
        let mut next = previous + displacement;
        resolve_ground_contact(previous, &mut next, &mut body, &*colliders);
        tf.translation = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{Collider, Tag};

    fn floor() -> ColliderSet {
        let mut set = ColliderSet::default();
        set.push(None, Collider::cuboid(Vec3::new(20.0, 0.5, 20.0), Tag::Ground, LayerMask::GROUND), Vec3::ZERO, Quat::IDENTITY);
        set
    }

    #[test]
    fn impulse_scales_with_mass() {
        let mut body = Body { mass: 2.0, ..Default::default() };
        body.add_impulse(Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(body.velocity, Vec3::new(0.0, 5.0, 0.0));
    }

    #[test]
    fn gravity_is_skipped_when_disabled() {
        let mut body = Body { use_gravity: false, ..Default::default() };
        let d = body.integrate(0.5);
        assert_eq!(d, Vec3::ZERO);
    }

    #[test]
    fn drag_slows_horizontal_motion() {
        let mut body = Body { use_gravity: false, drag: 5.0, velocity: Vec3::X * 10.0, ..Default::default() };
        body.integrate(0.1);
        assert!((body.velocity.x - 5.0).abs() < 1e-5);
    }

    #[test]
    fn falling_body_lands_on_floor() {
        let set = floor();
        let mut body = Body::with_half_height(1.0);
        let mut pos = Vec3::new(0.0, 3.0, 0.0);
        for _ in 0..200 {
            let prev = pos;
            pos += body.integrate(0.02);
            resolve_ground_contact(prev, &mut pos, &mut body, &set);
        }
        assert!((pos.y - 1.5).abs() < 1e-3);
        assert!(body.velocity.y.abs() < 1e-3);
    }

    #[test]
    fn fast_fall_does_not_tunnel() {
        let set = floor();
        let mut body = Body::with_half_height(1.0);
        body.velocity.y = -200.0;
        let prev = Vec3::new(0.0, 3.0, 0.0);
        let mut pos = prev + body.integrate(0.02);
        assert!(resolve_ground_contact(prev, &mut pos, &mut body, &set));
        assert!((pos.y - 1.5).abs() < 1e-3);
    }
}
