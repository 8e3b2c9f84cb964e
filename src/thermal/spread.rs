//! Fire propagation between nearby flammable entities.
//!
//! Every lit entity with spreading enabled re-queries its neighbourhood each
//! time its interval elapses, for as long as it stays lit. Neighbours that are
//! already burning are skipped, so a wave never re-ignites a lit entity;
//! extinguished entities become eligible again.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::physics::SpatialQuery;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadParams {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "SpreadParams::default_radius")]
    pub radius: f32,
    #[serde(default = "SpreadParams::default_interval")]
    pub interval: f32,
}

impl SpreadParams {
    fn default_radius() -> f32 { 3.0 }
    fn default_interval() -> f32 { 1.0 }
}

impl Default for SpreadParams {
    fn default() -> Self {
        Self { enabled: false, radius: Self::default_radius(), interval: Self::default_interval() }
    }
}

/// Spread timer state carried by each flammable entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireSpread {
    pub enabled: bool,
    pub radius: f32,
    pub interval: f32,
    /// Seconds until the next neighbourhood query.
    pub timer: f32,
}

impl FireSpread {
    #[must_use]
    pub fn new(params: &SpreadParams) -> Self {
        FireSpread { enabled: params.enabled, radius: params.radius, interval: params.interval, timer: params.interval }
    }

    /// Count down while lit. Returns `true` when a spread query is due; the
    /// timer is re-armed with the full interval.
    pub fn tick(&mut self, on_fire: bool, dt: f32) -> bool {
        if !self.enabled || !on_fire {
            return false;
        }
        self.timer -= dt;
        if self.timer <= 0.0 {
            self.timer = self.interval;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.timer = self.interval;
    }
}

/// A flammable entity as seen by the propagation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub entity: Entity,
    pub on_fire: bool,
}

/// A lit entity whose spread interval elapsed this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spreader {
    pub entity: Entity,
    pub position: Vec3,
    pub radius: f32,
}

/// Run one propagation pass. Each spreader ignites every unlit candidate
/// whose collider touches its sphere; candidates lit by an earlier spreader in
/// the same pass count as burning for later ones. Returns newly ignited
/// entities in order.
pub fn propagate(spreaders: &[Spreader], candidates: &mut [Candidate], query: &impl SpatialQuery) -> Vec<Entity> {
    let index: HashMap<Entity, usize> = candidates.iter().enumerate().map(|(i, c)| (c.entity, i)).collect();
    let mut ignited = Vec::new();
    for s in spreaders {
        for hit in query.overlap_sphere(s.position, s.radius) {
            let Some(entity) = hit.entity.filter(|e| *e != s.entity) else { continue };
            let Some(&i) = index.get(&entity) else { continue };
            let c = &mut candidates[i];
            if !c.on_fire {
                c.on_fire = true;
                ignited.push(entity);
            }
        }
    }
    ignited
}
