//! Meltable entities (ice). Melting starts from fire contact or after a
//! natural delay, shrinks the entity uniformly and destroys it at the floor
//! scale.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Designer parameters for a meltable entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeltableParams {
    /// Scale lost per second on every axis.
    #[serde(default = "MeltableParams::default_melt_speed")]
    pub melt_speed: f32,
    #[serde(default)]
    pub min_scale: Vec3,
    /// Seconds melting continues after the last fire contact.
    #[serde(default = "MeltableParams::default_residual_melt_time")]
    pub residual_melt_time: f32,
    #[serde(default)]
    pub melts_naturally: bool,
    #[serde(default)]
    pub melting_delay: f32,
}

impl MeltableParams {
    fn default_melt_speed() -> f32 { 0.2 }
    fn default_residual_melt_time() -> f32 { 1.0 }
}

impl Default for MeltableParams {
    fn default() -> Self {
        Self {
            melt_speed: Self::default_melt_speed(),
            min_scale: Vec3::ZERO,
            residual_melt_time: Self::default_residual_melt_time(),
            melts_naturally: false,
            melting_delay: 0.0,
        }
    }
}

/// One-shot countdown before an entity starts melting by itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NaturalMelt {
    pub enabled: bool,
    pub remaining: f32,
    /// Set once the delay expires; never cleared.
    pub triggered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeltOutcome {
    Idle,
    Melting,
    /// Melting stopped this tick; scale is kept.
    Halted,
    /// An axis reached its floor this tick; despawn the entity.
    Destroyed,
}

#[derive(Component, Debug, Clone)]
pub struct Meltable {
    pub melting: bool,
    pub melt_speed: f32,
    pub min_scale: Vec3,
    pub scale: Vec3,
    pub residual_melt_time: f32,
    /// Seconds since the most recent fire contact, while it still matters.
    pub since_fire_contact: Option<f32>,
    pub natural: NaturalMelt,
    destroyed: bool,
}

impl Meltable {
    #[must_use]
    pub fn new(params: &MeltableParams, scale: Vec3) -> Self {
        Meltable {
            melting: false,
            melt_speed: params.melt_speed,
            min_scale: params.min_scale,
            scale: scale.max(params.min_scale),
            residual_melt_time: params.residual_melt_time,
            since_fire_contact: None,
            natural: NaturalMelt {
                enabled: params.melts_naturally,
                remaining: params.melting_delay,
                triggered: false,
            },
            destroyed: false,
        }
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Fire touched the entity: melt now and restart the residual window.
    pub fn fire_contact(&mut self) {
        if self.destroyed {
            return;
        }
        self.melting = true;
        self.since_fire_contact = Some(0.0);
    }

    /// Seconds of this tick during which natural melting is active.
    fn natural_window(&mut self, dt: f32) -> f32 {
        if !self.natural.enabled {
            return 0.0;
        }
        if self.natural.triggered {
            return dt;
        }
        let before = self.natural.remaining;
        self.natural.remaining -= dt;
        if self.natural.remaining > 0.0 {
            return 0.0;
        }
        self.natural.triggered = true;
        info!("meltable started to melt naturally");
        (dt - before.max(0.0)).max(0.0)
    }

    /// Seconds of this tick covered by the residual window of the last fire
    /// contact; the window closes exactly `residual_melt_time` after contact.
    fn residual_window(&mut self, dt: f32) -> f32 {
        let Some(since) = self.since_fire_contact else {
            return 0.0;
        };
        let window = (self.residual_melt_time - since).clamp(0.0, dt);
        let next = since + dt;
        self.since_fire_contact = (next < self.residual_melt_time).then_some(next);
        window
    }

    pub fn tick(&mut self, dt: f32) -> MeltOutcome {
        if self.destroyed {
            return MeltOutcome::Idle;
        }
        let was_melting = self.melting;
        let window = self.natural_window(dt).max(self.residual_window(dt));
        self.melting = self.natural.triggered || self.since_fire_contact.is_some();

        if window <= 0.0 {
            return if was_melting && !self.melting { MeltOutcome::Halted } else { MeltOutcome::Idle };
        }

        self.scale = (self.scale - Vec3::splat(self.melt_speed * window)).max(self.min_scale);
        if self.scale.cmple(self.min_scale).any() {
            self.destroyed = true;
            self.melting = false;
            return MeltOutcome::Destroyed;
        }
        if self.melting { MeltOutcome::Melting } else { MeltOutcome::Halted }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ice(residual: f32) -> Meltable {
        Meltable::new(
            &MeltableParams { melt_speed: 0.1, residual_melt_time: residual, ..Default::default() },
            Vec3::ONE,
        )
    }

    #[test]
    fn untouched_ice_stays_put() {
        let mut m = ice(2.0);
        for _ in 0..10 {
            assert_eq!(m.tick(1.0), MeltOutcome::Idle);
        }
        assert_eq!(m.scale, Vec3::ONE);
    }

    #[test]
    fn residual_melt_stops_exactly_after_window() {
        let mut m = ice(2.0);
        m.fire_contact();
        assert!(m.melting);
        let mut melted_for = 0.0;
        let dt = 0.3;
        for _ in 0..20 {
            let before = m.scale.x;
            m.tick(dt);
            melted_for += (before - m.scale.x) / m.melt_speed;
        }
        assert!((melted_for - 2.0).abs() < 1e-4, "melted for {melted_for}");
        assert!(!m.melting);
        assert!(m.scale.x > 0.0);
    }

    #[test]
    fn repeated_contact_keeps_melting() {
        let mut m = ice(1.0);
        m.fire_contact();
        for _ in 0..5 {
            assert_eq!(m.tick(0.5), MeltOutcome::Melting);
            m.fire_contact();
        }
        assert!((m.scale.x - (1.0 - 0.1 * 2.5)).abs() < 1e-5);
    }

    #[test]
    fn halt_is_reported_once_and_keeps_scale() {
        let mut m = ice(1.0);
        m.fire_contact();
        assert_eq!(m.tick(1.0), MeltOutcome::Halted);
        let kept = m.scale;
        assert_eq!(m.tick(1.0), MeltOutcome::Idle);
        assert_eq!(m.scale, kept);
    }

    #[test]
    fn natural_melt_starts_after_delay_and_never_stops() {
        let mut m = Meltable::new(
            &MeltableParams { melt_speed: 0.01, melts_naturally: true, melting_delay: 2.0, ..Default::default() },
            Vec3::ONE,
        );
        assert_eq!(m.tick(1.0), MeltOutcome::Idle);
        assert_eq!(m.tick(1.5), MeltOutcome::Melting);
        assert!((m.scale.x - 0.995).abs() < 1e-5);
        for _ in 0..10 {
            assert_eq!(m.tick(1.0), MeltOutcome::Melting);
        }
    }

    #[test]
    fn destroyed_exactly_once_at_floor() {
        let mut m = Meltable::new(
            &MeltableParams { melt_speed: 1.0, min_scale: Vec3::new(0.0, 0.5, 0.0), melts_naturally: true, ..Default::default() },
            Vec3::ONE,
        );
        assert_eq!(m.tick(0.25), MeltOutcome::Melting);
        assert_eq!(m.tick(0.25), MeltOutcome::Destroyed);
        assert!(m.scale.cmpge(m.min_scale).all());
        assert_eq!(m.tick(0.25), MeltOutcome::Idle);
        assert!(m.is_destroyed());
    }
}
