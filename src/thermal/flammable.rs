//! Flammable entities: ignition, burn duration and extinguishing.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::spread::{FireSpread, SpreadParams};

/// How long a lit entity may burn. Deserializes from a plain number where any
/// negative value (the editor convention is `-1`) means "burn forever".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "f32", into = "f32")]
pub enum BurnLimit {
    Unlimited,
    Seconds(f32),
}

impl From<f32> for BurnLimit {
    fn from(value: f32) -> Self {
        if value < 0.0 { BurnLimit::Unlimited } else { BurnLimit::Seconds(value) }
    }
}

impl From<BurnLimit> for f32 {
    fn from(limit: BurnLimit) -> Self {
        match limit {
            BurnLimit::Unlimited => -1.0,
            BurnLimit::Seconds(s) => s,
        }
    }
}

/// Designer parameters for a flammable entity (level layout files).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlammableParams {
    #[serde(default)]
    pub lit: bool,
    #[serde(default)]
    pub destructible: bool,
    #[serde(default = "FlammableParams::default_burn_limit")]
    pub burn_limit: BurnLimit,
    #[serde(default = "FlammableParams::default_emits_particles")]
    pub emits_particles: bool,
    #[serde(default)]
    pub spread: SpreadParams,
}

impl FlammableParams {
    fn default_burn_limit() -> BurnLimit { BurnLimit::Unlimited }
    fn default_emits_particles() -> bool { true }
}

impl Default for FlammableParams {
    fn default() -> Self {
        Self {
            lit: false,
            destructible: false,
            burn_limit: Self::default_burn_limit(),
            emits_particles: Self::default_emits_particles(),
            spread: SpreadParams::default(),
        }
    }
}

/// What a burn tick did to the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurnOutcome {
    Unlit,
    Burning,
    /// Burn limit reached on a non-destructible entity.
    Extinguished,
    /// Burn limit reached on a destructible entity; despawn it.
    Destroyed,
}

#[derive(Component, Debug, Clone)]
pub struct Flammable {
    pub on_fire: bool,
    pub destructible: bool,
    pub burn_limit: BurnLimit,
    /// Seconds since the current ignition.
    pub burn_elapsed: f32,
    pub emits_particles: bool,
    pub spread: FireSpread,
    /// Fire effect child, present while lit.
    pub effect: Option<Entity>,
    burnt_out: bool,
}

impl Flammable {
    #[must_use]
    pub fn new(params: &FlammableParams) -> Self {
        Flammable {
            on_fire: params.lit,
            destructible: params.destructible,
            burn_limit: params.burn_limit,
            burn_elapsed: 0.0,
            emits_particles: params.emits_particles,
            spread: FireSpread::new(&params.spread),
            effect: None,
            burnt_out: false,
        }
    }

    /// Light the entity. Returns `false` (and changes nothing) when it is
    /// already burning or has burnt out.
    pub fn ignite(&mut self) -> bool {
        if self.on_fire || self.burnt_out {
            return false;
        }
        self.on_fire = true;
        self.burn_elapsed = 0.0;
        true
    }

    /// Put the fire out. Returns `true` if the entity was burning.
    pub fn extinguish(&mut self) -> bool {
        let was_lit = self.on_fire;
        self.on_fire = false;
        self.burn_elapsed = 0.0;
        self.spread.reset();
        was_lit
    }

    #[must_use]
    pub fn is_burnt_out(&self) -> bool {
        self.burnt_out
    }

    /// Advance the burn clock.
    pub fn tick_burn(&mut self, dt: f32) -> BurnOutcome {
        if !self.on_fire || self.burnt_out {
            return BurnOutcome::Unlit;
        }
        let BurnLimit::Seconds(limit) = self.burn_limit else {
            return BurnOutcome::Burning;
        };
        self.burn_elapsed += dt;
        if self.burn_elapsed < limit {
            return BurnOutcome::Burning;
        }
        if self.destructible {
            self.burnt_out = true;
            BurnOutcome::Destroyed
        } else {
            self.extinguish();
            BurnOutcome::Extinguished
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(limit: f32, destructible: bool) -> FlammableParams {
        FlammableParams { burn_limit: limit.into(), destructible, ..Default::default() }
    }

    #[test]
    fn ignite_is_idempotent() {
        let mut f = Flammable::new(&params(5.0, false));
        assert!(f.ignite());
        f.burn_elapsed = 2.0;
        assert!(!f.ignite());
        assert_eq!(f.burn_elapsed, 2.0);
    }

    #[test]
    fn non_destructible_auto_extinguishes_at_limit() {
        let mut f = Flammable::new(&params(5.0, false));
        f.ignite();
        for _ in 0..4 {
            assert_eq!(f.tick_burn(1.0), BurnOutcome::Burning);
        }
        assert_eq!(f.tick_burn(1.0), BurnOutcome::Extinguished);
        assert!(!f.on_fire);
        assert_eq!(f.burn_elapsed, 0.0);
    }

    #[test]
    fn destructible_is_destroyed_once() {
        let mut f = Flammable::new(&params(1.0, true));
        f.ignite();
        assert_eq!(f.tick_burn(1.0), BurnOutcome::Destroyed);
        assert_eq!(f.tick_burn(1.0), BurnOutcome::Unlit);
        assert!(!f.ignite());
    }

    #[test]
    fn minus_one_burns_forever() {
        let mut f = Flammable::new(&params(-1.0, true));
        assert_eq!(f.burn_limit, BurnLimit::Unlimited);
        f.ignite();
        for _ in 0..10_000 {
            assert_eq!(f.tick_burn(1.0), BurnOutcome::Burning);
        }
    }

    #[test]
    fn extinguish_resets_spread_timer() {
        let mut f = Flammable::new(&FlammableParams {
            spread: SpreadParams { enabled: true, radius: 3.0, interval: 2.0 },
            ..Default::default()
        });
        f.ignite();
        f.spread.tick(true, 1.5);
        f.extinguish();
        assert_eq!(f.spread.timer, 2.0);
    }

    #[test]
    fn burn_limit_round_trips_sentinel() {
        let parsed: FlammableParams = ron::from_str("(burn_limit: -1.0, destructible: true)").unwrap();
        assert_eq!(parsed.burn_limit, BurnLimit::Unlimited);
        assert_eq!(ron::to_string(&BurnLimit::Unlimited).unwrap(), "-1.0");
    }
}
