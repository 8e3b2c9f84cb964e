//! Player spells. Fire breath (held) and ice placement (pressed).

pub mod fire;
pub mod ice;

use bevy::prelude::*;

use crate::player::PlayerSet;
use crate::settings::Settings;

pub use fire::{FireBreath, breath_placement, spawn_fire_breath, update_fire_breath};
pub use ice::{IceCaster, IcePlacement, cast_ice, plan_ice_placement, spawn_ice_block};

#[allow(clippy::needless_pass_by_value)]
fn setup_fire_breath(mut commands: Commands, settings: Res<Settings>) {
    spawn_fire_breath(&mut commands, &settings.spells);
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpellSet;

pub struct SpellsPlugin;

impl Plugin for SpellsPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(Update, SpellSet.after(PlayerSet))
            .add_systems(Startup, setup_fire_breath)
            .add_systems(Update, (update_fire_breath, cast_ice).in_set(SpellSet));
    }
}
