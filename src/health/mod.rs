//! Player health: hazard damage, delayed regeneration and the respawn
//! sequence.
//!
//! The respawn sequence is an explicit task advanced by [`Health::tick`]:
//! `Idle -> Waiting { remaining } -> Finalizing -> Idle`. Only an idle task
//! can start a new sequence, so overlapping causes (health running out while
//! falling into a kill plane) never run two sequences at once. The systems
//! map the signals to side effects: disable input, reload the level, enable
//! input.

use bevy::prelude::*;

use crate::input::InputEnabled;
use crate::physics::{ContactKind, Tag, TriggerEvent};
use crate::player::Player;
use crate::scene::SceneRequest;
use crate::settings::HealthSettings;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RespawnTask {
    #[default]
    Idle,
    Waiting { remaining: f32 },
    /// The level reload has been requested; input comes back next tick.
    Finalizing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespawnSignal {
    Started,
    ReloadLevel,
    Completed,
}

#[derive(Component, Debug, Clone)]
pub struct Health {
    pub current: f32,
    /// `-1` disables damage entirely.
    pub max: f32,
    pub damage_per_second: f32,
    pub regeneration_delay: f32,
    pub regeneration_rate: f32,
    pub respawn_delay: f32,
    pub taking_damage: bool,
    /// Seconds since damage last applied.
    pub regen_timer: f32,
    pub respawn: RespawnTask,
}

impl Health {
    #[must_use]
    pub fn new(params: &HealthSettings) -> Self {
        Health {
            current: params.max_health,
            max: params.max_health,
            damage_per_second: params.damage_per_second,
            regeneration_delay: params.regeneration_delay,
            regeneration_rate: params.regeneration_rate,
            respawn_delay: params.respawn_delay,
            taking_damage: false,
            regen_timer: 0.0,
            respawn: RespawnTask::Idle,
        }
    }

    #[must_use]
    pub fn is_invulnerable(&self) -> bool {
        self.max < 0.0
    }

    #[must_use]
    pub fn is_respawning(&self) -> bool {
        self.respawn != RespawnTask::Idle
    }

    /// Start a respawn regardless of health. Returns `false` when one is
    /// already running.
    pub fn force_respawn(&mut self) -> bool {
        if self.is_respawning() {
            return false;
        }
        self.respawn = RespawnTask::Waiting { remaining: self.respawn_delay };
        true
    }

    pub fn cancel_respawn(&mut self) {
        self.respawn = RespawnTask::Idle;
    }

    /// Back to full health after a level (re)load. Leaves the respawn task
    /// alone so a running sequence can finish.
    pub fn refill(&mut self) {
        self.current = self.max;
        self.taking_damage = false;
        self.regen_timer = 0.0;
    }

    fn advance_respawn(&mut self, dt: f32) -> Option<RespawnSignal> {
        match self.respawn {
            RespawnTask::Idle => {
                if !self.is_invulnerable() && self.current <= 0.0 && self.force_respawn() {
                    Some(RespawnSignal::Started)
                } else {
                    None
                }
            }
            RespawnTask::Waiting { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.respawn = RespawnTask::Finalizing;
                    Some(RespawnSignal::ReloadLevel)
                } else {
                    self.respawn = RespawnTask::Waiting { remaining };
                    None
                }
            }
            RespawnTask::Finalizing => {
                self.respawn = RespawnTask::Idle;
                Some(RespawnSignal::Completed)
            }
        }
    }

    fn apply_damage_and_regen(&mut self, dt: f32) {
        if self.taking_damage {
            if !self.is_invulnerable() && self.current > 0.0 {
                self.current = (self.current - self.damage_per_second * dt).max(0.0);
            }
            self.regen_timer = 0.0;
            return;
        }

        let before = self.regen_timer;
        self.regen_timer += dt;
        let regen_time = self.regen_timer - before.max(self.regeneration_delay);
        if regen_time > 0.0 && !self.is_invulnerable() && self.current < self.max {
            self.current = (self.current + self.regeneration_rate * regen_time).min(self.max);
        }
    }

    /// Advance one frame.
    pub fn tick(&mut self, dt: f32) -> Option<RespawnSignal> {
        let signal = self.advance_respawn(dt);
        self.apply_damage_and_regen(dt);
        signal
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn tick_health(
    time: Res<Time>,
    mut players: Query<&mut Health, With<Player>>,
    mut input: ResMut<InputEnabled>,
    mut scenes: EventWriter<SceneRequest>,
) {
    let dt = time.delta_seconds();
    for mut health in &mut players {
        match health.tick(dt) {
            Some(RespawnSignal::Started) => {
                info!("player health depleted, respawning");
                input.0 = false;
            }
            Some(RespawnSignal::ReloadLevel) => {
                scenes.send(SceneRequest::RestartCurrent);
            }
            Some(RespawnSignal::Completed) => {
                input.0 = true;
                info!("respawn complete");
            }
            None => {}
        }
    }
}

/// Hazards toggle damage; kill planes force a respawn.
#[allow(clippy::needless_pass_by_value)]
pub fn health_contacts(
    mut events: EventReader<TriggerEvent>,
    mut players: Query<&mut Health, With<Player>>,
    mut input: ResMut<InputEnabled>,
) {
    for ev in events.read() {
        let Ok(mut health) = players.get_mut(ev.sensor) else { continue };
        match (ev.tag, ev.kind) {
            (Tag::Hazard, ContactKind::Enter) => {
                info!("player touched a hazard");
                health.taking_damage = true;
            }
            (Tag::Hazard, ContactKind::Exit) => {
                info!("player left the hazard");
                health.taking_damage = false;
            }
            (Tag::KillPlane, ContactKind::Enter) => {
                if health.force_respawn() {
                    info!("player hit the kill plane, respawning");
                    input.0 = false;
                }
            }
            _ => {}
        }
    }
}

/// A player despawned mid-respawn must not leave input disabled.
#[allow(clippy::needless_pass_by_value)]
pub fn release_input_on_player_removed(mut removed: RemovedComponents<Health>, mut input: ResMut<InputEnabled>) {
    if removed.read().count() > 0 && !input.0 {
        warn!("player removed during respawn, re-enabling input");
        input.0 = true;
    }
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct HealthSet;

pub struct HealthPlugin;

impl Plugin for HealthPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(Update, HealthSet.after(crate::physics::PhysicsSet::Triggers))
            .add_systems(Update, (health_contacts, tick_health, release_input_on_player_removed).chain().in_set(HealthSet));
    }
}
