//! Levels, scene transitions, teleporters and pausing.
//!
//! A "scene" here is the set of top-level entities tagged [`SceneEntity`].
//! Loading a level despawns that set, spawns the level's layout and puts the
//! player back at the spawn point. The player, camera and fire breath hitbox
//! live outside any scene.

pub mod layout;
pub mod loader;

use std::str::FromStr;

use bevy::app::AppExit;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::health::{Health, HealthSet};
use crate::input::{ActionState, InputEnabled};
use crate::physics::{Body, ContactKind, Sensor, Tag, TriggerEvent};
use crate::player::{CursorLock, Player, place_player};
use crate::spells::SpellSet;
use crate::thermal::ThermalSet;

pub use layout::{LevelLayout, spawn_layout};
pub use loader::{LEVELS_DIR, LevelLibrary, LevelWatcher, check_level_changes, load_levels_from_dir, setup_level_watcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Level {
    MainMenu,
    #[default]
    Hub,
    LevelOne,
    LevelTwo,
    LevelThree,
    Test,
    Tutorial,
    Win,
    Lose,
}

impl Level {
    #[must_use]
    pub fn scene_name(self) -> &'static str {
        match self {
            Level::MainMenu => "MainMenu",
            Level::Hub => "HubLevel",
            Level::LevelOne => "LevelOne",
            Level::LevelTwo => "LevelTwo",
            Level::LevelThree => "LevelThree",
            Level::Test => "TestLevel",
            Level::Tutorial => "Tutorial",
            Level::Win => "WinScreen",
            Level::Lose => "LoseScreen",
        }
    }

    /// Menu-style levels free the cursor.
    #[must_use]
    pub fn unlocks_cursor(self) -> bool {
        matches!(self, Level::MainMenu | Level::Tutorial | Level::Win | Level::Lose)
    }
}

impl FromStr for Level {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MainMenu" => Ok(Level::MainMenu),
            "HubLevel" | "Hub" => Ok(Level::Hub),
            "LevelOne" => Ok(Level::LevelOne),
            "LevelTwo" => Ok(Level::LevelTwo),
            "LevelThree" => Ok(Level::LevelThree),
            "TestLevel" | "Test" => Ok(Level::Test),
            "Tutorial" => Ok(Level::Tutorial),
            "WinScreen" | "Win" => Ok(Level::Win),
            "LoseScreen" | "Lose" => Ok(Level::Lose),
            other => Err(SceneError::UnknownLevel(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("unknown level name {0:?}")]
    UnknownLevel(String),
    #[error("no layout for level {0:?}")]
    MissingLayout(Level),
}

/// The level currently loaded.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveScene {
    pub current: Level,
}

/// Completion flags that survive level loads.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelProgress {
    pub level_one_complete: bool,
    pub level_two_complete: bool,
    pub level_three_complete: bool,
}

impl LevelProgress {
    /// Set the flag for `level`; `false` when the level has none.
    pub fn mark_complete(&mut self, level: Level) -> bool {
        match level {
            Level::LevelOne => self.level_one_complete = true,
            Level::LevelTwo => self.level_two_complete = true,
            Level::LevelThree => self.level_three_complete = true,
            _ => return false,
        }
        true
    }

    #[must_use]
    pub fn is_complete(&self, level: Level) -> bool {
        match level {
            Level::LevelOne => self.level_one_complete,
            Level::LevelTwo => self.level_two_complete,
            Level::LevelThree => self.level_three_complete,
            _ => false,
        }
    }
}

/// Install the progress store once; a second install is refused and logged.
pub fn install_progress(world: &mut World, progress: LevelProgress) -> bool {
    if world.contains_resource::<LevelProgress>() {
        error!("LevelProgress already installed, discarding the duplicate");
        return false;
    }
    world.insert_resource(progress);
    true
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneRequest {
    Load(Level),
    RestartCurrent,
    Quit,
}

/// Removed on every level load.
#[derive(Component, Debug, Default)]
pub struct SceneEntity;

#[derive(Component, Debug, Clone, Copy)]
pub struct Teleporter {
    pub destination: Level,
    pub set_completion_flag: bool,
}

#[allow(clippy::needless_pass_by_value)]
pub fn request_initial_level(active: Res<ActiveScene>, mut requests: EventWriter<SceneRequest>) {
    requests.send(SceneRequest::Load(active.current));
}

/// Player contact with a teleporter: flag completion, then travel.
#[allow(clippy::needless_pass_by_value)]
pub fn teleport_on_contact(
    mut events: EventReader<TriggerEvent>,
    players: Query<(), With<Player>>,
    teleporters: Query<&Teleporter>,
    active: Res<ActiveScene>,
    mut progress: Option<ResMut<LevelProgress>>,
    mut requests: EventWriter<SceneRequest>,
) {
    let entered = events
        .read()
        .filter(|ev| ev.kind == ContactKind::Enter && ev.tag == Tag::Teleporter && players.contains(ev.sensor))
        .filter_map(|ev| teleporters.get(ev.other).ok())
        .last();
    let Some(teleporter) = entered else { return };

    info!("player entered a teleporter");
    if teleporter.set_completion_flag {
        match progress.as_deref_mut().map(|p| p.mark_complete(active.current)) {
            Some(true) => info!("{:?} completed", active.current),
            Some(false) => info!("no completion flag for {:?}", active.current),
            None => error!("LevelProgress missing, completion not recorded"),
        }
    }
    info!("teleporting to {:?}", teleporter.destination);
    requests.send(SceneRequest::Load(teleporter.destination));
}

#[derive(SystemParam)]
pub struct SceneLoadCtx<'w, 's> {
    pub commands: Commands<'w, 's>,
    pub library: Res<'w, LevelLibrary>,
    pub active: ResMut<'w, ActiveScene>,
    pub cursor: ResMut<'w, CursorLock>,
    pub input: ResMut<'w, InputEnabled>,
    pub time: ResMut<'w, Time<Virtual>>,
    pub scene_entities: Query<'w, 's, Entity, With<SceneEntity>>,
    pub players: Query<'w, 's, (&'static mut Transform, &'static mut Body, &'static mut Sensor, &'static mut Health), With<Player>>,
    pub exit: EventWriter<'w, AppExit>,
}

impl SceneLoadCtx<'_, '_> {
    fn load(&mut self, level: Level, restart: bool) {
        for entity in &self.scene_entities {
            self.commands.entity(entity).despawn_recursive();
        }
        let layout = self.library.layout_or_builtin(level);
        spawn_layout(&mut self.commands, &layout);

        for (mut tf, mut body, mut sensor, mut health) in &mut self.players {
            place_player(&mut tf, &mut body, &mut sensor, layout.spawn_point);
            health.refill();
            if !restart && health.is_respawning() {
                health.cancel_respawn();
                self.input.0 = true;
            }
        }

        self.active.current = level;
        self.cursor.locked = !level.unlocks_cursor();
        self.time.unpause();
        info!("loaded {}", level.scene_name());
    }
}

/// Apply this frame's scene requests. A quit wins; otherwise only the last
/// load takes effect.
pub fn handle_scene_requests(mut requests: EventReader<SceneRequest>, mut ctx: SceneLoadCtx) {
    let mut quit = false;
    let mut target = None;
    for request in requests.read() {
        match *request {
            SceneRequest::Quit => quit = true,
            SceneRequest::Load(level) => target = Some((level, false)),
            SceneRequest::RestartCurrent => target = Some((ctx.active.current, true)),
        }
    }
    if quit {
        info!("quitting");
        ctx.exit.send(AppExit::Success);
        return;
    }
    if let Some((level, restart)) = target {
        ctx.load(level, restart);
    }
}

/// Pause action: freeze virtual time and free the cursor, or the reverse.
#[allow(clippy::needless_pass_by_value)]
pub fn toggle_pause(
    actions: Res<ActionState>,
    active: Res<ActiveScene>,
    mut time: ResMut<Time<Virtual>>,
    mut cursor: ResMut<CursorLock>,
) {
    if !actions.pause_triggered {
        return;
    }
    if time.is_paused() {
        time.unpause();
        cursor.locked = !active.current.unlocks_cursor();
        info!("game un-paused");
    } else {
        time.pause();
        cursor.locked = false;
        info!("game paused");
    }
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SceneSet;

pub struct ScenePlugin {
    pub initial: Level,
}

impl Default for ScenePlugin {
    fn default() -> Self {
        ScenePlugin { initial: Level::Hub }
    }
}

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        install_progress(app.world_mut(), LevelProgress::default());
        app.insert_resource(ActiveScene { current: self.initial })
            .init_resource::<CursorLock>()
            .add_event::<SceneRequest>()
            .configure_sets(Update, SceneSet.after(HealthSet).after(ThermalSet).after(SpellSet))
            .add_systems(Startup, request_initial_level)
            .add_systems(Update, (toggle_pause, teleport_on_contact, handle_scene_requests).chain().in_set(SceneSet));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scene_names() {
        assert_eq!("HubLevel".parse::<Level>(), Ok(Level::Hub));
        assert_eq!("LoseScreen".parse::<Level>(), Ok(Level::Lose));
        for level in [Level::MainMenu, Level::LevelThree, Level::Test, Level::Win] {
            assert_eq!(level.scene_name().parse::<Level>(), Ok(level));
        }
        assert_eq!("Nowhere".parse::<Level>(), Err(SceneError::UnknownLevel("Nowhere".into())));
    }

    #[test]
    fn menus_unlock_the_cursor() {
        assert!(Level::MainMenu.unlocks_cursor());
        assert!(Level::Lose.unlocks_cursor());
        assert!(!Level::LevelOne.unlocks_cursor());
    }

    #[test]
    fn only_numbered_levels_have_completion_flags() {
        let mut progress = LevelProgress::default();
        assert!(progress.mark_complete(Level::LevelTwo));
        assert!(!progress.mark_complete(Level::Hub));
        assert!(progress.is_complete(Level::LevelTwo));
        assert!(!progress.is_complete(Level::LevelOne));
    }

    #[test]
    fn duplicate_progress_is_discarded() {
        let mut world = World::new();
        let first = LevelProgress { level_one_complete: true, ..Default::default() };
        assert!(install_progress(&mut world, first.clone()));
        assert!(!install_progress(&mut world, LevelProgress::default()));
        assert_eq!(*world.resource::<LevelProgress>(), first);
    }

    fn scene_app(current: Level) -> App {
        let mut app = App::new();
        app.init_resource::<Time<Virtual>>()
            .init_resource::<LevelLibrary>()
            .init_resource::<CursorLock>()
            .init_resource::<InputEnabled>()
            .init_resource::<ActionState>()
            .init_resource::<LevelProgress>()
            .insert_resource(ActiveScene { current })
            .add_event::<SceneRequest>()
            .add_event::<TriggerEvent>()
            .add_event::<AppExit>()
            .add_systems(Update, (toggle_pause, teleport_on_contact, handle_scene_requests).chain());
        app
    }

    fn spawn_test_player(app: &mut App) -> Entity {
        let settings = crate::settings::Settings::default();
        app.world_mut()
            .spawn((Player, Transform::default(), Body::default(), Sensor::new(0.9), Health::new(&settings.health)))
            .id()
    }

    #[test]
    fn teleporter_flags_completion_and_loads_destination() {
        let mut app = scene_app(Level::LevelOne);
        let player = spawn_test_player(&mut app);
        let tp = app.world_mut().spawn(Teleporter { destination: Level::Hub, set_completion_flag: true }).id();

        app.world_mut().send_event(TriggerEvent { sensor: player, other: tp, tag: Tag::Teleporter, kind: ContactKind::Enter });
        app.update();

        assert!(app.world().resource::<LevelProgress>().level_one_complete);
        assert_eq!(app.world().resource::<ActiveScene>().current, Level::Hub);
        let spawn = LevelLayout::builtin(Level::Hub).spawn_point;
        assert_eq!(app.world().get::<Transform>(player).unwrap().translation, spawn);
    }

    #[test]
    fn teleporter_travels_without_a_flag_or_progress() {
        let mut app = scene_app(Level::Tutorial);
        let player = spawn_test_player(&mut app);
        let tp = app.world_mut().spawn(Teleporter { destination: Level::LevelTwo, set_completion_flag: true }).id();
        app.world_mut().send_event(TriggerEvent { sensor: player, other: tp, tag: Tag::Teleporter, kind: ContactKind::Enter });
        app.update();
        assert_eq!(*app.world().resource::<LevelProgress>(), LevelProgress::default());
        assert_eq!(app.world().resource::<ActiveScene>().current, Level::LevelTwo);

        app.world_mut().remove_resource::<LevelProgress>();
        let back = app.world_mut().spawn(Teleporter { destination: Level::LevelOne, set_completion_flag: true }).id();
        app.world_mut().send_event(TriggerEvent { sensor: player, other: back, tag: Tag::Teleporter, kind: ContactKind::Enter });
        app.update();
        assert_eq!(app.world().resource::<ActiveScene>().current, Level::LevelOne);
    }

    #[test]
    fn reloading_replaces_scene_entities() {
        let mut app = scene_app(Level::Test);
        spawn_test_player(&mut app);
        app.world_mut().send_event(SceneRequest::Load(Level::Test));
        app.update();
        let mut scene = app.world_mut().query_filtered::<Entity, With<SceneEntity>>();
        let first = scene.iter(app.world()).count();
        assert!(first > 0);

        app.world_mut().send_event(SceneRequest::RestartCurrent);
        app.update();
        assert_eq!(scene.iter(app.world()).count(), first);
    }

    #[test]
    fn load_cancels_a_running_respawn_but_restart_does_not() {
        let mut app = scene_app(Level::LevelOne);
        let player = spawn_test_player(&mut app);
        app.world_mut().get_mut::<Health>(player).unwrap().force_respawn();
        app.world_mut().resource_mut::<InputEnabled>().0 = false;

        app.world_mut().send_event(SceneRequest::RestartCurrent);
        app.update();
        assert!(app.world().get::<Health>(player).unwrap().is_respawning());

        app.world_mut().send_event(SceneRequest::Load(Level::Hub));
        app.update();
        assert!(!app.world().get::<Health>(player).unwrap().is_respawning());
        assert!(app.world().resource::<InputEnabled>().0);
    }

    #[test]
    fn menu_levels_free_the_cursor() {
        let mut app = scene_app(Level::Hub);
        app.world_mut().send_event(SceneRequest::Load(Level::MainMenu));
        app.update();
        assert!(!app.world().resource::<CursorLock>().locked);
    }

    #[test]
    fn quit_sends_app_exit() {
        let mut app = scene_app(Level::Hub);
        app.world_mut().send_event(SceneRequest::Load(Level::Test));
        app.world_mut().send_event(SceneRequest::Quit);
        app.update();
        let exits: Vec<AppExit> = app.world_mut().resource_mut::<Events<AppExit>>().drain().collect();
        assert_eq!(exits, vec![AppExit::Success]);
        assert_eq!(app.world().resource::<ActiveScene>().current, Level::Hub);
    }

    #[test]
    fn pause_toggles_time_and_cursor() {
        let mut app = scene_app(Level::Hub);
        app.insert_resource(ActionState { pause_triggered: true, ..Default::default() });
        app.update();
        assert!(app.world().resource::<Time<Virtual>>().is_paused());
        assert!(!app.world().resource::<CursorLock>().locked);
        app.update();
        assert!(!app.world().resource::<Time<Virtual>>().is_paused());
        assert!(app.world().resource::<CursorLock>().locked);
    }
}
