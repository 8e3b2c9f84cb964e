use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::prelude::*;
use bevy::window::{PresentMode, Window, WindowPlugin};
use cinderfrost::debug::DebugDumpPlugin;
use cinderfrost::health::HealthPlugin;
use cinderfrost::input::ActionsPlugin;
use cinderfrost::physics::PhysicsPlugin;
use cinderfrost::player::PlayerPlugin;
use cinderfrost::scene::{self, ScenePlugin};
use cinderfrost::settings::loader as settings_loader;
use cinderfrost::spells::SpellsPlugin;
use cinderfrost::thermal::ThermalPlugin;

mod app;
use app::{
    attach_collider_meshes, attach_fire_meshes, attach_player_mesh, draw_gizmos, setup, sync_vsync_settings,
    toggle_gizmos,
};

/// Fixed-step rate for body integration and locomotion forces.
pub const PHYSICS_TICK_RATE: f64 = 50.0;

fn main() {
    let settings = settings_loader::load_settings_from_dir(settings_loader::SETTINGS_DIR);
    let settings_watcher = settings_loader::setup_settings_watcher(settings_loader::SETTINGS_DIR)
        .unwrap_or_else(|_| settings_loader::SettingsWatcher::stub());
    let levels = scene::load_levels_from_dir(scene::LEVELS_DIR);
    let level_watcher = scene::setup_level_watcher(scene::LEVELS_DIR).unwrap_or_else(|_| scene::LevelWatcher::stub());

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "cinderfrost".into(),
            position: WindowPosition::Centered(MonitorSelection::Primary),
            present_mode: if settings.graphics.vsync { PresentMode::Fifo } else { PresentMode::AutoNoVsync },
            ..default()
        }),
        ..default()
    }))
    .add_plugins(FrameTimeDiagnosticsPlugin)
    .insert_resource(Time::<Fixed>::from_hz(PHYSICS_TICK_RATE));

    app.insert_resource(settings);
    app.insert_resource(settings_watcher);
    app.insert_resource(levels);
    app.insert_resource(level_watcher);

    app.add_plugins((
        PhysicsPlugin,
        ActionsPlugin,
        PlayerPlugin,
        ThermalPlugin,
        HealthPlugin,
        SpellsPlugin,
        ScenePlugin::default(),
        DebugDumpPlugin,
    ));

    app.add_systems(Startup, setup);
    app.add_systems(Update, settings_loader::check_settings_changes);
    app.add_systems(Update, scene::check_level_changes);
    app.add_systems(Update, sync_vsync_settings);
    app.add_systems(Update, (toggle_gizmos, draw_gizmos).chain());
    app.add_systems(Update, (attach_collider_meshes, attach_fire_meshes, attach_player_mesh));

    app.run();
}
