//! Debug utilities, including a system (F3 default) that dumps diagnostics,
//! player state, fire/ice state and process memory to a timestamped text
//! file in `./debug-dumps/`.
//!
//! Useful for capturing a snapshot of a propagation or respawn bug without
//! attaching a debugger.
use std::fmt::Write;
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use bevy::diagnostic::{Diagnostic, DiagnosticPath, DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use chrono::{DateTime, Utc};
use sysinfo::{Pid, PidExt, ProcessExt, System, SystemExt};

use crate::health::Health;
use crate::input::ActionState;
use crate::physics::Body;
use crate::player::{Locomotion, Player};
use crate::scene::{ActiveScene, LevelProgress};
use crate::thermal::{Flammable, Meltable};

pub const DUMP_DIR: &str = "debug-dumps";

/// Player state as it appears in a dump.
#[derive(Debug, Clone, Default)]
pub struct PlayerSnapshot {
    pub position: Vec3,
    pub velocity: Vec3,
    pub locomotion: String,
    pub health: String,
}

/// Everything one dump reports, gathered before formatting.
#[derive(Debug, Clone, Default)]
pub struct DumpSnapshot {
    pub epoch_secs: u64,
    pub fps: f64,
    pub frame_time: f64,
    pub entities: usize,
    pub level: String,
    pub progress: Option<LevelProgress>,
    pub player: Option<PlayerSnapshot>,
    /// (name, state) for every flammable entity.
    pub flammables: Vec<(String, String)>,
    /// (name, state) for every meltable entity.
    pub meltables: Vec<(String, String)>,
    /// Resident and virtual process memory in bytes.
    pub process_memory: Option<(u64, u64)>,
    pub system_memory: (u64, u64),
}

fn bytes_to_mb(bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let mb = bytes as f64 / 1024.0 / 1024.0;
    format!("{mb:.2} MB")
}

fn describe_flammable(f: &Flammable) -> String {
    let state = if f.is_burnt_out() {
        "burnt out"
    } else if f.on_fire {
        "burning"
    } else {
        "unlit"
    };
    format!("{state} ({:.1}s burnt, limit {:?}, spread {})", f.burn_elapsed, f.burn_limit, f.spread.enabled)
}

fn describe_meltable(m: &Meltable) -> String {
    format!(
        "{} scale=({:.2}, {:.2}, {:.2}) natural={}",
        if m.melting { "melting" } else { "solid" },
        m.scale.x,
        m.scale.y,
        m.scale.z,
        if m.natural.triggered { "triggered".to_owned() } else { format!("{:.1}s", m.natural.remaining) },
    )
}

/// Render a snapshot as the dump file body.
#[must_use]
pub fn format_dump(snap: &DumpSnapshot) -> String {
    let human_ts = i64::try_from(snap.epoch_secs)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map_or_else(|| "unknown".to_owned(), |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string());

    let mut out = String::new();
    writeln!(out, "Debug dump: {}", snap.epoch_secs).ok();
    writeln!(out, "Timestamp: {human_ts} (epoch secs: {})", snap.epoch_secs).ok();
    writeln!(out, "FPS: {:.1}, frame_time: {:.4} ms", snap.fps, snap.frame_time).ok();
    writeln!(out, "Entities: {}", snap.entities).ok();
    writeln!(out, "Level: {}", snap.level).ok();
    let progress = snap.progress.as_ref().map_or_else(
        || "(not installed)".to_owned(),
        |p| format!("one={} two={} three={}", p.level_one_complete, p.level_two_complete, p.level_three_complete),
    );
    writeln!(out, "Progress: {progress}").ok();

    writeln!(out, "\nPlayer:").ok();
    match &snap.player {
        Some(p) => {
            writeln!(out, "  position: {:?}", p.position).ok();
            writeln!(out, "  velocity: {:?}", p.velocity).ok();
            writeln!(out, "  locomotion: {}", p.locomotion).ok();
            writeln!(out, "  health: {}", p.health).ok();
        }
        None => {
            writeln!(out, "  (no player)").ok();
        }
    }

    let burning = snap.flammables.iter().filter(|(_, s)| s.starts_with("burning")).count();
    writeln!(out, "\nFlammables: {} ({burning} burning)", snap.flammables.len()).ok();
    for (name, state) in &snap.flammables {
        writeln!(out, "  {name} -> {state}").ok();
    }
    writeln!(out, "\nMeltables: {}", snap.meltables.len()).ok();
    for (name, state) in &snap.meltables {
        writeln!(out, "  {name} -> {state}").ok();
    }

    writeln!(out).ok();
    let process = snap
        .process_memory
        .map_or_else(|| "(unavailable)".to_owned(), |(resident, virt)| format!("{} (virtual {})", bytes_to_mb(resident), bytes_to_mb(virt)));
    writeln!(out, "Process memory: {process}").ok();
    writeln!(
        out,
        "System memory: total={} used={}",
        bytes_to_mb(snap.system_memory.0),
        bytes_to_mb(snap.system_memory.1)
    )
    .ok();
    out
}

#[derive(SystemParam)]
pub struct DumpCtx<'w, 's> {
    pub actions: Res<'w, ActionState>,
    pub diagnostics: Option<Res<'w, DiagnosticsStore>>,
    pub active: Option<Res<'w, ActiveScene>>,
    pub progress: Option<Res<'w, LevelProgress>>,
    pub entities: Query<'w, 's, Entity>,
    pub players: Query<'w, 's, (&'static Transform, &'static Body, &'static Locomotion, &'static Health), With<Player>>,
    pub flammables: Query<'w, 's, (Entity, &'static Flammable, Option<&'static Name>)>,
    pub meltables: Query<'w, 's, (Entity, &'static Meltable, Option<&'static Name>)>,
}

fn display_name(entity: Entity, name: Option<&Name>) -> String {
    name.map_or_else(|| format!("{entity:?}"), |n| n.as_str().to_owned())
}

impl DumpCtx<'_, '_> {
    fn snapshot(&self, epoch_secs: u64) -> DumpSnapshot {
        let smoothed = |path: &DiagnosticPath| {
            self.diagnostics
                .as_ref()
                .and_then(|d| d.get(path))
                .and_then(Diagnostic::smoothed)
                .unwrap_or(0.0)
        };

        let player = self.players.get_single().ok().map(|(tf, body, loco, health)| PlayerSnapshot {
            position: tf.translation,
            velocity: body.velocity,
            locomotion: format!(
                "{:?} speed={:.1} grounded={} slope={:?}",
                loco.state, loco.move_speed, loco.grounded, loco.slope_normal
            ),
            health: format!("{:.1}/{} damage={} respawn={:?}", health.current, health.max, health.taking_damage, health.respawn),
        });

        let mut flammables: Vec<_> = self.flammables.iter().map(|(e, f, n)| (display_name(e, n), describe_flammable(f))).collect();
        flammables.sort();
        let mut meltables: Vec<_> = self.meltables.iter().map(|(e, m, n)| (display_name(e, n), describe_meltable(m))).collect();
        meltables.sort();

        let mut sys = System::new();
        sys.refresh_memory();
        let pid = Pid::from_u32(std::process::id());
        sys.refresh_process(pid);
        let process_memory = sys.process(pid).map(|p| (p.memory(), p.virtual_memory()));

        DumpSnapshot {
            epoch_secs,
            fps: smoothed(&FrameTimeDiagnosticsPlugin::FPS),
            frame_time: smoothed(&FrameTimeDiagnosticsPlugin::FRAME_TIME),
            entities: self.entities.iter().count(),
            level: self.active.as_ref().map_or_else(|| "(none)".to_owned(), |a| a.current.scene_name().to_owned()),
            progress: self.progress.as_deref().cloned(),
            player,
            flammables,
            meltables,
            process_memory,
            system_memory: (sys.total_memory(), sys.used_memory()),
        }
    }
}

/// Write a dump when the debug action is pressed.
pub fn debug_dump_system(ctx: DumpCtx) {
    if !ctx.actions.dump_debug {
        return;
    }
    let epoch_secs = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
    let text = format_dump(&ctx.snapshot(epoch_secs));

    let fname = format!("{DUMP_DIR}/debug-{epoch_secs}.txt");
    if let Err(e) = fs::create_dir_all(DUMP_DIR) {
        error!("debug dump: failed to create dir '{DUMP_DIR}': {e}");
        return;
    }
    if let Err(e) = fs::write(&fname, text) {
        error!("debug dump: failed to write {fname}: {e}");
    } else {
        info!("wrote debug dump: {fname}");
    }
}

pub struct DebugDumpPlugin;

impl Plugin for DebugDumpPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, debug_dump_system);
    }
}
