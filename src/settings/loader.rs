//! Settings loading and hot-reloading.
//!
//! Settings are loaded from RON files in the `data/settings` directory. If multiple
//! RON files are present, the first successfully parsed `Settings` will be used.
//! If no RON files are found or if no parsing succeeds, default settings will be used.
use bevy::prelude::{Res, ResMut, Resource, info, warn};

use crate::ron_loader::{RonWatcher, load_ron_files, setup_ron_watcher};
use crate::settings::Settings;

pub const SETTINGS_DIR: &str = "data/settings";

#[derive(Resource)]
pub struct SettingsWatcher(pub RonWatcher);

impl SettingsWatcher {
    #[must_use]
    pub fn stub() -> Self {
        SettingsWatcher(RonWatcher::stub())
    }
}

/// Load settings from `path` (directory), or defaults when nothing parses.
///
/// # Example
/// ```
/// use cinderfrost::settings::loader::load_settings_from_dir;
///
/// let settings = load_settings_from_dir("does/not/exist");
/// assert_eq!(settings.health.max_health, 100.0);
/// ```
#[must_use]
pub fn load_settings_from_dir(path: &str) -> Settings {
    let items: Vec<Settings> = load_ron_files(path);
    items.into_iter().next().unwrap_or_else(|| {
        warn!("no settings found in {path}, using defaults");
        Settings::defaults()
    })
}

/// Create a watcher for the settings directory (hot-reload).
///
/// # Errors
/// Returns the `notify::Error` raised while creating or registering the watcher.
pub fn setup_settings_watcher(path: &str) -> Result<SettingsWatcher, notify::Error> {
    setup_ron_watcher(path).map(SettingsWatcher)
}

/// Reload the `Settings` resource when the watcher reports a change.
#[allow(clippy::needless_pass_by_value)]
pub fn check_settings_changes(watcher: Res<SettingsWatcher>, mut settings: ResMut<Settings>) {
    if watcher.0.take_changed() {
        info!("settings changed, reloading");
        *settings = load_settings_from_dir(SETTINGS_DIR);
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::ron_loader::parse_ron;

    #[test]
    fn shipped_settings_parse() {
        let parsed: Option<Settings> = parse_ron(include_str!("../../data/settings/settings.ron"), Path::new("settings.ron"));
        let settings = parsed.unwrap();
        assert_eq!(settings.spells.fire_angle_adjustment, 10.0);
        assert!(settings.spells.ice_block.melts_naturally);
        assert_eq!(settings.movement.ground_mask, crate::physics::LayerMask::GROUND);
    }
}
