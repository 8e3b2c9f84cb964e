//! Level layout loading and hot-reloading.
//!
//! Every `.ron` file in `data/levels` holds one [`LevelLayout`]. When two
//! files describe the same level the first (by file name) wins.

use std::collections::HashMap;

use bevy::prelude::{Res, ResMut, Resource, info, warn};

use super::layout::LevelLayout;
use super::{Level, SceneError};
use crate::ron_loader::{RonWatcher, load_ron_files, setup_ron_watcher};

pub const LEVELS_DIR: &str = "data/levels";

#[derive(Resource, Debug, Default, Clone)]
pub struct LevelLibrary {
    layouts: HashMap<Level, LevelLayout>,
}

impl LevelLibrary {
    /// Add a layout unless its level already has one.
    pub fn insert(&mut self, layout: LevelLayout) -> bool {
        if self.layouts.contains_key(&layout.level) {
            warn!("duplicate layout for {:?}, keeping the first", layout.level);
            return false;
        }
        self.layouts.insert(layout.level, layout);
        true
    }

    /// # Errors
    /// [`SceneError::MissingLayout`] when no file describes `level`.
    pub fn get(&self, level: Level) -> Result<&LevelLayout, SceneError> {
        self.layouts.get(&level).ok_or(SceneError::MissingLayout(level))
    }

    /// The layout for `level`, or the built-in test arena.
    #[must_use]
    pub fn layout_or_builtin(&self, level: Level) -> LevelLayout {
        match self.get(level) {
            Ok(layout) => layout.clone(),
            Err(e) => {
                warn!("{e}, using the built-in arena");
                LevelLayout::builtin(level)
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

#[must_use]
pub fn load_levels_from_dir(path: &str) -> LevelLibrary {
    let mut library = LevelLibrary::default();
    let layouts: Vec<LevelLayout> = load_ron_files(path);
    for layout in layouts {
        library.insert(layout);
    }
    info!("loaded {} level layouts from {path}", library.len());
    library
}

#[derive(Resource)]
pub struct LevelWatcher(pub RonWatcher);

impl LevelWatcher {
    #[must_use]
    pub fn stub() -> Self {
        LevelWatcher(RonWatcher::stub())
    }
}

/// # Errors
/// Returns the `notify::Error` raised while creating or registering the watcher.
pub fn setup_level_watcher(path: &str) -> Result<LevelWatcher, notify::Error> {
    setup_ron_watcher(path).map(LevelWatcher)
}

/// Reload the library on change. The running level keeps its entities until
/// the next load.
#[allow(clippy::needless_pass_by_value)]
pub fn check_level_changes(watcher: Res<LevelWatcher>, mut library: ResMut<LevelLibrary>) {
    if watcher.0.take_changed() {
        info!("level layouts changed, reloading");
        *library = load_levels_from_dir(LEVELS_DIR);
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::Vec3;

    use super::*;

    #[test]
    fn first_layout_for_a_level_wins() {
        let mut library = LevelLibrary::default();
        assert!(library.insert(LevelLayout::empty(Level::Hub, Vec3::ONE)));
        assert!(!library.insert(LevelLayout::empty(Level::Hub, Vec3::ZERO)));
        assert_eq!(library.get(Level::Hub).unwrap().spawn_point, Vec3::ONE);
    }

    #[test]
    fn missing_level_falls_back_to_builtin() {
        let library = LevelLibrary::default();
        assert_eq!(library.get(Level::LevelTwo).unwrap_err(), SceneError::MissingLayout(Level::LevelTwo));
        let layout = library.layout_or_builtin(Level::LevelTwo);
        assert_eq!(layout.level, Level::LevelTwo);
        assert!(!layout.solids.is_empty());
    }

    #[test]
    fn loads_layout_files_from_disk() {
        let dir = std::env::temp_dir().join(format!("cinderfrost-levels-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("hub.ron"), "(level: Hub, spawn_point: (0.0, 3.0, 0.0))").unwrap();
        std::fs::write(dir.join("broken.ron"), "(level: Nowhere)").unwrap();

        let library = load_levels_from_dir(dir.to_str().unwrap());
        assert_eq!(library.len(), 1);
        assert_eq!(library.get(Level::Hub).unwrap().spawn_point, Vec3::new(0.0, 3.0, 0.0));
        std::fs::remove_dir_all(&dir).ok();
    }
}
