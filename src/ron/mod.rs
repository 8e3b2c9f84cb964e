//! Utilities for loading RON files and watching directories for changes.
//!
//! Settings and level layouts are plain RON files. The watcher sets a shared
//! flag when a file under the watched directory is modified, which the
//! owning system polls once per frame to hot-reload.

use bevy::prelude::{Resource, warn};
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Resource)]
/// File-watcher resource for RON hot-reload.
pub struct RonWatcher {
    pub changed: Arc<Mutex<bool>>, // Set to `true` when watched files change.
    _watcher: Option<notify::RecommendedWatcher>, // Kept alive for the lifetime of the resource.
}

impl RonWatcher {
    /// A watcher with no OS backing; `changed` is never set by itself.
    /// Used when watcher creation fails.
    #[must_use]
    pub fn stub() -> Self {
        RonWatcher {
            changed: Arc::new(Mutex::new(false)),
            _watcher: None,
        }
    }

    /// Read and clear the change flag. A poisoned lock is recovered.
    pub fn take_changed(&self) -> bool {
        let mut flag = match self.changed.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("ron watcher mutex poisoned, recovering");
                poisoned.into_inner()
            }
        };
        std::mem::take(&mut *flag)
    }
}

/// Parse one RON document, logging and discarding it on error.
pub fn parse_ron<T: DeserializeOwned>(content: &str, origin: &Path) -> Option<T> {
    match ron::from_str::<T>(content) {
        Ok(item) => Some(item),
        Err(e) => {
            warn!("failed to parse {}: {e}", origin.display());
            None
        }
    }
}

/// Load all `.ron` files from a directory and deserialize them into `T`.
///
/// Files are visited in name order. Files that fail to parse are skipped
/// with a warning.
#[must_use]
pub fn load_ron_files<T: DeserializeOwned>(path: &str) -> Vec<T> {
    let Ok(entries) = std::fs::read_dir(path) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "ron"))
        .collect();
    files.sort();

    files
        .iter()
        .filter_map(|p| match std::fs::read_to_string(p) {
            Ok(content) => parse_ron(&content, p),
            Err(e) => {
                warn!("failed to read {}: {e}", p.display());
                None
            }
        })
        .collect()
}

/// Create a `RonWatcher` that watches a directory for modifications.
///
/// # Errors
/// Returns a `notify::Error` if the underlying file-watcher cannot be
/// created or the watcher cannot be registered for the provided path.
pub fn setup_ron_watcher(path: &str) -> Result<RonWatcher, notify::Error> {
    let changed = Arc::new(Mutex::new(false));
    let changed_clone = changed.clone();
    let watched_path: PathBuf = std::fs::canonicalize(path).unwrap_or_else(|_| PathBuf::from(path));

    let mut watcher: RecommendedWatcher = Watcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if !matches!(event.kind, notify::EventKind::Modify(_)) {
                    return;
                }
                let relevant = event.paths.iter().any(|p| {
                    std::fs::canonicalize(p).unwrap_or_else(|_| p.clone()).starts_with(&watched_path)
                });
                if relevant {
                    match changed_clone.lock() {
                        Ok(mut flag) => *flag = true,
                        Err(poisoned) => *poisoned.into_inner() = true,
                    }
                }
            }
            Err(e) => warn!("watch error: {e:?}"),
        },
        Config::default(),
    )?;

    watcher.watch(Path::new(path), RecursiveMode::NonRecursive)?;
    Ok(RonWatcher { changed, _watcher: Some(watcher) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        name: String,
    }

    #[test]
    fn loads_sorted_and_skips_bad_files() {
        let dir = std::env::temp_dir().join(format!("cinderfrost-ron-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("b.ron"), r#"(name: "second")"#).unwrap();
        std::fs::write(dir.join("a.ron"), r#"(name: "first")"#).unwrap();
        std::fs::write(dir.join("c.ron"), "(oops").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let items: Vec<Item> = load_ron_files(dir.to_str().unwrap());
        assert_eq!(items, vec![Item { name: "first".into() }, Item { name: "second".into() }]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_directory_is_empty() {
        let items: Vec<Item> = load_ron_files("definitely/not/here");
        assert!(items.is_empty());
    }

    #[test]
    fn take_changed_clears_flag() {
        let w = RonWatcher::stub();
        *w.changed.lock().unwrap() = true;
        assert!(w.take_changed());
        assert!(!w.take_changed());
    }
}
