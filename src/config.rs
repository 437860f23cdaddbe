use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::audio::AudioPaths;

pub const MIN_CHOICES: usize = 2;
pub const MAX_CHOICES: usize = 6;

/// User preferences, kept apart from learning progress
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Answer options per round, between [`MIN_CHOICES`] and [`MAX_CHOICES`]
    pub num_choices: usize,
    /// Print the word under each picture
    pub show_labels: bool,
    /// Letters whose words may appear as phonics distractors
    pub filtered_letters: Vec<String>,
    pub audio: AudioPaths,
    pub advance_delay_ms: u64,
    pub achievement_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            num_choices: 4,
            show_labels: false,
            filtered_letters: ["А", "Б", "В", "Г", "Д", "Е"]
                .iter()
                .map(|l| l.to_string())
                .collect(),
            audio: AudioPaths::default(),
            advance_delay_ms: 2300,
            achievement_delay_ms: 1000,
        }
    }
}

impl Settings {
    /// Pull hand-edited values back into range
    pub fn normalized(mut self) -> Self {
        self.num_choices = self.num_choices.clamp(MIN_CHOICES, MAX_CHOICES);
        self
    }
}

pub trait SettingsStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::settings_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Settings {
        let Ok(bytes) = fs::read(&self.path) else {
            return Settings::default();
        };
        match serde_json::from_slice::<Settings>(&bytes) {
            Ok(settings) => settings.normalized(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable settings, using defaults");
                Settings::default()
            }
        }
    }

    fn save(&self, settings: &Settings) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_settings() {
        let dir = tempdir().unwrap();
        let store = FileSettingsStore::with_path(dir.path().join("settings.json"));
        let settings = Settings::default();
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn save_and_load_custom_settings() {
        let dir = tempdir().unwrap();
        let store = FileSettingsStore::with_path(dir.path().join("nested").join("settings.json"));
        let settings = Settings {
            num_choices: 3,
            show_labels: true,
            filtered_letters: vec!["М".into(), "Л".into()],
            audio: AudioPaths {
                base: "/srv/sounds/".into(),
                ..AudioPaths::default()
            },
            advance_delay_ms: 500,
            achievement_delay_ms: 0,
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = FileSettingsStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn garbage_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(FileSettingsStore::with_path(&path).load(), Settings::default());
    }

    #[test]
    fn partial_file_fills_in_and_clamps() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, br#"{"num_choices": 12, "show_labels": true}"#).unwrap();
        let loaded = FileSettingsStore::with_path(&path).load();
        assert_eq!(loaded.num_choices, MAX_CHOICES);
        assert!(loaded.show_labels);
        assert_eq!(loaded.filtered_letters.len(), 6);
    }
}
