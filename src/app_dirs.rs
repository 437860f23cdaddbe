use directories::ProjectDirs;
use std::path::PathBuf;

const APP: &str = "bukvar";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Progress database and log file live here
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join(APP))
        } else {
            ProjectDirs::from("", "", APP).map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn progress_db_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("progress.db"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("bukvar.log"))
    }

    pub fn settings_path() -> PathBuf {
        ProjectDirs::from("", "", APP)
            .map(|pd| pd.config_dir().join("settings.json"))
            .unwrap_or_else(|| PathBuf::from("bukvar_settings.json"))
    }
}
