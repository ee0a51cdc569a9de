//! Persistent storage
//!
//! This module handles all data persistence: settings, the user profile,
//! conversation history and temporary files.

pub mod conversations;
pub mod profile;
pub mod settings;
pub mod temp;

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;

/// Overrides both the config and data directories when set
pub const HOME_ENV: &str = "JARVIS_HOME";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Could not determine a home directory for application data")]
    NoHomeDir,
    #[error("{0}")]
    Invalid(String),
}

fn project_dirs() -> Result<ProjectDirs, StorageError> {
    ProjectDirs::from("com", "jarvis", "Jarvis").ok_or(StorageError::NoHomeDir)
}

/// Directory holding the database, temp files and other generated data
pub fn get_data_dir() -> Result<PathBuf, StorageError> {
    if let Ok(home) = std::env::var(HOME_ENV) {
        return Ok(PathBuf::from(home).join("data"));
    }
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Directory holding `settings.yaml` and `user_profile.json`
pub fn get_config_dir() -> Result<PathBuf, StorageError> {
    if let Ok(home) = std::env::var(HOME_ENV) {
        return Ok(PathBuf::from(home).join("config"));
    }
    Ok(project_dirs()?.config_dir().to_path_buf())
}

/// Resolved on-disk locations used by one assistant instance
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_file: PathBuf,
    pub profile_file: PathBuf,
    pub data_dir: PathBuf,
}

impl AppPaths {
    /// Standard locations, with an optional explicit settings file
    pub fn resolve(config_override: Option<&Path>) -> Result<Self, StorageError> {
        let config_file = match config_override {
            Some(path) => path.to_path_buf(),
            None => settings::default_config_path()?,
        };
        let profile_dir = match config_file.parent() {
            Some(parent) => parent.to_path_buf(),
            None => get_config_dir()?,
        };
        Ok(Self {
            profile_file: profile_dir.join("user_profile.json"),
            config_file,
            data_dir: get_data_dir()?,
        })
    }

    /// Everything under one root; used by tests and portable installs
    pub fn under(root: &Path) -> Self {
        Self {
            config_file: root.join("config").join(settings::SETTINGS_FILE),
            profile_file: root.join("config").join("user_profile.json"),
            data_dir: root.join("data"),
        }
    }
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(path: &str) -> PathBuf {
    let trimmed = path.trim();
    if trimmed == "~" {
        return home_dir();
    }
    if let Some(rest) = trimmed
        .strip_prefix("~/")
        .or_else(|| trimmed.strip_prefix("~\\"))
    {
        return home_dir().join(rest);
    }
    PathBuf::from(trimmed)
}

pub fn home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
