//! Settings storage
//!
//! Loads and saves the YAML settings document.

use crate::storage::{get_config_dir, get_data_dir, StorageError};
use crate::types::config::AssistantConfig;
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "settings.yaml";

/// Load settings from disk
///
/// Returns default settings if the file is corrupted. A missing file is
/// created with defaults.
pub fn load_settings(path: &Path) -> AssistantConfig {
    match load_settings_internal(path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Failed to load settings, using defaults: {}", e);
            let mut settings = AssistantConfig::default();
            settings.validate();
            settings
        }
    }
}

/// Internal settings loading with error propagation
pub fn load_settings_internal(path: &Path) -> Result<AssistantConfig, StorageError> {
    if !path.exists() {
        tracing::warn!("Config file not found: {}", path.display());
        let settings = AssistantConfig::default();
        save_settings(path, &settings)?;
        return Ok(settings);
    }

    let yaml = fs::read_to_string(path)?;
    let mut settings = parse_settings(&yaml)?;
    settings.validate();

    tracing::info!("Configuration loaded from {}", path.display());
    Ok(settings)
}

/// Parse a settings document, warning about keys this version does not know
pub fn parse_settings(yaml: &str) -> Result<AssistantConfig, StorageError> {
    if yaml.trim().is_empty() {
        tracing::warn!("Empty configuration file, using defaults");
        return Ok(AssistantConfig::default());
    }

    let raw: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    for key in unknown_keys(&raw) {
        tracing::warn!("Unknown configuration key: {}", key);
    }

    Ok(serde_yaml::from_value(raw)?)
}

/// Dotted paths of keys present in `raw` but absent from the schema
pub fn unknown_keys(raw: &serde_yaml::Value) -> Vec<String> {
    let Ok(known) = serde_yaml::to_value(AssistantConfig::default()) else {
        return Vec::new();
    };
    let (Some(raw_map), Some(known_map)) = (raw.as_mapping(), known.as_mapping()) else {
        return Vec::new();
    };

    let mut unknown = Vec::new();
    for (section, value) in raw_map {
        let name = section.as_str().unwrap_or("?").to_string();
        match known_map.get(section) {
            None => unknown.push(name),
            Some(known_section) => {
                if let (Some(fields), Some(known_fields)) =
                    (value.as_mapping(), known_section.as_mapping())
                {
                    for (field, _) in fields {
                        if !known_fields.contains_key(field) {
                            unknown.push(format!("{}.{}", name, field.as_str().unwrap_or("?")));
                        }
                    }
                }
            }
        }
    }
    unknown
}

/// Save settings to disk
pub fn save_settings(path: &Path, settings: &AssistantConfig) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let yaml = serde_yaml::to_string(settings)?;
    fs::write(path, yaml)?;

    tracing::info!("Configuration saved to {}", path.display());
    Ok(())
}

/// Flip online mode and persist the change. Returns the new state.
pub fn toggle_online_mode(
    path: &Path,
    settings: &mut AssistantConfig,
) -> Result<bool, StorageError> {
    settings.privacy.online_mode = !settings.privacy.online_mode;
    save_settings(path, settings)?;
    Ok(settings.privacy.online_mode)
}

/// Absolute path of the conversation database
pub fn database_path(settings: &AssistantConfig, data_dir: &Path) -> PathBuf {
    let configured = crate::storage::expand_home(&settings.database.path);
    if configured.is_absolute() {
        configured
    } else {
        data_dir.join(configured)
    }
}

/// Absolute path of the temp root
pub fn temp_root(settings: &AssistantConfig, data_dir: &Path) -> PathBuf {
    match &settings.temp.root {
        Some(root) if !root.trim().is_empty() => crate::storage::expand_home(root),
        _ => data_dir.join("temp"),
    }
}

/// `settings.yaml` inside the platform config directory
pub fn default_config_path() -> Result<PathBuf, StorageError> {
    Ok(get_config_dir()?.join(SETTINGS_FILE))
}

/// Default data directory, falling back to the working directory
pub fn default_data_dir() -> PathBuf {
    get_data_dir().unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cfg").join("settings.yaml");

        let settings = load_settings(&path);
        assert_eq!(settings, {
            let mut d = AssistantConfig::default();
            d.validate();
            d
        });
        assert!(path.exists());
    }

    #[test]
    fn test_settings_persistence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");

        let mut settings = AssistantConfig::default();
        settings.models.text_model = "mistral".to_string();
        settings.privacy.auto_delete_logs_days = 7;
        save_settings(&path, &settings).unwrap();

        let loaded = load_settings_internal(&path).unwrap();
        assert_eq!(loaded.models.text_model, "mistral");
        assert_eq!(loaded.privacy.auto_delete_logs_days, 7);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "models: [unclosed").unwrap();

        let settings = load_settings(&path);
        assert_eq!(settings.models.text_model, "qwen2.5:14b");
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = parse_settings("   \n").unwrap();
        assert_eq!(settings, AssistantConfig::default());
    }

    #[test]
    fn test_unknown_keys_are_reported() {
        let raw: serde_yaml::Value =
            serde_yaml::from_str("models:\n  text_model: x\n  turbo: true\nextras:\n  a: 1\n")
                .unwrap();
        let mut unknown = unknown_keys(&raw);
        unknown.sort();
        assert_eq!(unknown, vec!["extras".to_string(), "models.turbo".to_string()]);

        // Unknown keys do not prevent loading
        let yaml = "models:\n  text_model: x\n  turbo: true\n";
        let settings = parse_settings(yaml).unwrap();
        assert_eq!(settings.models.text_model, "x");
    }

    #[test]
    fn test_toggle_online_mode_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        let mut settings = AssistantConfig::default();

        assert!(toggle_online_mode(&path, &mut settings).unwrap());
        let loaded = load_settings_internal(&path).unwrap();
        assert!(loaded.privacy.online_mode);

        assert!(!toggle_online_mode(&path, &mut settings).unwrap());
    }

    #[test]
    fn test_database_path_resolution() {
        let mut settings = AssistantConfig::default();
        let data = Path::new("/var/jarvis");
        assert_eq!(
            database_path(&settings, data),
            PathBuf::from("/var/jarvis/logs/jarvis.db")
        );

        settings.database.path = "/abs/j.db".to_string();
        assert_eq!(database_path(&settings, data), PathBuf::from("/abs/j.db"));
    }
}
