//! User profile storage
//!
//! The user profile records the user's name, standard directories, custom
//! directory aliases and interface preferences. It lives in a JSON file next
//! to the settings document.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::storage::{home_dir, StorageError};

const PROFILE_FORMAT_VERSION: &str = "1.0";

/// Words dropped before keyword matching an alias
const FILLER_WORDS: &[&str] = &["folder", "directory", "dir", "the", "my", "a", "an"];

/// Keywords that identify a standard directory
const DIRECTORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("desktop", &["desktop", "desk"]),
    ("documents", &["documents", "docs", "document"]),
    ("downloads", &["downloads", "download", "dl"]),
    (
        "pictures",
        &["pictures", "pics", "images", "photos", "picture", "image", "photo"],
    ),
    ("videos", &["videos", "movies", "video", "movie"]),
    ("music", &["music", "audio", "songs", "song"]),
    ("home", &["home", "user"]),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDirectories {
    pub home: String,
    pub desktop: String,
    pub documents: String,
    pub downloads: String,
    pub pictures: String,
    pub videos: String,
    pub music: String,
    #[serde(default)]
    pub custom_aliases: BTreeMap<String, String>,
}

impl UserDirectories {
    /// Standard directories for the current OS. XDG user-dirs and localised
    /// folder names come from `directories`; a missing entry falls back to
    /// the conventional name under the home directory.
    pub fn detect() -> Self {
        let user_dirs = directories::UserDirs::new();
        let home = user_dirs
            .as_ref()
            .map(|u| u.home_dir().to_path_buf())
            .unwrap_or_else(home_dir);
        let pick = |found: Option<&Path>, fallback: &str| {
            found
                .map(Path::to_path_buf)
                .unwrap_or_else(|| home.join(fallback))
                .display()
                .to_string()
        };
        let videos = if cfg!(target_os = "macos") { "Movies" } else { "Videos" };
        let u = user_dirs.as_ref();
        Self {
            home: home.display().to_string(),
            desktop: pick(u.and_then(|u| u.desktop_dir()), "Desktop"),
            documents: pick(u.and_then(|u| u.document_dir()), "Documents"),
            downloads: pick(u.and_then(|u| u.download_dir()), "Downloads"),
            pictures: pick(u.and_then(|u| u.picture_dir()), "Pictures"),
            videos: pick(u.and_then(|u| u.video_dir()), videos),
            music: pick(u.and_then(|u| u.audio_dir()), "Music"),
            custom_aliases: BTreeMap::new(),
        }
    }

    /// Standard directory by name
    pub fn standard(&self, name: &str) -> Option<&str> {
        match name {
            "home" => Some(&self.home),
            "desktop" => Some(&self.desktop),
            "documents" => Some(&self.documents),
            "downloads" => Some(&self.downloads),
            "pictures" => Some(&self.pictures),
            "videos" => Some(&self.videos),
            "music" => Some(&self.music),
            _ => None,
        }
    }

    fn standard_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "home" => Some(&mut self.home),
            "desktop" => Some(&mut self.desktop),
            "documents" => Some(&mut self.documents),
            "downloads" => Some(&mut self.downloads),
            "pictures" => Some(&mut self.pictures),
            "videos" => Some(&mut self.videos),
            "music" => Some(&mut self.music),
            _ => None,
        }
    }

    pub fn standard_entries(&self) -> [(&'static str, &str); 7] {
        [
            ("home", &self.home),
            ("desktop", &self.desktop),
            ("documents", &self.documents),
            ("downloads", &self.downloads),
            ("pictures", &self.pictures),
            ("videos", &self.videos),
            ("music", &self.music),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub display_name: String,
    /// casual, friendly, formal
    pub greeting_style: String,
    /// brief, medium, detailed
    pub response_length: String,
    /// 12h, 24h
    pub time_format: String,
    /// US, EU, ISO
    pub date_format: String,
    pub theme: String,
    pub font_size: String,
    pub notifications_enabled: bool,
    pub startup_notification: bool,
    pub system_tray: bool,
}

impl UserPreferences {
    pub fn for_user(username: &str) -> Self {
        Self {
            display_name: title_case(username),
            greeting_style: "friendly".to_string(),
            response_length: "medium".to_string(),
            time_format: "12h".to_string(),
            date_format: "US".to_string(),
            theme: "dark".to_string(),
            font_size: "medium".to_string(),
            notifications_enabled: true,
            startup_notification: true,
            system_tray: true,
        }
    }

    /// Apply one preference from its string form. Returns false for unknown keys.
    fn set(&mut self, key: &str, value: &str) -> Result<bool, StorageError> {
        let parse_bool = |v: &str| {
            v.parse::<bool>()
                .map_err(|_| StorageError::Invalid(format!("'{}' expects true or false", key)))
        };
        match key {
            "display_name" => self.display_name = value.to_string(),
            "greeting_style" => self.greeting_style = value.to_string(),
            "response_length" => self.response_length = value.to_string(),
            "time_format" => self.time_format = value.to_string(),
            "date_format" => self.date_format = value.to_string(),
            "theme" => self.theme = value.to_string(),
            "font_size" => self.font_size = value.to_string(),
            "notifications_enabled" => self.notifications_enabled = parse_bool(value)?,
            "startup_notification" => self.startup_notification = parse_bool(value)?,
            "system_tray" => self.system_tray = parse_bool(value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub system_username: String,
    pub directories: UserDirectories,
    pub preferences: UserPreferences,
    pub created_at: String,
    pub last_updated: String,
}

/// Export envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileExport {
    pub jarvis_profile_version: String,
    pub exported_at: String,
    pub system_info: SystemDescription,
    pub profile: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemDescription {
    pub platform: String,
    pub architecture: String,
    pub hostname: Option<String>,
    pub os_version: Option<String>,
}

impl SystemDescription {
    pub fn current() -> Self {
        Self {
            platform: std::env::consts::OS.to_string(),
            architecture: std::env::consts::ARCH.to_string(),
            hostname: sysinfo::System::host_name(),
            os_version: sysinfo::System::long_os_version(),
        }
    }
}

/// Existence report for one known directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryStatus {
    pub name: String,
    pub path: String,
    pub exists: bool,
    /// "standard" or "custom"
    pub kind: String,
}

pub fn system_username() -> String {
    std::env::var("USERNAME")
        .or_else(|_| std::env::var("USER"))
        .unwrap_or_else(|_| "user".to_string())
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

fn now_iso() -> String {
    Local::now().to_rfc3339()
}

fn is_directory(path: &str) -> bool {
    Path::new(path).is_dir()
}

/// Loads, edits and persists the user profile
pub struct ProfileManager {
    path: PathBuf,
    current: Option<UserProfile>,
}

impl ProfileManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A fresh profile with auto-detected values
    pub fn create_default(&self) -> UserProfile {
        let username = system_username();
        let now = now_iso();
        tracing::info!("Created default profile for user: {}", username);
        UserProfile {
            preferences: UserPreferences::for_user(&username),
            system_username: username,
            directories: UserDirectories::detect(),
            created_at: now.clone(),
            last_updated: now,
        }
    }

    /// Load the profile, creating and saving a default one when absent.
    /// A corrupt file yields an in-memory default and leaves the file alone.
    pub fn load(&mut self) -> &UserProfile {
        let profile = self.load_profile();
        self.current.insert(profile)
    }

    fn load_profile(&self) -> UserProfile {
        match self.read_from_disk() {
            Ok(Some(profile)) => {
                tracing::info!("Loaded profile for user: {}", profile.system_username);
                profile
            }
            Ok(None) => {
                tracing::info!("No existing profile found, creating default");
                let mut profile = self.create_default();
                if let Err(e) = self.write_to_disk(&mut profile) {
                    tracing::error!("Error saving profile: {}", e);
                }
                profile
            }
            Err(e) => {
                tracing::error!("Error loading profile: {}", e);
                self.create_default()
            }
        }
    }

    fn read_from_disk(&self) -> Result<Option<UserProfile>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn write_to_disk(&self, profile: &mut UserProfile) -> Result<(), StorageError> {
        profile.last_updated = now_iso();
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(profile)?)?;
        Ok(())
    }

    /// Persist `profile` and make it current
    pub fn save(&mut self, mut profile: UserProfile) -> Result<(), StorageError> {
        self.write_to_disk(&mut profile)?;
        tracing::info!("Saved profile for user: {}", profile.system_username);
        self.current = Some(profile);
        Ok(())
    }

    /// The current profile, loading it on first use
    pub fn current(&mut self) -> &UserProfile {
        let profile = match self.current.take() {
            Some(profile) => profile,
            None => self.load_profile(),
        };
        self.current.insert(profile)
    }

    fn current_owned(&mut self) -> UserProfile {
        self.current().clone()
    }

    /// Update standard directories; unknown names become custom aliases
    pub fn update_directories<'a>(
        &mut self,
        updates: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<(), StorageError> {
        let mut profile = self.current_owned();
        for (key, value) in updates {
            match profile.directories.standard_mut(key) {
                Some(slot) => *slot = value.to_string(),
                None => {
                    profile
                        .directories
                        .custom_aliases
                        .insert(key.to_string(), value.to_string());
                }
            }
        }
        self.save(profile)
    }

    /// Update preferences from string key/value pairs; unknown keys are ignored
    pub fn update_preferences<'a>(
        &mut self,
        updates: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<(), StorageError> {
        let mut profile = self.current_owned();
        for (key, value) in updates {
            if !profile.preferences.set(key, value)? {
                tracing::warn!("Unknown preference: {}", key);
            }
        }
        self.save(profile)
    }

    /// Add an alias for an existing directory
    pub fn add_custom_directory(&mut self, alias: &str, path: &str) -> Result<(), StorageError> {
        let expanded = crate::storage::expand_home(path);
        if !expanded.is_dir() {
            tracing::warn!("Directory does not exist: {}", path);
            return Err(StorageError::Invalid(format!(
                "Directory does not exist: {}",
                path
            )));
        }
        let mut profile = self.current_owned();
        profile
            .directories
            .custom_aliases
            .insert(alias.to_string(), expanded.display().to_string());
        self.save(profile)
    }

    /// Remove an alias. Returns false when it did not exist.
    pub fn remove_custom_directory(&mut self, alias: &str) -> Result<bool, StorageError> {
        let mut profile = self.current_owned();
        if profile.directories.custom_aliases.remove(alias).is_none() {
            return Ok(false);
        }
        self.save(profile)?;
        Ok(true)
    }

    /// Resolve a spoken directory reference ("my docs folder") to a path
    pub fn resolve_alias(&mut self, alias: &str) -> Option<String> {
        resolve_alias_in(&self.current().directories, alias)
    }

    /// Existence report for standard and custom directories
    pub fn directory_info(&mut self) -> Vec<DirectoryStatus> {
        let dirs = &self.current().directories;
        let mut out: Vec<DirectoryStatus> = dirs
            .standard_entries()
            .iter()
            .map(|(name, path)| DirectoryStatus {
                name: name.to_string(),
                path: path.to_string(),
                exists: is_directory(path),
                kind: "standard".to_string(),
            })
            .collect();
        out.extend(dirs.custom_aliases.iter().map(|(name, path)| DirectoryStatus {
            name: name.clone(),
            path: path.clone(),
            exists: is_directory(path),
            kind: "custom".to_string(),
        }));
        out
    }

    /// Write the profile, wrapped with version and system information
    pub fn export(&mut self, export_path: &Path) -> Result<(), StorageError> {
        let export = ProfileExport {
            jarvis_profile_version: PROFILE_FORMAT_VERSION.to_string(),
            exported_at: now_iso(),
            system_info: SystemDescription::current(),
            profile: self.current_owned(),
        };
        if let Some(parent) = export_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(export_path, serde_json::to_string_pretty(&export)?)?;
        tracing::info!("Exported profile to: {}", export_path.display());
        Ok(())
    }

    /// Replace the current profile with an exported one
    pub fn import(&mut self, import_path: &Path) -> Result<(), StorageError> {
        let json = fs::read_to_string(import_path)?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        let profile_value = value
            .get("profile")
            .cloned()
            .ok_or_else(|| StorageError::Invalid("Invalid profile file format".to_string()))?;
        let profile: UserProfile = serde_json::from_value(profile_value)?;
        self.save(profile)?;
        tracing::info!("Imported profile from: {}", import_path.display());
        Ok(())
    }
}

/// Alias resolution over a directory set.
///
/// Order: exact standard name, exact custom alias, keyword match after
/// dropping filler words, partial custom alias match.
pub fn resolve_alias_in(dirs: &UserDirectories, alias: &str) -> Option<String> {
    if let Some(path) = resolve_exact_alias(dirs, alias) {
        return Some(path);
    }
    let clean = alias.trim().to_lowercase();
    if clean.is_empty() {
        return None;
    }
    let words = significant_words(&clean);

    // Whole-word keyword hits first, so "music" never resolves through "us"
    for (dir_name, keywords) in DIRECTORY_KEYWORDS {
        if words.iter().any(|w| keywords.contains(w)) {
            tracing::info!("Resolved '{}' to '{}' directory", alias, dir_name);
            return dirs.standard(dir_name).map(str::to_string);
        }
    }

    for (dir_name, keywords) in DIRECTORY_KEYWORDS {
        let hit = keywords.iter().any(|k| {
            words
                .iter()
                .any(|w| (w.len() >= 3 && k.contains(w)) || (k.len() >= 3 && w.contains(k)))
        });
        if hit {
            tracing::info!("Resolved '{}' to '{}' directory", alias, dir_name);
            return dirs.standard(dir_name).map(str::to_string);
        }
    }

    for (name, path) in &dirs.custom_aliases {
        let name_lower = name.to_lowercase();
        if name_lower.contains(&clean)
            || clean.contains(&name_lower)
            || words.iter().any(|w| name_lower.contains(w))
        {
            tracing::info!("Resolved '{}' to custom alias '{}'", alias, name);
            return Some(path.clone());
        }
    }

    tracing::debug!("Could not resolve directory alias: '{}'", alias);
    None
}

fn significant_words(clean: &str) -> Vec<&str> {
    clean
        .split_whitespace()
        .filter(|w| !FILLER_WORDS.contains(w))
        .collect()
}

/// Resolve only names that denote a directory outright: a standard
/// directory, a custom alias, or a single directory keyword such as
/// "docs". Anything else, a file name in particular, gives `None`.
pub fn resolve_exact_alias(dirs: &UserDirectories, alias: &str) -> Option<String> {
    let clean = alias.trim().to_lowercase();
    if clean.is_empty() {
        return None;
    }

    if let Some(path) = dirs.standard(&clean) {
        return Some(path.to_string());
    }

    if let Some(path) = dirs.custom_aliases.get(alias.trim()) {
        return Some(path.clone());
    }
    if let Some((_, path)) = dirs
        .custom_aliases
        .iter()
        .find(|(name, _)| name.to_lowercase() == clean)
    {
        return Some(path.clone());
    }

    let [word] = significant_words(&clean)[..] else {
        return None;
    };
    DIRECTORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.contains(&word))
        .and_then(|(dir_name, _)| dirs.standard(dir_name))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dirs() -> UserDirectories {
        let mut custom = BTreeMap::new();
        custom.insert("projects".to_string(), "/work/projects".to_string());
        UserDirectories {
            home: "/home/u".to_string(),
            desktop: "/home/u/Desktop".to_string(),
            documents: "/home/u/Documents".to_string(),
            downloads: "/home/u/Downloads".to_string(),
            pictures: "/home/u/Pictures".to_string(),
            videos: "/home/u/Videos".to_string(),
            music: "/home/u/Music".to_string(),
            custom_aliases: custom,
        }
    }

    #[test]
    fn test_resolve_standard_names() {
        let d = dirs();
        assert_eq!(resolve_alias_in(&d, "Desktop").as_deref(), Some("/home/u/Desktop"));
        assert_eq!(resolve_alias_in(&d, "home").as_deref(), Some("/home/u"));
    }

    #[test]
    fn test_resolve_with_filler_words_and_synonyms() {
        let d = dirs();
        assert_eq!(
            resolve_alias_in(&d, "my docs folder").as_deref(),
            Some("/home/u/Documents")
        );
        assert_eq!(
            resolve_alias_in(&d, "the photos directory").as_deref(),
            Some("/home/u/Pictures")
        );
        assert_eq!(resolve_alias_in(&d, "movies").as_deref(), Some("/home/u/Videos"));
    }

    #[test]
    fn test_resolve_custom_alias() {
        let d = dirs();
        assert_eq!(resolve_alias_in(&d, "projects").as_deref(), Some("/work/projects"));
        assert_eq!(
            resolve_alias_in(&d, "my projects folder").as_deref(),
            Some("/work/projects")
        );
    }

    #[test]
    fn test_unresolvable_alias() {
        let d = dirs();
        assert_eq!(resolve_alias_in(&d, "/tmp/something"), None);
        assert_eq!(resolve_alias_in(&d, ""), None);
    }

    #[test]
    fn test_exact_alias_ignores_file_names() {
        let d = dirs();
        assert_eq!(resolve_exact_alias(&d, "pics").as_deref(), Some("/home/u/Pictures"));
        assert_eq!(
            resolve_exact_alias(&d, "my music folder").as_deref(),
            Some("/home/u/Music")
        );
        assert_eq!(resolve_exact_alias(&d, "Projects").as_deref(), Some("/work/projects"));
        assert_eq!(resolve_exact_alias(&d, "photo_old.jpg"), None);
        assert_eq!(resolve_exact_alias(&d, "homework_final.txt"), None);
        assert_eq!(resolve_exact_alias(&d, "music notes"), None);
        assert_eq!(resolve_alias_in(&d, "photo_old.jpg").as_deref(), Some("/home/u/Pictures"));
    }

    #[test]
    fn test_detect_follows_platform_user_dirs() {
        let detected = UserDirectories::detect();
        let Some(user_dirs) = directories::UserDirs::new() else {
            return;
        };
        assert_eq!(detected.home, user_dirs.home_dir().display().to_string());
        let expected = |found: Option<&Path>, fallback: &str| {
            found
                .map(Path::to_path_buf)
                .unwrap_or_else(|| user_dirs.home_dir().join(fallback))
                .display()
                .to_string()
        };
        assert_eq!(detected.documents, expected(user_dirs.document_dir(), "Documents"));
        assert_eq!(detected.downloads, expected(user_dirs.download_dir(), "Downloads"));
        assert_eq!(detected.music, expected(user_dirs.audio_dir(), "Music"));
    }

    #[test]
    fn test_load_creates_profile_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("user_profile.json");
        let mut manager = ProfileManager::new(&path);

        let profile = manager.load().clone();
        assert!(path.exists());
        assert_eq!(profile.system_username, system_username());

        let mut reloaded = ProfileManager::new(&path);
        assert_eq!(reloaded.load().system_username, profile.system_username);
    }

    #[test]
    fn test_update_directories_adds_unknown_as_alias() {
        let dir = TempDir::new().unwrap();
        let mut manager = ProfileManager::new(dir.path().join("p.json"));
        manager
            .update_directories([("desktop", "/elsewhere/Desk"), ("code", "/src")])
            .unwrap();

        let profile = manager.current().clone();
        assert_eq!(profile.directories.desktop, "/elsewhere/Desk");
        assert_eq!(
            profile.directories.custom_aliases.get("code").map(String::as_str),
            Some("/src")
        );
    }

    #[test]
    fn test_update_preferences() {
        let dir = TempDir::new().unwrap();
        let mut manager = ProfileManager::new(dir.path().join("p.json"));
        manager
            .update_preferences([("theme", "light"), ("system_tray", "false"), ("bogus", "1")])
            .unwrap();
        let prefs = manager.current().preferences.clone();
        assert_eq!(prefs.theme, "light");
        assert!(!prefs.system_tray);

        assert!(manager.update_preferences([("system_tray", "maybe")]).is_err());
    }

    #[test]
    fn test_custom_directory_lifecycle() {
        let dir = TempDir::new().unwrap();
        let mut manager = ProfileManager::new(dir.path().join("p.json"));
        let target = dir.path().join("stuff");
        fs::create_dir(&target).unwrap();

        assert!(manager
            .add_custom_directory("missing", "/definitely/not/here")
            .is_err());
        manager
            .add_custom_directory("stuff", target.to_str().unwrap())
            .unwrap();
        assert_eq!(
            manager.resolve_alias("stuff"),
            Some(target.display().to_string())
        );

        let info = manager.directory_info();
        let entry = info.iter().find(|d| d.name == "stuff").unwrap();
        assert!(entry.exists);
        assert_eq!(entry.kind, "custom");

        assert!(manager.remove_custom_directory("stuff").unwrap());
        assert!(!manager.remove_custom_directory("stuff").unwrap());
    }

    #[test]
    fn test_export_import_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut manager = ProfileManager::new(dir.path().join("p.json"));
        manager.update_preferences([("display_name", "Ada")]).unwrap();
        let export_path = dir.path().join("export").join("profile.json");
        manager.export(&export_path).unwrap();

        let exported: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&export_path).unwrap()).unwrap();
        assert_eq!(exported["jarvis_profile_version"], "1.0");

        let mut other = ProfileManager::new(dir.path().join("other.json"));
        other.import(&export_path).unwrap();
        assert_eq!(other.current().preferences.display_name, "Ada");
    }

    #[test]
    fn test_import_rejects_bad_format() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{\"not_profile\": 1}").unwrap();
        let mut manager = ProfileManager::new(dir.path().join("p.json"));
        assert!(manager.import(&bad).is_err());
    }
}
