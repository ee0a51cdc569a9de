//! Safety checks for actions.
//!
//! Path validation against restricted system locations, confirmation rules
//! for destructive operations, and the permission level of each action.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::agent::tools::ToolError;
use crate::storage::expand_home;
use crate::types::config::FileManagementSection;

/// Permission level of an action.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum PermissionLevel {
    /// Only reads files or system information
    ReadOnly,
    /// Creates, moves or deletes files
    WriteFile,
    /// Starts programs or drives other applications
    Execute,
    /// Talks to the network
    Network,
}

impl std::fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionLevel::ReadOnly => write!(f, "read"),
            PermissionLevel::WriteFile => write!(f, "write"),
            PermissionLevel::Execute => write!(f, "exec"),
            PermissionLevel::Network => write!(f, "net"),
        }
    }
}

impl PermissionLevel {
    /// Human-readable label for listings
    pub fn label(&self) -> &'static str {
        match self {
            PermissionLevel::ReadOnly => "Read only",
            PermissionLevel::WriteFile => "Writes files",
            PermissionLevel::Execute => "Runs programs",
            PermissionLevel::Network => "Network",
        }
    }
}

/// Permission level of an action by name
pub fn action_permission_level(action: &str) -> PermissionLevel {
    match action {
        "list_files" | "analyze_file" | "search_files" | "operation_history"
        | "system_info" | "temp_info" => PermissionLevel::ReadOnly,
        "copy_file" | "move_file" | "delete_file" | "cleanup_temp" | "screenshot" => {
            PermissionLevel::WriteFile
        }
        "open_application" | "focus_window" | "switch_window" | "media_control" => {
            PermissionLevel::Execute
        }
        "open_website" => PermissionLevel::Network,
        // Screenshot analysis writes a capture and calls the local model
        "analyze_screenshot" => PermissionLevel::WriteFile,
        _ => PermissionLevel::ReadOnly,
    }
}

/// Operations that change or remove user data
const DANGEROUS_OPERATIONS: &[&str] = &["delete", "move", "copy"];

#[derive(Debug, Clone)]
pub struct SafetyManager {
    restricted: Vec<String>,
    confirm_deletes: bool,
}

/// Compare paths with forward slashes and, on Windows, without case
fn normalize(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let unified = unified.trim_end_matches('/').to_string();
    if cfg!(windows) {
        unified.to_lowercase()
    } else {
        unified
    }
}

/// Strip the `\\?\` prefix Windows canonicalisation adds
fn display_path(path: &Path) -> String {
    let s = path.display().to_string();
    s.strip_prefix(r"\\?\").map(str::to_string).unwrap_or(s)
}

impl SafetyManager {
    pub fn new(restricted_paths: Vec<String>, confirm_dangerous_actions: bool) -> Self {
        Self {
            restricted: restricted_paths.iter().map(|p| normalize(p)).collect(),
            confirm_deletes: confirm_dangerous_actions,
        }
    }

    pub fn from_config(files: &FileManagementSection, confirm_dangerous_actions: bool) -> Self {
        Self::new(files.restricted_paths.clone(), confirm_dangerous_actions)
    }

    /// The restricted prefix containing `path`, if any
    pub fn restricted_prefix(&self, path: &Path) -> Option<&str> {
        let candidate = normalize(&display_path(path));
        self.restricted
            .iter()
            .find(|prefix| {
                candidate == **prefix
                    || candidate
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .map(String::as_str)
    }

    /// Resolve an existing path that is safe to operate on
    pub fn validate_path(&self, raw: &str) -> Result<PathBuf, ToolError> {
        let expanded = expand_home(raw);
        let resolved = std::fs::canonicalize(&expanded)
            .map_err(|_| ToolError::NotFound(format!("Path does not exist: {}", raw)))?;

        if let Some(prefix) = self.restricted_prefix(&resolved) {
            tracing::warn!("Blocked access to restricted path: {}", resolved.display());
            return Err(ToolError::PermissionDenied(format!(
                "Path is in restricted directory: {}",
                prefix
            )));
        }
        Ok(PathBuf::from(display_path(&resolved)))
    }

    /// Resolve a destination that may not exist yet.
    ///
    /// Components are applied one at a time: existing prefixes are
    /// canonicalised, `..` pops the resolved parent and `.` is dropped.
    pub fn validate_destination(&self, raw: &str) -> Result<PathBuf, ToolError> {
        let expanded = expand_home(raw);
        let absolute = if expanded.is_absolute() {
            expanded
        } else {
            std::env::current_dir()
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?
                .join(expanded)
        };

        let resolved = resolve_components(&absolute);
        if let Some(prefix) = self.restricted_prefix(&resolved) {
            tracing::warn!("Blocked write to restricted path: {}", resolved.display());
            return Err(ToolError::PermissionDenied(format!(
                "Path is in restricted directory: {}",
                prefix
            )));
        }
        Ok(PathBuf::from(display_path(&resolved)))
    }

    /// Whether `operation` changes or removes user data
    pub fn is_dangerous(&self, operation: &str) -> bool {
        DANGEROUS_OPERATIONS.contains(&operation.to_lowercase().as_str())
    }

    /// Whether `operation` must wait for an explicit confirmation
    pub fn requires_confirmation(&self, operation: &str) -> bool {
        self.confirm_deletes && operation.eq_ignore_ascii_case("delete")
    }
}

fn resolve_components(path: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            part => {
                resolved.push(part);
                if resolved.exists() {
                    if let Ok(real) = std::fs::canonicalize(&resolved) {
                        resolved = real;
                    }
                }
            }
        }
    }
    resolved
}

impl Default for SafetyManager {
    fn default() -> Self {
        Self::new(crate::types::config::default_restricted_paths(), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_restricted_prefix_matches_whole_components() {
        let safety = SafetyManager::new(vec!["/etc".to_string(), "/usr".to_string()], true);
        assert_eq!(safety.restricted_prefix(Path::new("/etc/passwd")), Some("/etc"));
        assert_eq!(safety.restricted_prefix(Path::new("/etc")), Some("/etc"));
        assert_eq!(safety.restricted_prefix(Path::new("/etcetera/file")), None);
        assert_eq!(safety.restricted_prefix(Path::new("/home/u/usr")), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_parent_components_cannot_escape_into_restricted() {
        let safety = SafetyManager::new(vec!["/usr".to_string()], true);
        assert!(matches!(
            safety.validate_destination("/nonexistent_jarvis_dir/../usr/lib/evil.so"),
            Err(ToolError::PermissionDenied(_))
        ));
        assert!(matches!(
            safety.validate_destination("/nonexistent_a/./nonexistent_b/../../usr/evil.so"),
            Err(ToolError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_destination_parent_components_are_resolved() {
        let dir = TempDir::new().unwrap();
        let root = std::fs::canonicalize(dir.path()).unwrap();
        std::fs::create_dir(root.join("docs")).unwrap();

        let safety = SafetyManager::new(vec![display_path(&root.join("docs"))], true);
        let sneaky = root.join("new").join("..").join("docs").join("x.txt");
        assert!(matches!(
            safety.validate_destination(sneaky.to_str().unwrap()),
            Err(ToolError::PermissionDenied(_))
        ));

        let fine = root.join("docs").join("..").join("out").join("x.txt");
        let resolved = safety.validate_destination(fine.to_str().unwrap()).unwrap();
        assert!(resolved.ends_with(Path::new("out").join("x.txt")));
        assert!(!resolved.components().any(|c| c == Component::ParentDir));
    }

    #[test]
    fn test_validate_existing_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "x").unwrap();

        let safety = SafetyManager::new(Vec::new(), true);
        let resolved = safety.validate_path(file.to_str().unwrap()).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("a.txt"));

        let missing = dir.path().join("missing.txt");
        assert!(matches!(
            safety.validate_path(missing.to_str().unwrap()),
            Err(ToolError::NotFound(_))
        ));
    }

    #[test]
    fn test_restricted_paths_are_rejected() {
        let dir = TempDir::new().unwrap();
        let root = std::fs::canonicalize(dir.path()).unwrap();
        let safety = SafetyManager::new(vec![root.display().to_string()], true);

        assert!(matches!(
            safety.validate_path(root.to_str().unwrap()),
            Err(ToolError::PermissionDenied(_))
        ));
        let new_file = root.join("sub").join("new.txt");
        assert!(matches!(
            safety.validate_destination(new_file.to_str().unwrap()),
            Err(ToolError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_validate_destination_allows_new_paths() {
        let dir = TempDir::new().unwrap();
        let safety = SafetyManager::new(Vec::new(), true);
        let target = dir.path().join("new_dir").join("file.txt");
        let resolved = safety.validate_destination(target.to_str().unwrap()).unwrap();
        assert!(resolved.ends_with("new_dir/file.txt"));
    }

    #[test]
    fn test_confirmation_rules() {
        let strict = SafetyManager::new(Vec::new(), true);
        assert!(strict.requires_confirmation("delete"));
        assert!(!strict.requires_confirmation("move"));
        assert!(strict.is_dangerous("Move"));
        assert!(strict.is_dangerous("copy"));
        assert!(!strict.is_dangerous("list"));

        let relaxed = SafetyManager::new(Vec::new(), false);
        assert!(!relaxed.requires_confirmation("delete"));
    }

    #[test]
    fn test_permission_levels() {
        assert_eq!(action_permission_level("list_files"), PermissionLevel::ReadOnly);
        assert_eq!(action_permission_level("delete_file"), PermissionLevel::WriteFile);
        assert_eq!(action_permission_level("open_application"), PermissionLevel::Execute);
        assert_eq!(action_permission_level("media_control"), PermissionLevel::Execute);
        assert_eq!(action_permission_level("switch_window"), PermissionLevel::Execute);
        assert_eq!(action_permission_level("open_website").to_string(), "net");
    }
}
