//! File tools - List, Copy, Move, Delete, Analyze, Search, History
//!
//! Every path goes through the [`SafetyManager`] first. Destructive
//! operations keep a backup in the temp folder and are recorded in the
//! operation history.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use crate::agent::safety::SafetyManager;
use crate::agent::tools::{Tool, ToolError, ToolResult};
use crate::storage::temp::TempFileManager;
use crate::system::format_size;
use crate::types::config::FileManagementSection;

/// Extensions treated as text for previews and content search
pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "py", "js", "html", "css", "json", "yaml", "yml", "md",
];

/// Characters kept in an analysis preview
const PREVIEW_CHARS: usize = 2000;

/// Larger files are matched by name only, whatever `max_file_size_mb` says
const MAX_CONTENT_SEARCH_BYTES: u64 = 5 * 1024 * 1024;

const HISTORY_CAPACITY: usize = 500;

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| TEXT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn iso_time(time: std::io::Result<SystemTime>) -> Option<String> {
    time.ok()
        .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%dT%H:%M:%S").to_string())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    params[key]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::InvalidParameters(format!("{} is required", key)))
}

/// Copy a file or a whole directory tree
fn copy_recursive(source: &Path, destination: &Path) -> std::io::Result<()> {
    if source.is_dir() {
        fs::create_dir_all(destination)?;
        for entry in fs::read_dir(source)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &destination.join(entry.file_name()))?;
        }
        Ok(())
    } else {
        fs::copy(source, destination).map(|_| ())
    }
}

fn remove_recursive(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// `dest` itself, or `dest/<source name>` when `dest` is an existing directory
fn effective_destination(source: &Path, dest: PathBuf) -> PathBuf {
    match source.file_name() {
        Some(name) if dest.is_dir() => dest.join(name),
        _ => dest,
    }
}

/// `<path>.backup` next to the original
fn sibling_backup(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".backup");
    PathBuf::from(name)
}

/// One entry of a directory listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub size_human: String,
    pub modified: Option<String>,
    pub created: Option<String>,
    pub extension: Option<String>,
}

impl FileEntry {
    fn from_path(path: &Path, meta: &fs::Metadata) -> Self {
        let extension = if meta.is_file() {
            path.extension()
                .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        } else {
            None
        };
        Self {
            name: file_name(path),
            path: path.display().to_string(),
            size: meta.len(),
            size_human: format_size(meta.len()),
            modified: iso_time(meta.modified()),
            created: iso_time(meta.created().or_else(|_| meta.modified())),
            extension,
        }
    }
}

/// A copy, move or delete that was carried out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,
    pub timestamp: String,
}

impl OperationRecord {
    fn new(action: &str) -> Self {
        Self {
            action: action.to_string(),
            source: None,
            destination: None,
            backup: None,
            timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

/// State shared by the file tools
pub struct FileOperations {
    safety: SafetyManager,
    temp: Arc<TempFileManager>,
    history: Mutex<Vec<OperationRecord>>,
    backup_before_operations: bool,
    max_content_bytes: u64,
}

impl FileOperations {
    pub fn new(safety: SafetyManager, temp: Arc<TempFileManager>) -> Self {
        Self {
            safety,
            temp,
            history: Mutex::new(Vec::new()),
            backup_before_operations: true,
            max_content_bytes: MAX_CONTENT_SEARCH_BYTES,
        }
    }

    /// Apply the `file_management` settings that affect file tools
    pub fn configure(mut self, section: &FileManagementSection) -> Self {
        self.backup_before_operations = section.backup_before_operations;
        self.max_content_bytes = section
            .max_file_size_mb
            .saturating_mul(1024 * 1024)
            .min(MAX_CONTENT_SEARCH_BYTES);
        self
    }

    pub fn safety(&self) -> &SafetyManager {
        &self.safety
    }

    fn record(&self, record: OperationRecord) {
        tracing::info!("File operation: {} {:?}", record.action, record.source);
        if let Ok(mut history) = self.history.lock() {
            history.push(record);
            let overflow = history.len().saturating_sub(HISTORY_CAPACITY);
            history.drain(..overflow);
        }
    }

    /// The last `limit` operations, oldest first
    pub fn recent_operations(&self, limit: usize) -> Vec<OperationRecord> {
        match self.history.lock() {
            Ok(history) => {
                let start = history.len().saturating_sub(limit);
                history[start..].to_vec()
            }
            Err(_) => Vec::new(),
        }
    }

    /// Refuse to replace directories; keep a sibling backup of a file
    /// that is about to be overwritten.
    fn prepare_target(&self, source: &Path, dest: &Path) -> Result<Option<String>, ToolError> {
        if dest.is_dir() {
            return Err(ToolError::InvalidParameters(format!(
                "Destination already exists: {}",
                dest.display()
            )));
        }
        if !dest.is_file() {
            return Ok(None);
        }
        if source.is_dir() {
            return Err(ToolError::InvalidParameters(format!(
                "Cannot replace file {} with a directory",
                dest.display()
            )));
        }
        if !self.backup_before_operations {
            return Ok(None);
        }
        let backup_path = sibling_backup(dest);
        fs::copy(dest, &backup_path)?;
        tracing::info!("Created backup: {}", backup_path.display());
        Ok(Some(backup_path.display().to_string()))
    }

    pub fn list_files(&self, directory: &str, pattern: &str, recursive: bool) -> Result<ToolResult, ToolError> {
        let dir = self.safety.validate_path(directory)?;
        if !dir.is_dir() {
            return Err(ToolError::InvalidParameters(format!("Not a directory: {}", directory)));
        }

        let base = glob::Pattern::escape(&dir.display().to_string());
        let full_pattern = if recursive {
            format!("{}/**/{}", base, pattern)
        } else {
            format!("{}/{}", base, pattern)
        };
        let paths = glob::glob(&full_pattern)
            .map_err(|e| ToolError::InvalidParameters(format!("Invalid pattern {}: {}", pattern, e)))?;

        let mut files = Vec::new();
        let mut dirs = Vec::new();
        let mut total_size = 0u64;
        // Unreadable entries are skipped
        for path in paths.flatten() {
            let Ok(meta) = fs::metadata(&path) else {
                continue;
            };
            if meta.is_file() {
                total_size += meta.len();
                files.push(FileEntry::from_path(&path, &meta));
            } else if meta.is_dir() {
                dirs.push(FileEntry::from_path(&path, &meta));
            }
        }
        files.sort_by_key(|f| f.name.to_lowercase());
        dirs.sort_by_key(|d| d.name.to_lowercase());

        Ok(ToolResult {
            success: true,
            message: format!(
                "{} files and {} directories in {}",
                files.len(),
                dirs.len(),
                dir.display()
            ),
            data: json!({
                "directory": dir.display().to_string(),
                "total_files": files.len(),
                "total_directories": dirs.len(),
                "total_size": total_size,
                "total_size_human": format_size(total_size),
                "recursive": recursive,
                "files": files,
                "directories": dirs,
            }),
        })
    }

    pub fn copy(&self, source: &str, destination: &str) -> Result<ToolResult, ToolError> {
        let source_path = self
            .safety
            .validate_path(source)
            .map_err(|e| prefix_error("Source", e))?;
        let dest = effective_destination(&source_path, self.safety.validate_destination(destination)?);
        if dest.starts_with(&source_path) && source_path.is_dir() {
            return Err(ToolError::InvalidParameters(
                "Cannot copy a directory into itself".into(),
            ));
        }
        if dest == source_path {
            return Err(ToolError::InvalidParameters(
                "Source and destination are the same".into(),
            ));
        }

        let backup = self.prepare_target(&source_path, &dest)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        copy_recursive(&source_path, &dest)?;

        let is_dir = source_path.is_dir();
        let (action, size) = if is_dir {
            ("copied directory", json!("directory"))
        } else {
            ("copied file", json!(fs::metadata(&dest)?.len()))
        };
        let mut record = OperationRecord::new("copy");
        record.source = Some(source_path.display().to_string());
        record.destination = Some(dest.display().to_string());
        record.backup = backup.clone();
        self.record(record);

        Ok(ToolResult {
            success: true,
            message: format!("Copied {} to {}", source_path.display(), dest.display()),
            data: json!({
                "source": source_path.display().to_string(),
                "destination": dest.display().to_string(),
                "action": action,
                "size": size,
                "backup": backup,
            }),
        })
    }

    pub fn move_to(&self, source: &str, destination: &str) -> Result<ToolResult, ToolError> {
        let source_path = self
            .safety
            .validate_path(source)
            .map_err(|e| prefix_error("Source", e))?;
        let dest = effective_destination(&source_path, self.safety.validate_destination(destination)?);
        if dest == source_path {
            return Err(ToolError::InvalidParameters(
                "Source and destination are the same".into(),
            ));
        }
        if dest.starts_with(&source_path) && source_path.is_dir() {
            return Err(ToolError::InvalidParameters(
                "Cannot move a directory into itself".into(),
            ));
        }

        let backup = self.prepare_target(&source_path, &dest)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        if fs::rename(&source_path, &dest).is_err() {
            // Different filesystems
            copy_recursive(&source_path, &dest)?;
            remove_recursive(&source_path)?;
        }

        let mut record = OperationRecord::new("move");
        record.source = Some(source_path.display().to_string());
        record.destination = Some(dest.display().to_string());
        record.backup = backup.clone();
        self.record(record);

        Ok(ToolResult {
            success: true,
            message: format!("Moved {} to {}", source_path.display(), dest.display()),
            data: json!({
                "source": source_path.display().to_string(),
                "destination": dest.display().to_string(),
                "action": "moved",
                "backup": backup,
            }),
        })
    }

    pub fn delete(&self, target: &str, confirm: bool) -> Result<ToolResult, ToolError> {
        let path = self.safety.validate_path(target)?;

        if !confirm && self.safety.requires_confirmation("delete") {
            return Ok(ToolResult {
                success: true,
                message: format!("Deleting {} requires confirmation", path.display()),
                data: json!({
                    "requires_confirmation": true,
                    "path": path.display().to_string(),
                }),
            });
        }

        let backup_path = self.temp.backup_path(&file_name(&path));
        if let Some(parent) = backup_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let action = if path.is_dir() { "deleted directory" } else { "deleted file" };
        copy_recursive(&path, &backup_path)?;
        remove_recursive(&path)?;

        let mut record = OperationRecord::new("delete");
        record.source = Some(path.display().to_string());
        record.backup = Some(backup_path.display().to_string());
        self.record(record);

        Ok(ToolResult {
            success: true,
            message: format!("Deleted {}", path.display()),
            data: json!({
                "path": path.display().to_string(),
                "action": action,
                "backup_location": backup_path.display().to_string(),
            }),
        })
    }

    pub fn analyze(&self, target: &str) -> Result<ToolResult, ToolError> {
        let path = self.safety.validate_path(target)?;
        let meta = fs::metadata(&path)?;
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();

        let mut data = json!({
            "path": path.display().to_string(),
            "name": file_name(&path),
            "size": meta.len(),
            "size_human": format_size(meta.len()),
            "created": iso_time(meta.created().or_else(|_| meta.modified())),
            "modified": iso_time(meta.modified()),
            "extension": extension,
            "is_file": meta.is_file(),
            "is_directory": meta.is_dir(),
            "permissions": permissions(&meta),
        });

        if meta.is_file() && is_text_file(&path) {
            match read_preview(&path) {
                Ok(preview) => {
                    data["line_count"] = json!(preview.split('\n').count());
                    data["content_preview"] = json!(preview);
                    data["encoding"] = json!("utf-8");
                    data["file_type"] = json!("text");
                }
                Err(e) => {
                    data["content_preview"] = json!(format!("Could not read file content: {}", e));
                }
            }
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let analysis_path = self.temp.analysis_path(&stem);
        fs::write(&analysis_path, serde_json::to_string_pretty(&data).unwrap_or_default())?;
        data["analysis_saved"] = json!(analysis_path.display().to_string());

        Ok(ToolResult {
            success: true,
            message: format!("Analyzed {}", path.display()),
            data,
        })
    }

    pub fn search(&self, directory: &str, query: &str, file_type: Option<&str>) -> Result<ToolResult, ToolError> {
        let dir = self.safety.validate_path(directory)?;
        let needle = query.to_lowercase();
        let pattern = match file_type {
            Some(ext) => format!("*.{}", glob::Pattern::escape(ext.trim_start_matches('.'))),
            None => "*".to_string(),
        };
        let full_pattern = format!("{}/**/{}", glob::Pattern::escape(&dir.display().to_string()), pattern);
        let paths = glob::glob(&full_pattern)
            .map_err(|e| ToolError::InvalidParameters(format!("Invalid file type: {}", e)))?;

        let mut matches = Vec::new();
        for path in paths.flatten() {
            let Ok(meta) = fs::metadata(&path) else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let name = file_name(&path);
            let match_type = if name.to_lowercase().contains(&needle) {
                "filename"
            } else if is_text_file(&path)
                && meta.len() <= self.max_content_bytes
                && fs::read_to_string(&path)
                    .map(|content| content.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            {
                "content"
            } else {
                continue;
            };
            matches.push(json!({
                "path": path.display().to_string(),
                "name": name,
                "size": meta.len(),
                "match_type": match_type,
            }));
        }

        Ok(ToolResult {
            success: true,
            message: format!("{} matches for '{}' in {}", matches.len(), query, dir.display()),
            data: json!({
                "query": query,
                "directory": dir.display().to_string(),
                "total_matches": matches.len(),
                "matches": matches,
            }),
        })
    }
}

fn prefix_error(what: &str, e: ToolError) -> ToolError {
    match e {
        ToolError::NotFound(msg) => ToolError::NotFound(format!("{}: {}", what, msg)),
        ToolError::PermissionDenied(msg) => ToolError::PermissionDenied(format!("{}: {}", what, msg)),
        other => other,
    }
}

#[cfg(unix)]
fn permissions(meta: &fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:03o}", meta.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permissions(meta: &fs::Metadata) -> String {
    if meta.permissions().readonly() {
        "read-only".to_string()
    } else {
        "read-write".to_string()
    }
}

/// First [`PREVIEW_CHARS`] characters of a text file
fn read_preview(path: &Path) -> std::io::Result<String> {
    let mut bytes = Vec::new();
    fs::File::open(path)?
        .take((PREVIEW_CHARS * 4) as u64)
        .read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).chars().take(PREVIEW_CHARS).collect())
}

/// Run a blocking file operation off the async runtime
async fn blocking<F>(ops: &Arc<FileOperations>, f: F) -> Result<ToolResult, ToolError>
where
    F: FnOnce(&FileOperations) -> Result<ToolResult, ToolError> + Send + 'static,
{
    let ops = ops.clone();
    tokio::task::spawn_blocking(move || f(&ops))
        .await
        .map_err(|e| ToolError::ExecutionFailed(format!("file task failed: {}", e)))?
}

/// All file tools sharing one [`FileOperations`]
pub fn file_tools(ops: Arc<FileOperations>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListFilesTool { ops: ops.clone() }),
        Arc::new(CopyFileTool { ops: ops.clone() }),
        Arc::new(MoveFileTool { ops: ops.clone() }),
        Arc::new(DeleteFileTool { ops: ops.clone() }),
        Arc::new(AnalyzeFileTool { ops: ops.clone() }),
        Arc::new(SearchFilesTool { ops: ops.clone() }),
        Arc::new(OperationHistoryTool { ops }),
    ]
}

// ============================================================================
// ListFilesTool - Directory listing with sizes and dates
// ============================================================================

pub struct ListFilesTool {
    ops: Arc<FileOperations>,
}

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "List files and directories with size and dates. Supports glob patterns and recursive listing."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Directory to list" },
                "pattern": { "type": "string", "description": "Glob pattern (default: *)", "default": "*" },
                "recursive": { "type": "boolean", "description": "Include subdirectories", "default": false }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, ToolError> {
        let path = required_str(&params, "path")?.to_string();
        let pattern = params["pattern"].as_str().unwrap_or("*").to_string();
        let recursive = params["recursive"].as_bool().unwrap_or(false);
        blocking(&self.ops, move |ops| ops.list_files(&path, &pattern, recursive)).await
    }
}

// ============================================================================
// CopyFileTool - Copy a file or directory tree
// ============================================================================

pub struct CopyFileTool {
    ops: Arc<FileOperations>,
}

#[async_trait]
impl Tool for CopyFileTool {
    fn name(&self) -> &str {
        "copy_file"
    }

    fn description(&self) -> &str {
        "Copy a file or directory. Parent directories of the destination are created."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "source": { "type": "string", "description": "File or directory to copy" },
                "destination": { "type": "string", "description": "Target path" }
            },
            "required": ["source", "destination"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, ToolError> {
        let source = required_str(&params, "source")?.to_string();
        let destination = required_str(&params, "destination")?.to_string();
        blocking(&self.ops, move |ops| ops.copy(&source, &destination)).await
    }
}

// ============================================================================
// MoveFileTool - Move or rename, backing up an overwritten destination
// ============================================================================

pub struct MoveFileTool {
    ops: Arc<FileOperations>,
}

#[async_trait]
impl Tool for MoveFileTool {
    fn name(&self) -> &str {
        "move_file"
    }

    fn description(&self) -> &str {
        "Move or rename a file or directory. An existing destination file is backed up first."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "source": { "type": "string", "description": "File or directory to move" },
                "destination": { "type": "string", "description": "New path" }
            },
            "required": ["source", "destination"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, ToolError> {
        let source = required_str(&params, "source")?.to_string();
        let destination = required_str(&params, "destination")?.to_string();
        blocking(&self.ops, move |ops| ops.move_to(&source, &destination)).await
    }
}

// ============================================================================
// DeleteFileTool - Delete with a backup in the temp folder
// ============================================================================

pub struct DeleteFileTool {
    ops: Arc<FileOperations>,
}

#[async_trait]
impl Tool for DeleteFileTool {
    fn name(&self) -> &str {
        "delete_file"
    }

    fn description(&self) -> &str {
        "Delete a file or directory after copying it to the backups folder. Needs confirm=true when confirmation is enabled."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "File or directory to delete" },
                "confirm": { "type": "boolean", "description": "Confirm the deletion", "default": false }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, ToolError> {
        let path = required_str(&params, "path")?.to_string();
        let confirm = params["confirm"].as_bool().unwrap_or(false);
        blocking(&self.ops, move |ops| ops.delete(&path, confirm)).await
    }
}

// ============================================================================
// AnalyzeFileTool - Metadata and text preview
// ============================================================================

pub struct AnalyzeFileTool {
    ops: Arc<FileOperations>,
}

#[async_trait]
impl Tool for AnalyzeFileTool {
    fn name(&self) -> &str {
        "analyze_file"
    }

    fn description(&self) -> &str {
        "Show file metadata and, for text files, a content preview. The analysis is saved to the temp folder."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "File to analyze" }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, ToolError> {
        let path = required_str(&params, "path")?.to_string();
        blocking(&self.ops, move |ops| ops.analyze(&path)).await
    }
}

// ============================================================================
// SearchFilesTool - Recursive search by name or content
// ============================================================================

pub struct SearchFilesTool {
    ops: Arc<FileOperations>,
}

#[async_trait]
impl Tool for SearchFilesTool {
    fn name(&self) -> &str {
        "search_files"
    }

    fn description(&self) -> &str {
        "Search a directory tree for files whose name or text content contains the query."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory": { "type": "string", "description": "Directory to search" },
                "query": { "type": "string", "description": "Case-insensitive text to look for" },
                "file_type": { "type": "string", "description": "Only files with this extension" }
            },
            "required": ["directory", "query"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, ToolError> {
        let directory = required_str(&params, "directory")?.to_string();
        let query = required_str(&params, "query")?.to_string();
        let file_type = params["file_type"].as_str().map(str::to_string);
        blocking(&self.ops, move |ops| ops.search(&directory, &query, file_type.as_deref())).await
    }
}

// ============================================================================
// OperationHistoryTool - Recent copy/move/delete operations
// ============================================================================

pub struct OperationHistoryTool {
    ops: Arc<FileOperations>,
}

#[async_trait]
impl Tool for OperationHistoryTool {
    fn name(&self) -> &str {
        "operation_history"
    }

    fn description(&self) -> &str {
        "Show the most recent copy, move and delete operations."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "limit": { "type": "integer", "description": "Number of operations (default: 10)", "default": 10 }
            }
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, ToolError> {
        let limit = params["limit"].as_u64().unwrap_or(10) as usize;
        let operations = self.ops.recent_operations(limit);
        Ok(ToolResult {
            success: true,
            message: format!("{} recent operations", operations.len()),
            data: json!({ "operations": operations }),
        })
    }
}
