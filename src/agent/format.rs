//! Human-readable text for action results

use std::fmt::Write as _;

use serde_json::Value;

use crate::agent::dispatcher::DispatchOutcome;

/// Files shown in a listing
const LISTED_FILES: usize = 10;
/// Directories shown in a listing
const LISTED_DIRECTORIES: usize = 5;
const LISTED_MATCHES: usize = 10;
const PREVIEW_CHARS: usize = 500;

fn text<'a>(data: &'a Value, key: &str, default: &'a str) -> &'a str {
    data[key].as_str().unwrap_or(default)
}

fn number(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        _ => "0".to_string(),
    }
}

fn float(value: &Value) -> f64 {
    value.as_f64().unwrap_or(0.0)
}

fn items(data: &Value, key: &str) -> Vec<Value> {
    data[key].as_array().cloned().unwrap_or_default()
}

/// Text shown to the user for a successful action
pub fn format_action_response(outcome: &DispatchOutcome) -> String {
    let action = outcome.action_taken.as_deref().unwrap_or("unknown");
    let Some(result) = &outcome.result else {
        return format!("Action '{}' completed successfully.", action);
    };
    let data = &result.data;
    let mut out = String::new();

    match action {
        "analyze_screenshot" => {
            let _ = write!(
                out,
                "Screenshot Analysis:\n\n{}",
                text(data, "analysis", "Analysis completed")
            );
        }
        "screenshot" => {
            let _ = write!(
                out,
                "Screenshot captured successfully!\nSaved to: {}\nFile size: {}",
                text(data, "path", "unknown"),
                text(data, "file_size_human", "unknown size")
            );
        }
        "list_files" => {
            let _ = writeln!(out, "Directory: {}", text(data, "directory", "unknown"));
            let _ = writeln!(
                out,
                "Found {} files and {} directories",
                number(&data["total_files"]),
                number(&data["total_directories"])
            );
            let _ = writeln!(out, "Total size: {}\n", text(data, "total_size_human", "0 B"));

            let files = items(data, "files");
            if !files.is_empty() {
                out.push_str("Files:\n");
                for file in files.iter().take(LISTED_FILES) {
                    let _ = writeln!(
                        out,
                        "  • {} ({})",
                        text(file, "name", "?"),
                        text(file, "size_human", "?")
                    );
                }
                if files.len() > LISTED_FILES {
                    let _ = writeln!(out, "  ... and {} more", files.len() - LISTED_FILES);
                }
            }

            let dirs = items(data, "directories");
            if !dirs.is_empty() {
                out.push_str("\nDirectories:\n");
                for dir in dirs.iter().take(LISTED_DIRECTORIES) {
                    let _ = writeln!(out, "  📁 {}", text(dir, "name", "?"));
                }
            }
        }
        "copy_file" => {
            let _ = write!(
                out,
                "File copied successfully!\nFrom: {}\nTo: {}",
                text(data, "source", "unknown"),
                text(data, "destination", "unknown")
            );
        }
        "move_file" => {
            let _ = write!(
                out,
                "File moved successfully!\nFrom: {}\nTo: {}",
                text(data, "source", "unknown"),
                text(data, "destination", "unknown")
            );
            if let Some(backup) = data["backup"].as_str() {
                let _ = write!(out, "\nPrevious file backed up to: {}", backup);
            }
        }
        "delete_file" => {
            if data["requires_confirmation"].as_bool().unwrap_or(false) {
                let _ = write!(
                    out,
                    "Delete operation requires confirmation.\nFile: {}\nPlease confirm by saying 'delete [filename] confirm'",
                    text(data, "path", "unknown")
                );
            } else {
                let _ = write!(
                    out,
                    "File deleted successfully!\nDeleted: {}\nBackup created at: {}",
                    text(data, "path", "unknown"),
                    text(data, "backup_location", "unknown")
                );
            }
        }
        "analyze_file" => {
            let _ = writeln!(out, "File Analysis: {}", text(data, "name", "unknown"));
            let _ = writeln!(out, "Size: {}", text(data, "size_human", "unknown"));
            let _ = writeln!(out, "Type: {}", text(data, "extension", "unknown"));
            let _ = writeln!(out, "Modified: {}", text(data, "modified", "unknown"));
            if let Some(preview) = data["content_preview"].as_str().filter(|p| !p.is_empty()) {
                let shown: String = preview.chars().take(PREVIEW_CHARS).collect();
                let _ = write!(out, "\nContent Preview:\n{}...", shown);
            }
        }
        "search_files" => {
            let matches = items(data, "matches");
            let _ = writeln!(
                out,
                "Search Results for '{}' in {}",
                text(data, "query", "unknown"),
                text(data, "directory", "unknown")
            );
            let _ = writeln!(out, "Found {} matches\n", matches.len());
            for m in matches.iter().take(LISTED_MATCHES) {
                let _ = writeln!(
                    out,
                    "  • {} ({} match)",
                    text(m, "name", "?"),
                    text(m, "match_type", "?")
                );
            }
        }
        "temp_info" => {
            let _ = writeln!(out, "Temporary Files Info");
            let _ = writeln!(out, "Total size: {} MB\n", float(&data["total_size_mb"]));
            if let Some(folders) = data["folders"].as_object() {
                for (folder, usage) in folders {
                    let _ = writeln!(
                        out,
                        "{}: {} files ({} MB)",
                        folder,
                        number(&usage["files"]),
                        float(&usage["size_mb"])
                    );
                }
            }
            if data["over_limit"].as_bool().unwrap_or(false) {
                let _ = writeln!(
                    out,
                    "\nWarning: temp storage is over the {} MB limit",
                    number(&data["max_size_mb"])
                );
            }
        }
        "cleanup_temp" => {
            let _ = write!(
                out,
                "Temp cleanup completed!\nDeleted {} files\nFreed {} MB of space",
                number(&data["deleted_files"]),
                float(&data["size_freed_mb"])
            );
        }
        "system_info" => {
            let cpu = &data["cpu"];
            let memory = &data["memory"];
            let disk = &data["disk"];
            out.push_str("System Information\n\n");
            let _ = writeln!(
                out,
                "CPU: {:.1}% usage ({} cores)",
                float(&cpu["usage_percent"]),
                number(&cpu["count"])
            );
            let _ = writeln!(
                out,
                "Memory: {:.1}GB / {:.1}GB ({}%)",
                float(&memory["used_gb"]),
                float(&memory["total_gb"]),
                float(&memory["percent"])
            );
            if disk.is_object() {
                let _ = writeln!(
                    out,
                    "Disk: {:.1}GB / {:.1}GB ({}%)",
                    float(&disk["used_gb"]),
                    float(&disk["total_gb"]),
                    float(&disk["percent"])
                );
            }
        }
        "operation_history" => {
            let operations = items(data, "operations");
            if operations.is_empty() {
                out.push_str("No file operations yet.");
            } else {
                out.push_str("Recent file operations:\n");
                for op in &operations {
                    let target = op["source"].as_str().unwrap_or("?");
                    let _ = write!(
                        out,
                        "  {} {} {}",
                        text(op, "timestamp", ""),
                        text(op, "action", "?"),
                        target
                    );
                    if let Some(dest) = op["destination"].as_str() {
                        let _ = write!(out, " -> {}", dest);
                    }
                    out.push('\n');
                }
            }
        }
        "open_application" | "open_website" | "focus_window" | "switch_window" | "media_control" => {
            out.push_str(&result.message);
        }
        other => {
            let _ = write!(out, "Action '{}' completed successfully.", other);
        }
    }
    out
}

/// Text shown when an action failed and no explanation is available
pub fn format_action_failure(outcome: &DispatchOutcome) -> String {
    format!(
        "Action failed: {}",
        outcome.error.as_deref().unwrap_or("Unknown error")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::ToolResult;
    use serde_json::json;

    fn outcome(action: &str, data: Value) -> DispatchOutcome {
        DispatchOutcome {
            action_taken: Some(action.to_string()),
            success: true,
            result: Some(ToolResult {
                success: true,
                data,
                message: "done".into(),
            }),
            error: None,
        }
    }

    #[test]
    fn test_listing_shows_limited_entries() {
        let files: Vec<Value> = (0..12)
            .map(|i| json!({"name": format!("f{:02}.txt", i), "size_human": "1.0 KB"}))
            .collect();
        let dirs: Vec<Value> = (0..7).map(|i| json!({"name": format!("d{}", i)})).collect();
        let text = format_action_response(&outcome(
            "list_files",
            json!({
                "directory": "/home/u",
                "total_files": 12,
                "total_directories": 7,
                "total_size_human": "12.0 KB",
                "files": files,
                "directories": dirs,
            }),
        ));

        assert!(text.starts_with("Directory: /home/u\nFound 12 files and 7 directories\nTotal size: 12.0 KB\n\nFiles:\n"));
        assert!(text.contains("  • f09.txt (1.0 KB)"));
        assert!(!text.contains("f10.txt"));
        assert!(text.contains("... and 2 more"));
        assert!(text.contains("  📁 d4"));
        assert!(!text.contains("d5"));
    }

    #[test]
    fn test_delete_confirmation_text() {
        let text = format_action_response(&outcome(
            "delete_file",
            json!({"requires_confirmation": true, "path": "/tmp/a.txt"}),
        ));
        assert_eq!(
            text,
            "Delete operation requires confirmation.\nFile: /tmp/a.txt\nPlease confirm by saying 'delete [filename] confirm'"
        );

        let text = format_action_response(&outcome(
            "delete_file",
            json!({"path": "/tmp/a.txt", "backup_location": "/t/backups/a.txt_1"}),
        ));
        assert!(text.ends_with("Backup created at: /t/backups/a.txt_1"));
    }

    #[test]
    fn test_analysis_preview_is_cut() {
        let text = format_action_response(&outcome(
            "analyze_file",
            json!({
                "name": "a.txt",
                "size_human": "2.0 KB",
                "extension": ".txt",
                "modified": "2024-01-01T00:00:00",
                "content_preview": "y".repeat(800),
            }),
        ));
        assert!(text.contains("Type: .txt"));
        assert!(text.ends_with(&format!("{}...", "y".repeat(500))));
        assert!(!text.contains(&"y".repeat(501)));
    }

    #[test]
    fn test_temp_and_cleanup_text() {
        let text = format_action_response(&outcome(
            "cleanup_temp",
            json!({"deleted_files": 3, "size_freed_mb": 1.25}),
        ));
        assert_eq!(text, "Temp cleanup completed!\nDeleted 3 files\nFreed 1.25 MB of space");

        let text = format_action_response(&outcome(
            "temp_info",
            json!({"total_size_mb": 0.5, "folders": {"cache": {"files": 2, "size_mb": 0.5}}}),
        ));
        assert!(text.contains("cache: 2 files (0.5 MB)"));
    }

    #[test]
    fn test_system_info_text() {
        let text = format_action_response(&outcome(
            "system_info",
            json!({
                "cpu": {"usage_percent": 12.34, "count": 8},
                "memory": {"used_gb": 7.9, "total_gb": 16.0, "percent": 49.4},
                "disk": null,
            }),
        ));
        assert!(text.contains("CPU: 12.3% usage (8 cores)"));
        assert!(text.contains("Memory: 7.9GB / 16.0GB (49.4%)"));
        assert!(!text.contains("Disk"));
    }

    #[test]
    fn test_desktop_actions_use_tool_message() {
        assert_eq!(format_action_response(&outcome("media_control", json!({}))), "done");
        assert_eq!(format_action_response(&outcome("switch_window", json!({}))), "done");
    }

    #[test]
    fn test_unknown_action_and_failure() {
        let text = format_action_response(&outcome("something_new", json!({})));
        assert_eq!(text, "Action 'something_new' completed successfully.");

        let failed = DispatchOutcome {
            action_taken: Some("copy_file".into()),
            success: false,
            result: None,
            error: Some("Not found: Source: Path does not exist: x".into()),
        };
        assert_eq!(
            format_action_failure(&failed),
            "Action failed: Not found: Source: Path does not exist: x"
        );
    }
}
