//! Temp tools - Cleanup, Usage

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::agent::tools::{Tool, ToolError, ToolResult};
use crate::storage::temp::TempFileManager;

// ============================================================================
// CleanupTempTool - Delete old temporary files
// ============================================================================

pub struct CleanupTempTool {
    temp: Arc<TempFileManager>,
}

impl CleanupTempTool {
    pub fn new(temp: Arc<TempFileManager>) -> Self {
        Self { temp }
    }
}

#[async_trait]
impl Tool for CleanupTempTool {
    fn name(&self) -> &str {
        "cleanup_temp"
    }

    fn description(&self) -> &str {
        "Delete temporary files older than the given number of hours (default: the configured cleanup interval)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "hours": { "type": "integer", "description": "Age threshold in hours" }
            }
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, ToolError> {
        let hours = params["hours"].as_u64();
        let temp = self.temp.clone();
        let report = tokio::task::spawn_blocking(move || temp.cleanup_old_files(hours))
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("cleanup task failed: {}", e)))??;

        Ok(ToolResult {
            success: true,
            message: format!(
                "Deleted {} files, freed {} MB",
                report.deleted_files, report.size_freed_mb
            ),
            data: serde_json::to_value(&report).map_err(|e| ToolError::ExecutionFailed(e.to_string()))?,
        })
    }
}

// ============================================================================
// TempInfoTool - Temp folder usage per subfolder
// ============================================================================

pub struct TempInfoTool {
    temp: Arc<TempFileManager>,
}

impl TempInfoTool {
    pub fn new(temp: Arc<TempFileManager>) -> Self {
        Self { temp }
    }
}

#[async_trait]
impl Tool for TempInfoTool {
    fn name(&self) -> &str {
        "temp_info"
    }

    fn description(&self) -> &str {
        "Show how many files and megabytes each temp subfolder holds."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: Value) -> Result<ToolResult, ToolError> {
        let temp = self.temp.clone();
        let info = tokio::task::spawn_blocking(move || temp.info())
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("temp info task failed: {}", e)))??;

        if info.over_limit {
            tracing::warn!(
                "Temp storage at {} MB exceeds the {} MB limit",
                info.total_size_mb,
                info.max_size_mb
            );
        }

        Ok(ToolResult {
            success: true,
            message: format!("Temp folder uses {} MB", info.total_size_mb),
            data: serde_json::to_value(&info).map_err(|e| ToolError::ExecutionFailed(e.to_string()))?,
        })
    }
}
