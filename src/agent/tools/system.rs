//! System tools - Resource status

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::agent::tools::{Tool, ToolError, ToolResult};
use crate::system::resources;

// ============================================================================
// SystemInfoTool - CPU, memory, disk and network snapshot
// ============================================================================

pub struct SystemInfoTool;

#[async_trait]
impl Tool for SystemInfoTool {
    fn name(&self) -> &str {
        "system_info"
    }

    fn description(&self) -> &str {
        "Get system information: OS, host name, CPU usage, memory, system disk and network counters."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: Value) -> Result<ToolResult, ToolError> {
        let snapshot = tokio::task::spawn_blocking(resources::snapshot)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("system snapshot failed: {}", e)))?;

        let data = serde_json::to_value(&snapshot)
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        Ok(ToolResult {
            success: true,
            message: format!(
                "{}: CPU {:.1}%, memory {:.1}%",
                snapshot.hostname.as_deref().unwrap_or(&snapshot.os),
                snapshot.cpu.usage_percent,
                snapshot.memory.percent
            ),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_system_info_has_sections() {
        let result = SystemInfoTool.execute(json!({})).await.unwrap();
        assert!(result.success);
        assert!(result.data["cpu"]["count"].as_u64().unwrap() >= 1);
        assert!(result.data["memory"]["total_gb"].as_f64().unwrap() > 0.0);
        assert!(result.data.get("network").is_some());
    }
}
