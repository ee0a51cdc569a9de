use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::agent::safety::{action_permission_level, PermissionLevel};

/// Action handler trait - every action the assistant can perform implements this
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    async fn execute(&self, params: Value) -> Result<ToolResult, ToolError>;
}

/// Action execution result
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub data: Value,
    pub message: String,
}

impl PartialEq for ToolResult {
    fn eq(&self, other: &Self) -> bool {
        self.success == other.success && self.message == other.message
    }
}

/// Action errors
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Timeout")]
    Timeout,
}

impl From<std::io::Error> for ToolError {
    fn from(e: std::io::Error) -> Self {
        ToolError::ExecutionFailed(e.to_string())
    }
}

impl From<crate::storage::StorageError> for ToolError {
    fn from(e: crate::storage::StorageError) -> Self {
        ToolError::ExecutionFailed(e.to_string())
    }
}

impl From<crate::system::SystemError> for ToolError {
    fn from(e: crate::system::SystemError) -> Self {
        ToolError::ExecutionFailed(e.to_string())
    }
}

/// Action information for listing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub permission: PermissionLevel,
    pub parameters_schema: Value,
}

/// Registered action handlers, keyed by name
pub struct ToolRegistry {
    tools: DashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
        }
    }

    pub fn register(&self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|t| t.clone())
    }

    /// Run the handler registered under `name`
    pub async fn execute(&self, name: &str, params: Value) -> Result<ToolResult, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(format!("no action named {}", name)))?;
        tracing::debug!(
            "Executing {} ({}) with {}",
            name,
            action_permission_level(name),
            params
        );
        tool.execute(params).await
    }

    /// All handlers, sorted by name
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        let mut tools: Vec<ToolInfo> = self
            .tools
            .iter()
            .map(|entry| ToolInfo {
                name: entry.name().to_string(),
                description: entry.description().to_string(),
                permission: action_permission_level(entry.name()),
                parameters_schema: entry.parameters_schema(),
            })
            .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    pub fn count(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Application launching, websites and window focus
pub mod apps;

/// File tools (list, copy, move, delete, analyze, search, history)
pub mod filesystem;

/// Screenshot capture and analysis
pub mod screen;

/// System status
pub mod system;

/// Temp folder cleanup and usage
pub mod temp;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "system_info"
        }

        fn description(&self) -> &str {
            "Echo the parameters back"
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }

        async fn execute(&self, params: Value) -> Result<ToolResult, ToolError> {
            Ok(ToolResult {
                success: true,
                data: params,
                message: "echo".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_registry_executes_by_name() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        assert_eq!(registry.count(), 1);

        let result = registry.execute("system_info", json!({"a": 1})).await.unwrap();
        assert_eq!(result.data["a"], 1);

        assert!(matches!(
            registry.execute("missing", json!({})).await,
            Err(ToolError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_tools_reports_permission() {
        let registry = ToolRegistry::default();
        registry.register(Arc::new(EchoTool));
        let tools = registry.list_tools();
        assert_eq!(tools[0].name, "system_info");
        assert_eq!(tools[0].permission, PermissionLevel::ReadOnly);
    }
}
