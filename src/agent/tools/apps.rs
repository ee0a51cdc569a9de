//! Application tools - Open application, Open website, Focus window, Switch window, Media control

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::agent::tools::{Tool, ToolError, ToolResult};
use crate::system::apps::{self, MediaAction};

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    params[key]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::InvalidParameters(format!("{} is required", key)))
}

// ============================================================================
// OpenApplicationTool - Launch an app by friendly name
// ============================================================================

pub struct OpenApplicationTool;

#[async_trait]
impl Tool for OpenApplicationTool {
    fn name(&self) -> &str {
        "open_application"
    }

    fn description(&self) -> &str {
        "Launch an application. Common names (calculator, notepad, terminal, browser) map to the platform program."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Application name" }
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, ToolError> {
        let name = required_str(&params, "name")?;
        let target = apps::launch_application(name).await?;
        Ok(ToolResult {
            success: true,
            message: format!("Opened {}", name),
            data: json!({ "application": name, "launched": target }),
        })
    }
}

// ============================================================================
// OpenWebsiteTool - Open a URL in the default browser
// ============================================================================

pub struct OpenWebsiteTool;

#[async_trait]
impl Tool for OpenWebsiteTool {
    fn name(&self) -> &str {
        "open_website"
    }

    fn description(&self) -> &str {
        "Open a website in the default browser. https:// is added when no scheme is given."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "description": "Address to open" }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, ToolError> {
        let url = required_str(&params, "url")?;
        if url.contains(char::is_whitespace) {
            return Err(ToolError::InvalidParameters(format!("Not a web address: {}", url)));
        }
        let opened = apps::open_url(url).await?;
        Ok(ToolResult {
            success: true,
            message: format!("Opened {}", opened),
            data: json!({ "url": opened }),
        })
    }
}

// ============================================================================
// FocusWindowTool - Bring a window to the front
// ============================================================================

pub struct FocusWindowTool;

#[async_trait]
impl Tool for FocusWindowTool {
    fn name(&self) -> &str {
        "focus_window"
    }

    fn description(&self) -> &str {
        "Bring the window of a running application to the front."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Window title or application name" }
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, ToolError> {
        let name = required_str(&params, "name")?;
        apps::focus_window(name).await?;
        Ok(ToolResult {
            success: true,
            message: format!("Switched to {}", name),
            data: json!({ "window": name }),
        })
    }
}

// ============================================================================
// SwitchWindowTool - Cycle to the next window
// ============================================================================

pub struct SwitchWindowTool;

#[async_trait]
impl Tool for SwitchWindowTool {
    fn name(&self) -> &str {
        "switch_window"
    }

    fn description(&self) -> &str {
        "Switch to the previously used window with the platform's Alt+Tab shortcut."
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value) -> Result<ToolResult, ToolError> {
        apps::switch_window().await?;
        Ok(ToolResult {
            success: true,
            message: "Switched window".to_string(),
            data: json!({ "keys": "alt+tab" }),
        })
    }
}

// ============================================================================
// MediaControlTool - Play/pause, next and previous track
// ============================================================================

pub struct MediaControlTool;

#[async_trait]
impl Tool for MediaControlTool {
    fn name(&self) -> &str {
        "media_control"
    }

    fn description(&self) -> &str {
        "Control music playback: toggle play/pause, skip to the next track or go back to the previous one."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["play_pause", "next", "previous"],
                    "description": "Playback command"
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, ToolError> {
        let raw = required_str(&params, "action")?;
        let action = MediaAction::parse(raw)
            .ok_or_else(|| ToolError::InvalidParameters(format!("Unknown media action: {}", raw)))?;
        apps::media_control(action).await?;
        let message = match action {
            MediaAction::PlayPause => "Toggled playback",
            MediaAction::Next => "Skipped to the next track",
            MediaAction::Previous => "Went back to the previous track",
        };
        Ok(ToolResult {
            success: true,
            message: message.to_string(),
            data: json!({ "media_action": action.as_str() }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_parameters_are_rejected() {
        assert!(matches!(
            OpenApplicationTool.execute(json!({})).await,
            Err(ToolError::InvalidParameters(_))
        ));
        assert!(matches!(
            FocusWindowTool.execute(json!({"name": "  "})).await,
            Err(ToolError::InvalidParameters(_))
        ));
        assert!(matches!(
            OpenWebsiteTool.execute(json!({"url": "not a url"})).await,
            Err(ToolError::InvalidParameters(_))
        ));
        assert!(matches!(
            MediaControlTool.execute(json!({})).await,
            Err(ToolError::InvalidParameters(_))
        ));
        assert!(matches!(
            MediaControlTool.execute(json!({"action": "louder"})).await,
            Err(ToolError::InvalidParameters(msg)) if msg.contains("louder")
        ));
    }
}
