//! Screen tools - Screenshot, Analyze screenshot

use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

use crate::agent::prompts::SCREEN_ANALYSIS_PROMPT;
use crate::agent::tools::{Tool, ToolError, ToolResult};
use crate::inference::VisionModel;
use crate::storage::expand_home;
use crate::storage::temp::TempFileManager;
use crate::system::screen::{capture_screen, Capture};

async fn take_screenshot(temp: &TempFileManager, path: Option<&str>) -> Result<Capture, ToolError> {
    let target = match path {
        Some(p) => expand_home(p),
        None => temp.screenshot_path(),
    };
    Ok(capture_screen(&target).await?)
}

// ============================================================================
// ScreenshotTool - Full-screen capture into the temp folder
// ============================================================================

pub struct ScreenshotTool {
    temp: Arc<TempFileManager>,
}

impl ScreenshotTool {
    pub fn new(temp: Arc<TempFileManager>) -> Self {
        Self { temp }
    }
}

#[async_trait]
impl Tool for ScreenshotTool {
    fn name(&self) -> &str {
        "screenshot"
    }

    fn description(&self) -> &str {
        "Capture the whole screen as PNG. Saved to the screenshots temp folder unless a path is given."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Optional output file" }
            }
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, ToolError> {
        let capture = take_screenshot(&self.temp, params["path"].as_str()).await?;
        Ok(ToolResult {
            success: true,
            message: format!("Screenshot saved to {}", capture.path),
            data: json!({
                "path": capture.path,
                "size": [capture.width, capture.height],
                "file_size": capture.file_size,
                "file_size_human": capture.file_size_human,
            }),
        })
    }
}

// ============================================================================
// AnalyzeScreenshotTool - Capture, then describe with the vision model
// ============================================================================

pub struct AnalyzeScreenshotTool {
    temp: Arc<TempFileManager>,
    vision: VisionModel,
}

impl AnalyzeScreenshotTool {
    pub fn new(temp: Arc<TempFileManager>, vision: VisionModel) -> Self {
        Self { temp, vision }
    }
}

#[async_trait]
impl Tool for AnalyzeScreenshotTool {
    fn name(&self) -> &str {
        "analyze_screenshot"
    }

    fn description(&self) -> &str {
        "Describe what is on screen using the local vision model. Takes a screenshot first unless an image path is given."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Existing screenshot to analyze" }
            }
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolResult, ToolError> {
        let screenshot: PathBuf = match params["path"].as_str() {
            Some(path) => {
                let path = expand_home(path);
                if !path.is_file() {
                    return Err(ToolError::NotFound(format!("Image does not exist: {}", path.display())));
                }
                path
            }
            None => PathBuf::from(take_screenshot(&self.temp, None).await?.path),
        };

        tracing::info!("Analyzing screenshot with vision model: {}", screenshot.display());
        let analysis = self
            .vision
            .describe(&screenshot, SCREEN_ANALYSIS_PROMPT)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("Image analysis failed: {}", e)))?;

        Ok(ToolResult {
            success: true,
            message: format!("Analyzed {}", screenshot.display()),
            data: json!({
                "screenshot_path": screenshot.display().to_string(),
                "analysis": analysis.response,
                "processing_time_ms": analysis.processing_time_ms,
                "model_used": analysis.model_used,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::client::test_server::serve_once;
    use crate::inference::{GenerationOptions, OllamaClient};
    use std::time::Duration;
    use tempfile::TempDir;

    fn vision(host: &str) -> VisionModel {
        let client = Arc::new(OllamaClient::new(host, Duration::from_secs(10)).unwrap());
        VisionModel::new(client, "llava:13b", GenerationOptions::default())
    }

    #[tokio::test]
    async fn test_analyze_existing_image() {
        let dir = TempDir::new().unwrap();
        let temp = Arc::new(TempFileManager::new(dir.path().join("temp"), 24, 1024).unwrap());
        let image = dir.path().join("screen.png");
        image::RgbImage::new(64, 48).save(&image).unwrap();

        let body = r#"{"response":"A terminal window with a prompt","eval_count":12}"#;
        let (host, req) = serve_once(200, body.to_string()).await;
        let tool = AnalyzeScreenshotTool::new(temp, vision(&host));

        let result = tool
            .execute(json!({"path": image.display().to_string()}))
            .await
            .unwrap();
        assert_eq!(result.data["analysis"], "A terminal window with a prompt");
        assert_eq!(result.data["model_used"], "llava:13b");

        let raw = req.await.unwrap().body;
        assert!(raw.contains("Applications and windows that are open"));
        assert!(raw.contains("\"images\""));
    }

    #[tokio::test]
    async fn test_analyze_reports_model_failure() {
        let dir = TempDir::new().unwrap();
        let temp = Arc::new(TempFileManager::new(dir.path().join("temp"), 24, 1024).unwrap());
        let image = dir.path().join("screen.png");
        image::RgbImage::new(8, 8).save(&image).unwrap();

        let tool = AnalyzeScreenshotTool::new(temp, vision("http://127.0.0.1:9"));
        let err = tool
            .execute(json!({"path": image.display().to_string()}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Image analysis failed"));
    }

    #[tokio::test]
    async fn test_analyze_missing_image() {
        let dir = TempDir::new().unwrap();
        let temp = Arc::new(TempFileManager::new(dir.path().join("temp"), 24, 1024).unwrap());
        let tool = AnalyzeScreenshotTool::new(temp, vision("http://127.0.0.1:9"));
        assert!(matches!(
            tool.execute(json!({"path": "/no/such/shot.png"})).await,
            Err(ToolError::NotFound(_))
        ));
    }
}
