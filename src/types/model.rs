//! Model types
//!
//! Metadata reported by the local model server.

use serde::{Deserialize, Serialize};

/// A model installed on the Ollama server (`GET /api/tags`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model tag, e.g. `llava:13b`
    pub name: String,
    /// Size on disk in bytes
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified_at: Option<String>,
    #[serde(default)]
    pub digest: Option<String>,
}

/// Availability of the model server and the configured models
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelStatus {
    pub ollama_available: bool,
    pub available_models: Vec<String>,
    pub configured_text_model: String,
    pub configured_vision_model: String,
    pub models_ready: bool,
    pub error: Option<String>,
}

impl ModelStatus {
    /// Build a status from the server's model list
    pub fn from_models(models: &[ModelInfo], text_model: &str, vision_model: &str) -> Self {
        let available_models: Vec<String> = models.iter().map(|m| m.name.clone()).collect();
        let has = |name: &str| available_models.iter().any(|m| model_matches(m, name));
        let models_ready = has(text_model) && has(vision_model);
        Self {
            ollama_available: true,
            available_models,
            configured_text_model: text_model.to_string(),
            configured_vision_model: vision_model.to_string(),
            models_ready,
            error: None,
        }
    }

    /// Whether the server has `name` installed
    pub fn has_model(&self, name: &str) -> bool {
        self.available_models.iter().any(|m| model_matches(m, name))
    }
}

/// Ollama reports untagged models as `name:latest`
fn model_matches(installed: &str, configured: &str) -> bool {
    if installed == configured {
        return true;
    }
    !configured.contains(':') && installed == format!("{}:latest", configured)
}
