//! Conversational engine
//!
//! Keeps the per-session history window and turns user text and images into
//! model calls.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::prompts::{build_error_explanation_prompt, build_system_prompt};
use crate::inference::client::{GenerationOptions, OllamaClient};
use crate::inference::image::encode_image;
use crate::inference::InferenceError;
use crate::logging::PerfTimer;
use crate::types::config::ModelsSection;
use crate::types::message::Message;
use crate::types::model::ModelStatus;

/// Number of history messages sent with each chat request
pub const HISTORY_WINDOW: usize = 10;

const TEXT_APOLOGY: &str =
    "I apologize, but I encountered an error processing your request. Please try again.";

/// Result of one model call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineResponse {
    pub response: String,
    pub processing_time_ms: u64,
    pub model_used: Option<String>,
    pub tokens_used: u64,
    pub session_id: Option<String>,
    pub error: Option<String>,
}

/// The vision model, shareable with action handlers
#[derive(Clone)]
pub struct VisionModel {
    client: Arc<OllamaClient>,
    model: String,
    options: GenerationOptions,
}

impl VisionModel {
    pub fn new(client: Arc<OllamaClient>, model: impl Into<String>, options: GenerationOptions) -> Self {
        Self {
            client,
            model: model.into(),
            options,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send the image at `path` with `prompt` to the vision model
    pub async fn describe(&self, path: &Path, prompt: &str) -> Result<EngineResponse, InferenceError> {
        let timer = PerfTimer::start("Image processing");
        let owned = path.to_path_buf();
        let encoded = tokio::task::spawn_blocking(move || encode_image(&owned))
            .await
            .map_err(|e| InferenceError::Api(format!("image encoding task failed: {e}")))??;

        let completion = self
            .client
            .generate(&self.model, prompt, vec![encoded], None, self.options)
            .await?;

        Ok(EngineResponse {
            response: completion.text,
            processing_time_ms: timer.elapsed_ms(),
            model_used: Some(self.model.clone()),
            tokens_used: completion.tokens,
            session_id: None,
            error: None,
        })
    }
}

pub struct AiEngine {
    client: Arc<OllamaClient>,
    text_model: String,
    vision: VisionModel,
    options: GenerationOptions,
    online: bool,
    extra_context: Option<String>,
    system_prompt: String,
    history: Vec<Message>,
    session_id: Option<String>,
}

impl AiEngine {
    pub fn new(models: &ModelsSection, online: bool) -> Result<Self, InferenceError> {
        let client = Arc::new(OllamaClient::new(
            models.ollama_host.clone(),
            Duration::from_secs(models.request_timeout_secs),
        )?);
        let options = GenerationOptions {
            temperature: models.temperature,
            num_predict: models.max_tokens,
        };
        Ok(Self {
            vision: VisionModel::new(client.clone(), models.vision_model.clone(), options),
            client,
            text_model: models.text_model.clone(),
            options,
            online,
            extra_context: None,
            system_prompt: build_system_prompt(online, Local::now(), None),
            history: Vec::new(),
            session_id: None,
        })
    }

    pub fn client(&self) -> Arc<OllamaClient> {
        self.client.clone()
    }

    pub fn vision(&self) -> VisionModel {
        self.vision.clone()
    }

    pub fn text_model(&self) -> &str {
        &self.text_model
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Start a session with a fresh history. Returns the session id.
    pub fn start_session(&mut self, session_id: Option<String>) -> String {
        let id = session_id.unwrap_or_else(|| format!("session_{}", Utc::now().timestamp()));
        self.session_id = Some(id.clone());
        self.history.clear();
        tracing::info!("Started new session: {}", id);
        id
    }

    pub fn end_session(&mut self) {
        if let Some(id) = self.session_id.take() {
            tracing::info!("Ended session: {}", id);
            self.history.clear();
        }
    }

    /// Chat with the text model. Failures come back as an apology with the
    /// error attached; the failed turn is not kept in the history.
    pub async fn process_text(&mut self, input: &str) -> EngineResponse {
        let timer = PerfTimer::start("Text processing");
        self.history.push(Message::user(input));

        let mut messages = Vec::with_capacity(HISTORY_WINDOW + 1);
        messages.push(Message::system(self.system_prompt.clone()));
        let start = self.history.len().saturating_sub(HISTORY_WINDOW);
        messages.extend_from_slice(&self.history[start..]);

        match self.client.chat(&self.text_model, &messages, self.options).await {
            Ok(completion) => {
                self.history.push(Message::assistant(completion.text.clone()));
                EngineResponse {
                    response: completion.text,
                    processing_time_ms: timer.elapsed_ms(),
                    model_used: Some(self.text_model.clone()),
                    tokens_used: completion.tokens,
                    session_id: self.session_id.clone(),
                    error: None,
                }
            }
            Err(e) => {
                tracing::error!("Error processing text input: {}", e);
                self.history.pop();
                EngineResponse {
                    response: TEXT_APOLOGY.to_string(),
                    processing_time_ms: timer.elapsed_ms(),
                    model_used: None,
                    tokens_used: 0,
                    session_id: self.session_id.clone(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub async fn process_image(&self, path: &Path, prompt: &str) -> Result<EngineResponse, InferenceError> {
        let mut response = self.vision.describe(path, prompt).await?;
        response.session_id = self.session_id.clone();
        Ok(response)
    }

    /// A short explanation of a failed action, written by the text model
    pub async fn explain_error(
        &self,
        user_input: &str,
        action: &str,
        error: &str,
    ) -> Result<String, InferenceError> {
        let _timer = PerfTimer::start("Error explanation");
        let messages = [
            Message::system(self.system_prompt.clone()),
            Message::user(build_error_explanation_prompt(user_input, action, error)),
        ];
        let completion = self
            .client
            .chat(&self.text_model, &messages, self.options)
            .await?;
        Ok(completion.text)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        tracing::info!("Conversation history cleared");
    }

    /// The last `limit` messages of the session
    pub fn recent_context(&self, limit: usize) -> &[Message] {
        let start = self.history.len().saturating_sub(limit);
        &self.history[start..]
    }

    pub async fn model_status(&self) -> ModelStatus {
        let unavailable = |error: String| ModelStatus {
            ollama_available: false,
            configured_text_model: self.text_model.clone(),
            configured_vision_model: self.vision.model().to_string(),
            error: Some(error),
            ..ModelStatus::default()
        };

        if !self.client.is_available().await {
            return unavailable(format!("Ollama server not reachable at {}", self.client.host()));
        }
        match self.client.list_models().await {
            Ok(models) => ModelStatus::from_models(&models, &self.text_model, self.vision.model()),
            Err(e) => {
                tracing::error!("Error getting model status: {}", e);
                unavailable(e.to_string())
            }
        }
    }

    /// Rebuild the system prompt, optionally with extra context
    pub fn update_system_prompt(&mut self, extra_context: Option<String>) {
        self.extra_context = extra_context;
        self.system_prompt =
            build_system_prompt(self.online, Local::now(), self.extra_context.as_deref());
        tracing::debug!("System prompt updated");
    }

    pub fn set_online_mode(&mut self, online: bool) {
        self.online = online;
        let extra = self.extra_context.take();
        self.update_system_prompt(extra);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::client::test_server::serve_once;

    fn engine(host: &str) -> AiEngine {
        let models = ModelsSection {
            ollama_host: host.to_string(),
            request_timeout_secs: 10,
            ..ModelsSection::default()
        };
        AiEngine::new(&models, false).unwrap()
    }

    #[tokio::test]
    async fn test_failed_chat_returns_apology() {
        let mut engine = engine("http://127.0.0.1:9");
        engine.start_session(Some("s1".to_string()));

        let reply = engine.process_text("hello").await;
        assert!(reply.response.starts_with("I apologize"));
        assert!(reply.error.is_some());
        assert_eq!(reply.session_id.as_deref(), Some("s1"));
        assert!(engine.recent_context(10).is_empty());
    }

    #[tokio::test]
    async fn test_successful_chat_records_turns() {
        let body = r#"{"message":{"role":"assistant","content":"Hi!"},"eval_count":3}"#;
        let (host, _req) = serve_once(200, body.to_string()).await;
        let mut engine = engine(&host);
        engine.start_session(None);

        let reply = engine.process_text("hello").await;
        assert_eq!(reply.response, "Hi!");
        assert_eq!(reply.tokens_used, 3);
        assert_eq!(reply.model_used.as_deref(), Some("qwen2.5:14b"));

        let context = engine.recent_context(5);
        assert_eq!(context.len(), 2);
        assert_eq!(context[0].content, "hello");
        assert_eq!(context[1].content, "Hi!");
    }

    #[tokio::test]
    async fn test_only_recent_history_is_sent() {
        let body = r#"{"message":{"role":"assistant","content":"ok"}}"#;
        let (host, req) = serve_once(200, body.to_string()).await;
        let mut engine = engine(&host);
        for i in 0..12 {
            engine.history.push(Message::user(format!("m{:02}", i)));
        }

        engine.process_text("latest").await;
        let raw = req.await.unwrap().body;
        assert!(!raw.contains("m00"));
        assert!(!raw.contains("m02"));
        assert!(raw.contains("m03"));
        assert!(raw.contains("latest"));
        assert!(raw.contains("You are Jarvis"));
    }

    #[tokio::test]
    async fn test_model_status_when_unavailable() {
        let engine = engine("http://127.0.0.1:9");
        let status = engine.model_status().await;
        assert!(!status.ollama_available);
        assert!(!status.models_ready);
        assert_eq!(status.configured_vision_model, "llava:13b");
        assert!(status.error.is_some());
    }

    #[test]
    fn test_session_lifecycle_and_prompt_updates() {
        let mut engine = engine("http://127.0.0.1:9");
        let id = engine.start_session(None);
        assert!(id.starts_with("session_"));
        engine.history.push(Message::user("x"));

        engine.set_online_mode(true);
        assert!(engine.system_prompt().contains("Mode: online"));
        engine.update_system_prompt(Some("extra".to_string()));
        assert!(engine.system_prompt().contains("Additional Context:\nextra"));

        engine.end_session();
        assert!(engine.session_id().is_none());
        assert!(engine.recent_context(10).is_empty());
    }
}
