//! The assistant
//!
//! Owns every component and runs one input at a time through special
//! commands, the action dispatcher and finally the conversational model.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::agent::tools::apps::{
    FocusWindowTool, MediaControlTool, OpenApplicationTool, OpenWebsiteTool, SwitchWindowTool,
};
use crate::agent::tools::filesystem::{file_tools, FileOperations};
use crate::agent::tools::screen::{AnalyzeScreenshotTool, ScreenshotTool};
use crate::agent::tools::system::SystemInfoTool;
use crate::agent::tools::temp::{CleanupTempTool, TempInfoTool};
use crate::agent::{format_action_failure, format_action_response, Dispatcher, SafetyManager, ToolRegistry};
use crate::error::AppError;
use crate::inference::AiEngine;
use crate::logging::PerfTimer;
use crate::storage::conversations::{ConversationLog, InteractionRecord};
use crate::storage::profile::ProfileManager;
use crate::storage::settings;
use crate::storage::temp::TempFileManager;
use crate::storage::AppPaths;
use crate::types::config::AssistantConfig;
use crate::types::message::InputType;
use crate::types::model::ModelStatus;

/// Commands handled before any routing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialCommand {
    GoOnline,
    GoOffline,
    ClearHistory,
    Exit,
}

impl SpecialCommand {
    pub fn detect(input: &str) -> Option<Self> {
        let lower = input.trim().to_lowercase();
        if lower.contains("enable online mode") || lower.contains("go online") {
            Some(Self::GoOnline)
        } else if lower.contains("disable online mode") || lower.contains("go offline") {
            Some(Self::GoOffline)
        } else if matches!(lower.as_str(), "exit" | "quit" | "shutdown" | "stop") {
            Some(Self::Exit)
        } else if lower.contains("clear history") || lower.contains("reset conversation") {
            Some(Self::ClearHistory)
        } else {
            None
        }
    }
}

/// What the assistant answered
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reply {
    pub response: String,
    pub action_taken: Option<String>,
    pub success: bool,
    pub processing_time_ms: u64,
    pub model_used: Option<String>,
    pub tokens_used: u64,
    /// Set when the input asked the assistant to stop
    pub exit_requested: bool,
}

impl Reply {
    fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            success: true,
            ..Self::default()
        }
    }
}

fn new_session_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("session_{}_{}", Utc::now().timestamp(), &suffix[..8])
}

pub struct Assistant {
    config: AssistantConfig,
    paths: AppPaths,
    profile: ProfileManager,
    temp: Arc<TempFileManager>,
    dispatcher: Dispatcher,
    engine: AiEngine,
    history: ConversationLog,
    session_id: Option<String>,
}

impl Assistant {
    /// Build every component from `config`. Nothing talks to the model yet.
    pub fn new(mut config: AssistantConfig, paths: AppPaths) -> Result<Self, AppError> {
        config.validate();

        let temp = Arc::new(TempFileManager::new(
            settings::temp_root(&config, &paths.data_dir),
            config.temp.cleanup_interval_hours,
            config.temp.max_size_mb,
        )?);
        let safety = SafetyManager::from_config(
            &config.file_management,
            config.privacy.confirm_dangerous_actions,
        );
        let engine = AiEngine::new(&config.models, config.is_online_mode())?;

        let registry = ToolRegistry::new();
        let ops = Arc::new(
            FileOperations::new(safety, temp.clone()).configure(&config.file_management),
        );
        for tool in file_tools(ops) {
            registry.register(tool);
        }
        registry.register(Arc::new(ScreenshotTool::new(temp.clone())));
        registry.register(Arc::new(AnalyzeScreenshotTool::new(temp.clone(), engine.vision())));
        registry.register(Arc::new(SystemInfoTool));
        registry.register(Arc::new(CleanupTempTool::new(temp.clone())));
        registry.register(Arc::new(TempInfoTool::new(temp.clone())));
        registry.register(Arc::new(OpenApplicationTool));
        registry.register(Arc::new(OpenWebsiteTool));
        registry.register(Arc::new(FocusWindowTool));
        registry.register(Arc::new(SwitchWindowTool));
        registry.register(Arc::new(MediaControlTool));
        tracing::info!("Registered {} actions", registry.count());

        let history = ConversationLog::open(&settings::database_path(&config, &paths.data_dir))?;

        Ok(Self {
            profile: ProfileManager::new(paths.profile_file.clone()),
            dispatcher: Dispatcher::new(Arc::new(registry)),
            config,
            paths,
            temp,
            engine,
            history,
            session_id: None,
        })
    }

    /// Housekeeping, model check and session start. Missing models only
    /// produce warnings since actions keep working without them.
    pub async fn initialize(&mut self) -> Result<ModelStatus, AppError> {
        tracing::info!("Initializing Jarvis AI Assistant...");

        match self.history.cleanup_older_than(self.config.privacy.auto_delete_logs_days) {
            Ok(0) => {}
            Ok(n) => tracing::info!("Pruned {} old interactions", n),
            Err(e) => tracing::warn!("Could not prune conversation log: {}", e),
        }

        let temp = self.temp.clone();
        match tokio::task::spawn_blocking(move || temp.cleanup_old_files(None)).await {
            Ok(Ok(report)) if report.deleted_files > 0 => tracing::info!(
                "Removed {} stale temp files ({} MB)",
                report.deleted_files,
                report.size_freed_mb
            ),
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!("Temp cleanup failed: {}", e),
            Err(e) => tracing::warn!("Temp cleanup task failed: {}", e),
        }

        let display_name = self.profile.load().preferences.display_name.clone();
        if !display_name.trim().is_empty() {
            self.engine
                .update_system_prompt(Some(format!("The user's name is {}.", display_name)));
        }

        let status = self.engine.model_status().await;
        if !status.ollama_available {
            tracing::warn!(
                "Ollama server is not available ({}). Actions still work, chat will not.",
                status.error.as_deref().unwrap_or("unknown error")
            );
        } else if !status.models_ready {
            tracing::warn!("Some models are not available. Functionality may be limited.");
        }

        let session_id = self.engine.start_session(Some(new_session_id()));
        if let Err(e) = self.history.start_session(&session_id) {
            tracing::warn!("Could not record session start: {}", e);
        }
        self.session_id = Some(session_id);

        tracing::info!("Jarvis AI Assistant initialized successfully");
        Ok(status)
    }

    /// Answer one input
    pub async fn handle_input(&mut self, raw: &str, input_type: InputType) -> Reply {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Reply::default();
        }

        let max = self.config.input.max_input_length;
        let input: String = if trimmed.chars().count() > max {
            tracing::warn!("Input truncated to {} characters", max);
            trimmed.chars().take(max).collect()
        } else {
            trimmed.to_string()
        };
        tracing::info!("Processing {} input: {}", input_type.as_str(), input);

        let timer = PerfTimer::start("Input handling");
        let mut reply = match SpecialCommand::detect(&input) {
            Some(command) => self.run_special(command),
            None => self.respond(&input).await,
        };
        if reply.processing_time_ms == 0 {
            reply.processing_time_ms = timer.elapsed_ms();
        }

        self.record(&input, input_type, &reply);
        reply
    }

    fn run_special(&mut self, command: SpecialCommand) -> Reply {
        match command {
            SpecialCommand::GoOnline => {
                let online = self.toggle_online();
                Reply::text(format!(
                    "Online mode {}",
                    if online { "enabled" } else { "disabled" }
                ))
            }
            SpecialCommand::GoOffline => {
                if self.config.is_online_mode() {
                    self.toggle_online();
                }
                Reply::text("Offline mode enabled")
            }
            SpecialCommand::ClearHistory => {
                self.engine.clear_history();
                Reply::text("Conversation history cleared")
            }
            SpecialCommand::Exit => Reply {
                exit_requested: true,
                ..Reply::text("Shutting down Jarvis. Goodbye!")
            },
        }
    }

    fn toggle_online(&mut self) -> bool {
        let online = match settings::toggle_online_mode(&self.paths.config_file, &mut self.config) {
            Ok(online) => online,
            Err(e) => {
                tracing::error!("Could not persist online mode: {}", e);
                self.config.is_online_mode()
            }
        };
        self.engine.set_online_mode(online);
        tracing::info!("Online mode: {}", online);
        online
    }

    async fn respond(&mut self, input: &str) -> Reply {
        let dirs = self.profile.current().directories.clone();
        let outcome = self.dispatcher.dispatch(input, &dirs).await;

        let Some(action) = outcome.action_taken.clone() else {
            let answer = self.engine.process_text(input).await;
            tracing::info!("AI response generated in {}ms", answer.processing_time_ms);
            return Reply {
                success: answer.error.is_none(),
                response: answer.response,
                processing_time_ms: answer.processing_time_ms,
                model_used: answer.model_used,
                tokens_used: answer.tokens_used,
                ..Reply::default()
            };
        };

        if outcome.success {
            tracing::info!("Action '{}' completed successfully", action);
            return Reply {
                response: format_action_response(&outcome),
                action_taken: Some(action),
                success: true,
                ..Reply::default()
            };
        }

        let error = outcome.error.as_deref().unwrap_or("Unknown error");
        tracing::error!("Action '{}' failed: {}", action, error);
        let response = match self.engine.explain_error(input, &action, error).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => format_action_failure(&outcome),
            Err(e) => {
                tracing::debug!("No explanation from the model: {}", e);
                format_action_failure(&outcome)
            }
        };
        Reply {
            response,
            action_taken: Some(action),
            success: false,
            ..Reply::default()
        }
    }

    fn record(&self, input: &str, input_type: InputType, reply: &Reply) {
        if !self.config.privacy.log_conversations {
            return;
        }
        let Some(session_id) = &self.session_id else {
            return;
        };

        let mut record = InteractionRecord::new(
            session_id.clone(),
            input_type.as_str(),
            input,
            reply.response.clone(),
        );
        record.action_taken = reply.action_taken.clone();
        record.online_mode = self.config.is_online_mode();
        record.model_used = reply.model_used.clone();
        record.processing_time_ms = reply.processing_time_ms;
        record.tokens_used = reply.tokens_used;

        if let Err(e) = self.history.log_interaction(&record) {
            tracing::error!("Error logging interaction: {}", e);
        }
    }

    /// End the session. Safe to call more than once.
    pub fn shutdown(&mut self) {
        let Some(session_id) = self.session_id.take() else {
            return;
        };
        tracing::info!("Shutting down Jarvis AI Assistant...");
        self.engine.end_session();
        if let Err(e) = self.history.end_session(&session_id) {
            tracing::warn!("Could not record session end: {}", e);
        }
        tracing::info!("Jarvis AI Assistant shutdown complete");
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn profile(&mut self) -> &mut ProfileManager {
        &mut self.profile
    }

    pub fn history(&self) -> &ConversationLog {
        &self.history
    }

    pub fn temp(&self) -> &Arc<TempFileManager> {
        &self.temp
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        self.dispatcher.registry()
    }

    pub fn engine(&self) -> &AiEngine {
        &self.engine
    }

    pub async fn model_status(&self) -> ModelStatus {
        self.engine.model_status().await
    }
}

impl Drop for Assistant {
    fn drop(&mut self) {
        self.shutdown();
    }
}
