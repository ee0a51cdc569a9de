//! Configuration types
//!
//! Sections of the `settings.yaml` document. Every section deserializes with
//! defaults so a partial file is always valid.

use serde::{Deserialize, Serialize};

/// Application identity and diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
    pub version: String,
    pub debug: bool,
    /// Level string understood by `tracing` ("INFO", "debug", ...)
    pub log_level: String,
    /// Optional file that receives log output instead of stderr
    pub log_file: Option<String>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "Jarvis".to_string(),
            version: "1.0.0".to_string(),
            debug: false,
            log_level: "INFO".to_string(),
            log_file: None,
        }
    }
}

/// Language and vision model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsSection {
    pub text_model: String,
    pub vision_model: String,
    pub embedding_model: String,
    pub ollama_host: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub context_window: u32,
    /// Timeout applied to every chat/generate request
    pub request_timeout_secs: u64,
}

impl Default for ModelsSection {
    fn default() -> Self {
        Self {
            text_model: "qwen2.5:14b".to_string(),
            vision_model: "llava:13b".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            ollama_host: "http://localhost:11434".to_string(),
            max_tokens: 4096,
            temperature: 0.7,
            context_window: 8192,
            request_timeout_secs: 120,
        }
    }
}

/// Voice pipeline settings. Kept so existing files round-trip; nothing in
/// this crate drives a voice pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSection {
    pub enabled: bool,
    pub wake_word: String,
    pub wake_word_engine: String,
    pub stt_engine: String,
    pub stt_model: String,
    pub tts_engine: String,
    pub tts_voice: String,
    pub audio_device: Option<String>,
    pub sample_rate: u32,
    pub chunk_size: u32,
    pub silence_threshold: f32,
    pub silence_duration: f32,
}

impl Default for VoiceSection {
    fn default() -> Self {
        Self {
            enabled: true,
            wake_word: "hey max".to_string(),
            wake_word_engine: "openwakeword".to_string(),
            stt_engine: "faster-whisper".to_string(),
            stt_model: "base".to_string(),
            tts_engine: "silero".to_string(),
            tts_voice: "en_v6".to_string(),
            audio_device: None,
            sample_rate: 16000,
            chunk_size: 1024,
            silence_threshold: 0.01,
            silence_duration: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSection {
    pub hotkey: String,
    pub popup_timeout: u32,
    /// Inputs longer than this many characters are truncated
    pub max_input_length: usize,
}

impl Default for InputSection {
    fn default() -> Self {
        Self {
            hotkey: "ctrl+alt+j".to_string(),
            popup_timeout: 30,
            max_input_length: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub speak_responses: bool,
    pub show_notifications: bool,
    pub response_timeout: u32,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            speak_responses: true,
            show_notifications: true,
            response_timeout: 30,
        }
    }
}

/// Privacy and safety switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySection {
    pub online_mode: bool,
    /// Deletes need an explicit "confirm" when set
    pub confirm_dangerous_actions: bool,
    pub log_conversations: bool,
    pub encrypt_logs: bool,
    pub auto_delete_logs_days: u32,
}

impl Default for PrivacySection {
    fn default() -> Self {
        Self {
            online_mode: false,
            confirm_dangerous_actions: true,
            log_conversations: true,
            encrypt_logs: false,
            auto_delete_logs_days: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileManagementSection {
    /// Parsed and saved only; no action filters on it
    pub allowed_extensions: Vec<String>,
    /// Larger files are matched by name only in content search
    pub max_file_size_mb: u64,
    /// Keep `<dest>.backup` before copy or move overwrites a file
    pub backup_before_operations: bool,
    /// Parsed and saved only
    pub safe_directories: Vec<String>,
    /// Path prefixes no action may touch
    pub restricted_paths: Vec<String>,
}

impl Default for FileManagementSection {
    fn default() -> Self {
        Self {
            allowed_extensions: [".txt", ".pdf", ".docx", ".jpg", ".png", ".gif", ".mp4", ".mp3"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_file_size_mb: 100,
            backup_before_operations: true,
            safe_directories: ["~/Documents", "~/Downloads", "~/Desktop"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            restricted_paths: default_restricted_paths(),
        }
    }
}

pub fn default_restricted_paths() -> Vec<String> {
    [
        "C:/Windows",
        "C:/Program Files",
        "C:/Program Files (x86)",
        "/System",
        "/usr",
        "/bin",
        "/sbin",
        "/etc",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Web search settings (schema only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSearchSection {
    pub search_engine: String,
    pub max_results: u32,
    pub timeout: u32,
    pub user_agent: String,
}

impl Default for WebSearchSection {
    fn default() -> Self {
        Self {
            search_engine: "duckduckgo".to_string(),
            max_results: 5,
            timeout: 10,
            user_agent: "Jarvis AI Assistant 1.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// Relative paths resolve against the data directory
    pub path: String,
    pub backup_interval_hours: u32,
    pub max_backup_files: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: "logs/jarvis.db".to_string(),
            backup_interval_hours: 24,
            max_backup_files: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSection {
    pub theme: String,
    pub system_tray: bool,
    pub startup_notification: bool,
    pub minimize_to_tray: bool,
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            system_tray: true,
            startup_notification: true,
            minimize_to_tray: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceSection {
    pub max_concurrent_tasks: u32,
    pub cache_size_mb: u64,
    pub gpu_acceleration: bool,
    pub cpu_threads: Option<u32>,
}

impl Default for PerformanceSection {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 3,
            cache_size_mb: 512,
            gpu_acceleration: true,
            cpu_threads: None,
        }
    }
}

/// Temporary storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempSection {
    /// Defaults to `<data dir>/temp`
    pub root: Option<String>,
    pub cleanup_interval_hours: u64,
    pub max_size_mb: u64,
}

impl Default for TempSection {
    fn default() -> Self {
        Self {
            root: None,
            cleanup_interval_hours: 24,
            max_size_mb: 1024,
        }
    }
}

/// The whole settings document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub app: AppSection,
    pub models: ModelsSection,
    pub voice: VoiceSection,
    pub input: InputSection,
    pub output: OutputSection,
    pub privacy: PrivacySection,
    pub file_management: FileManagementSection,
    pub web_search: WebSearchSection,
    pub database: DatabaseSection,
    pub ui: UiSection,
    pub performance: PerformanceSection,
    pub temp: TempSection,
}

impl AssistantConfig {
    pub fn is_online_mode(&self) -> bool {
        self.privacy.online_mode
    }

    /// Clamp and repair values so the rest of the crate can trust them.
    pub fn validate(&mut self) {
        let defaults = Self::default();

        self.models.temperature = self.models.temperature.clamp(0.0, 2.0);
        if self.models.max_tokens == 0 {
            self.models.max_tokens = defaults.models.max_tokens;
        }
        if self.models.context_window == 0 {
            self.models.context_window = defaults.models.context_window;
        }
        if self.models.max_tokens > self.models.context_window {
            self.models.max_tokens = self.models.context_window / 2;
        }
        if self.models.ollama_host.trim().is_empty() {
            tracing::warn!("Ollama host not configured, using default");
            self.models.ollama_host = defaults.models.ollama_host;
        }
        self.models.ollama_host = self.models.ollama_host.trim_end_matches('/').to_string();
        if self.models.request_timeout_secs == 0 {
            self.models.request_timeout_secs = defaults.models.request_timeout_secs;
        }

        if self.voice.sample_rate == 0 {
            self.voice.sample_rate = defaults.voice.sample_rate;
        }

        if self.input.max_input_length == 0 {
            self.input.max_input_length = defaults.input.max_input_length;
        }

        if !["dark", "light", "auto"].contains(&self.ui.theme.as_str()) {
            self.ui.theme = defaults.ui.theme;
        }

        if self.database.path.trim().is_empty() {
            self.database.path = defaults.database.path;
        }

        if self.temp.max_size_mb == 0 {
            self.temp.max_size_mb = defaults.temp.max_size_mb;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AssistantConfig::default();
        assert_eq!(config.models.text_model, "qwen2.5:14b");
        assert_eq!(config.models.vision_model, "llava:13b");
        assert_eq!(config.models.ollama_host, "http://localhost:11434");
        assert_eq!(config.input.max_input_length, 1000);
        assert!(!config.privacy.online_mode);
        assert!(config.privacy.confirm_dangerous_actions);
        assert_eq!(config.database.path, "logs/jarvis.db");
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "models:\n  text_model: llama3\nprivacy:\n  online_mode: true\n";
        let config: AssistantConfig = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(config.models.text_model, "llama3");
        assert_eq!(config.models.vision_model, "llava:13b");
        assert!(config.is_online_mode());
        assert_eq!(config.ui.theme, "dark");
    }

    #[test]
    fn test_validation_repairs_values() {
        let mut config = AssistantConfig::default();
        config.models.temperature = 5.0;
        config.models.ollama_host = "  ".to_string();
        config.models.max_tokens = 100_000;
        config.ui.theme = "neon".to_string();
        config.input.max_input_length = 0;
        config.validate();

        assert_eq!(config.models.temperature, 2.0);
        assert_eq!(config.models.ollama_host, "http://localhost:11434");
        assert_eq!(config.models.max_tokens, config.models.context_window / 2);
        assert_eq!(config.ui.theme, "dark");
        assert_eq!(config.input.max_input_length, 1000);
    }

    #[test]
    fn test_trailing_slash_trimmed_from_host() {
        let mut config = AssistantConfig::default();
        config.models.ollama_host = "http://127.0.0.1:11434/".to_string();
        config.validate();
        assert_eq!(config.models.ollama_host, "http://127.0.0.1:11434");
    }
}
