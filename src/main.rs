//! Jarvis CLI - chat with the assistant and manage its local state.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use jarvis::agent::available_actions;
use jarvis::app::Assistant;
use jarvis::error::AppError;
use jarvis::logging;
use jarvis::storage::conversations::ConversationLog;
use jarvis::storage::profile::ProfileManager;
use jarvis::storage::settings::{self, load_settings, save_settings};
use jarvis::storage::temp::TempFileManager;
use jarvis::storage::{expand_home, AppPaths};
use jarvis::types::config::AssistantConfig;
use jarvis::types::message::InputType;

/// Jarvis - a local AI assistant
#[derive(Parser)]
#[command(name = "jarvis")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (default: platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level, overrides the settings file
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat on stdin (the default)
    Chat,

    /// Answer a single request
    Ask {
        /// Request text
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Model server and configuration status
    Status,

    /// Recent interactions
    History {
        /// Only this session
        #[arg(long)]
        session: Option<String>,
        /// Maximum entries
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// User profile and directory aliases
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Temporary storage
    Temp {
        #[command(subcommand)]
        action: TempAction,
    },

    /// What the assistant can do
    Actions,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective settings
    Show,
    /// Print the settings file location
    Path,
    /// Write default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    Show,
    /// Directories and whether they exist
    Dirs,
    /// Add a custom directory alias
    AliasAdd { name: String, path: String },
    /// Remove a custom directory alias
    AliasRemove { name: String },
    Export { path: PathBuf },
    Import { path: PathBuf },
}

#[derive(Subcommand)]
enum TempAction {
    Info,
    /// Delete old temp files
    Cleanup {
        /// Age threshold (default: the configured interval)
        #[arg(long)]
        hours: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let paths = AppPaths::resolve(cli.config.as_deref())?;
    let mut config = load_settings(&paths.config_file);
    config.validate();

    let level = cli.log_level.as_deref().unwrap_or(&config.app.log_level);
    let log_file = config.app.log_file.as_deref().map(expand_home);
    logging::init(level, log_file.as_deref())?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => chat(config, paths).await,
        Commands::Ask { text } => ask(config, paths, &text.join(" ")).await,
        Commands::Status => status(config, paths).await,
        Commands::History { session, limit } => history(&config, &paths, session.as_deref(), limit),
        Commands::Config { action } => config_command(action, &config, &paths),
        Commands::Profile { action } => profile_command(action, &paths),
        Commands::Temp { action } => temp_command(action, &config, &paths),
        Commands::Actions => actions(config, paths),
    }
}

fn actions(config: AssistantConfig, paths: AppPaths) -> Result<(), AppError> {
    for category in available_actions() {
        println!("{}:", category.category);
        for action in category.actions {
            println!("  - {}", action);
        }
    }

    let assistant = Assistant::new(config, paths)?;
    println!("\nRegistered actions:");
    for tool in assistant.registry().list_tools() {
        println!("  {:<20} [{}] {}", tool.name, tool.permission, tool.description);
    }
    Ok(())
}

async fn chat(config: AssistantConfig, paths: AppPaths) -> Result<(), AppError> {
    let mut assistant = Assistant::new(config, paths)?;
    let status = assistant.initialize().await?;
    if !status.ollama_available {
        println!("(model server unavailable: actions work, chat does not)");
    }
    println!("Jarvis is ready. Type 'exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"\nYou: ").await?;
        stdout.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received interrupt, shutting down...");
                None
            }
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let reply = assistant.handle_input(&line, InputType::Text).await;
        println!("\nJarvis: {}", reply.response);
        if reply.exit_requested {
            break;
        }
    }

    assistant.shutdown();
    Ok(())
}

async fn ask(config: AssistantConfig, paths: AppPaths, text: &str) -> Result<(), AppError> {
    let mut assistant = Assistant::new(config, paths)?;
    assistant.initialize().await?;
    let reply = assistant.handle_input(text, InputType::Text).await;
    println!("{}", reply.response);
    assistant.shutdown();
    Ok(())
}

async fn status(config: AssistantConfig, paths: AppPaths) -> Result<(), AppError> {
    let assistant = Assistant::new(config, paths)?;
    let status = assistant.model_status().await;
    let config = assistant.config();

    println!("Ollama host:     {}", config.models.ollama_host);
    println!(
        "Ollama:          {}",
        if status.ollama_available { "available" } else { "unavailable" }
    );
    if let Some(error) = &status.error {
        println!("                 {}", error);
    }
    let mark = |name: &str| {
        if status.has_model(name) {
            "ready"
        } else {
            "missing"
        }
    };
    println!(
        "Text model:      {} ({})",
        status.configured_text_model,
        mark(&status.configured_text_model)
    );
    println!(
        "Vision model:    {} ({})",
        status.configured_vision_model,
        mark(&status.configured_vision_model)
    );
    println!(
        "Online mode:     {}",
        if config.is_online_mode() { "on" } else { "off" }
    );
    println!("Actions:         {}", assistant.registry().count());
    println!("Settings:        {}", assistant.paths().config_file.display());
    println!("History:         {}", assistant.history().path().display());
    println!("Temp root:       {}", assistant.temp().root().display());
    Ok(())
}

fn history(
    config: &AssistantConfig,
    paths: &AppPaths,
    session: Option<&str>,
    limit: usize,
) -> Result<(), AppError> {
    let log = ConversationLog::open(&settings::database_path(config, &paths.data_dir))?;
    let records = log.recent(session, limit)?;
    if records.is_empty() {
        println!("No interactions recorded.");
        return Ok(());
    }
    for record in records.iter().rev() {
        println!(
            "[{}] {} ({})",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.session_id,
            record.input_type
        );
        println!("  You:    {}", record.user_input);
        if let Some(action) = &record.action_taken {
            println!("  Action: {}", action);
        }
        println!("  Jarvis: {}", record.ai_response);
    }
    Ok(())
}

fn config_command(
    action: ConfigAction,
    config: &AssistantConfig,
    paths: &AppPaths,
) -> Result<(), AppError> {
    match action {
        ConfigAction::Show => {
            let yaml = serde_yaml::to_string(config)
                .map_err(|e| AppError::Config(e.to_string()))?;
            print!("{}", yaml);
        }
        ConfigAction::Path => println!("{}", paths.config_file.display()),
        ConfigAction::Init { force } => {
            if settings_customised(&paths.config_file) && !force {
                return Err(AppError::Config(format!(
                    "{} already holds custom settings (use --force to overwrite)",
                    paths.config_file.display()
                )));
            }
            save_settings(&paths.config_file, &AssistantConfig::default())?;
            println!("Wrote defaults to {}", paths.config_file.display());
        }
    }
    Ok(())
}

/// True when the file differs from the defaults written on first load
fn settings_customised(path: &Path) -> bool {
    path.exists() && load_settings(path) != AssistantConfig::default()
}

fn profile_command(action: ProfileAction, paths: &AppPaths) -> Result<(), AppError> {
    let mut profiles = ProfileManager::new(paths.profile_file.clone());
    match action {
        ProfileAction::Show => {
            let json = serde_json::to_string_pretty(profiles.load())
                .map_err(|e| AppError::Config(e.to_string()))?;
            println!("{}", json);
        }
        ProfileAction::Dirs => {
            for dir in profiles.directory_info() {
                println!(
                    "{:<12} {:<8} {} {}",
                    dir.name,
                    dir.kind,
                    if dir.exists { "✓" } else { "✗" },
                    dir.path
                );
            }
        }
        ProfileAction::AliasAdd { name, path } => {
            profiles.add_custom_directory(&name, &path)?;
            println!("Added alias '{}' -> {}", name, path);
        }
        ProfileAction::AliasRemove { name } => {
            if profiles.remove_custom_directory(&name)? {
                println!("Removed alias '{}'", name);
            } else {
                println!("No alias named '{}'", name);
            }
        }
        ProfileAction::Export { path } => {
            profiles.export(&path)?;
            println!("Exported profile to {}", path.display());
        }
        ProfileAction::Import { path } => {
            profiles.import(&path)?;
            println!("Imported profile from {}", path.display());
        }
    }
    Ok(())
}

fn temp_command(
    action: TempAction,
    config: &AssistantConfig,
    paths: &AppPaths,
) -> Result<(), AppError> {
    let temp = TempFileManager::new(
        settings::temp_root(config, &paths.data_dir),
        config.temp.cleanup_interval_hours,
        config.temp.max_size_mb,
    )?;
    match action {
        TempAction::Info => {
            let info = temp.info()?;
            println!("Temp root: {}", info.temp_root);
            println!("Total size: {} MB (limit {} MB)", info.total_size_mb, info.max_size_mb);
            for (folder, usage) in &info.folders {
                println!("  {:<12} {:>5} files {:>10} MB", folder, usage.files, usage.size_mb);
            }
            if info.over_limit {
                println!("Warning: temp storage is over its limit");
            }
        }
        TempAction::Cleanup { hours } => {
            let report = temp.cleanup_old_files(hours)?;
            println!(
                "Deleted {} files, freed {} MB",
                report.deleted_files, report.size_freed_mb
            );
        }
    }
    Ok(())
}
