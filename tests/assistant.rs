//! End-to-end requests against temp directories with no model server.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use jarvis::agent::tools::filesystem::{file_tools, FileOperations};
use jarvis::agent::{Dispatcher, SafetyManager, ToolRegistry};
use jarvis::app::Assistant;
use jarvis::storage::profile::UserDirectories;
use jarvis::storage::temp::TempFileManager;
use jarvis::storage::AppPaths;
use jarvis::types::config::AssistantConfig;
use jarvis::types::message::InputType;
use tempfile::TempDir;

async fn assistant(root: &Path) -> Assistant {
    let mut config = AssistantConfig::default();
    config.models.ollama_host = "http://127.0.0.1:9".to_string();
    config.models.request_timeout_secs = 2;
    let mut assistant = Assistant::new(config, AppPaths::under(root)).unwrap();
    assistant.initialize().await.unwrap();
    assistant
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notes.txt"), "meeting at noon\n").unwrap();
    fs::write(dir.path().join("report.md"), "# Q3\n").unwrap();
    fs::create_dir(dir.path().join("archive")).unwrap();
    dir
}

#[tokio::test]
async fn lists_a_directory_by_path() {
    let state = TempDir::new().unwrap();
    let work = workspace();
    let mut jarvis = assistant(state.path()).await;

    let reply = jarvis
        .handle_input(
            &format!("list files in {}", work.path().display()),
            InputType::Text,
        )
        .await;

    assert!(reply.success);
    assert_eq!(reply.action_taken.as_deref(), Some("list_files"));
    assert!(reply.response.contains("Found 2 files and 1 directories"));
    assert!(reply.response.contains("notes.txt"));
    assert!(reply.response.contains("📁 archive"));
}

#[tokio::test]
async fn delete_waits_for_confirmation() {
    let state = TempDir::new().unwrap();
    let work = workspace();
    let target = work.path().join("notes.txt");
    let mut jarvis = assistant(state.path()).await;

    let reply = jarvis
        .handle_input(&format!("delete {}", target.display()), InputType::Text)
        .await;
    assert!(reply.response.starts_with("Delete operation requires confirmation."));
    assert!(target.exists());

    let reply = jarvis
        .handle_input(&format!("delete {} confirm", target.display()), InputType::Text)
        .await;
    assert!(reply.success, "{}", reply.response);
    assert!(reply.response.starts_with("File deleted successfully!"));
    assert!(!target.exists());

    let backups = jarvis.temp().folder("backups");
    let saved: Vec<_> = fs::read_dir(backups).unwrap().collect();
    assert_eq!(saved.len(), 1);
}

#[tokio::test]
async fn failed_action_falls_back_to_plain_error() {
    let state = TempDir::new().unwrap();
    let work = workspace();
    let mut jarvis = assistant(state.path()).await;

    let missing = work.path().join("missing.txt");
    let reply = jarvis
        .handle_input(
            &format!("copy {} to {}", missing.display(), work.path().join("out.txt").display()),
            InputType::Text,
        )
        .await;

    assert!(!reply.success);
    assert_eq!(reply.action_taken.as_deref(), Some("copy_file"));
    assert!(reply.response.starts_with("Action failed:"), "{}", reply.response);
    assert!(reply.response.contains("missing.txt"));
}

#[cfg(unix)]
#[tokio::test]
async fn restricted_directories_are_refused() {
    let state = TempDir::new().unwrap();
    let mut jarvis = assistant(state.path()).await;

    let reply = jarvis.handle_input("list files in /etc", InputType::Text).await;
    assert!(!reply.success);
    assert!(reply.response.contains("restricted"), "{}", reply.response);
}

#[tokio::test]
async fn interactions_are_logged_per_session() {
    let state = TempDir::new().unwrap();
    let work = workspace();
    let mut jarvis = assistant(state.path()).await;

    jarvis
        .handle_input(&format!("analyze {}", work.path().join("report.md").display()), InputType::Text)
        .await;
    jarvis.handle_input("clear history", InputType::Text).await;

    let session = jarvis.session_id().unwrap().to_string();
    let recent = jarvis.history().recent(Some(&session), 10).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].ai_response, "Conversation history cleared");
    assert_eq!(recent[1].action_taken.as_deref(), Some("analyze_file"));
}

#[tokio::test]
async fn dispatcher_moves_into_directory_alias() {
    let work = workspace();
    let temp_root = TempDir::new().unwrap();
    let temp = Arc::new(TempFileManager::new(temp_root.path(), 24, 1024).unwrap());
    let registry = ToolRegistry::new();
    for tool in file_tools(Arc::new(FileOperations::new(SafetyManager::default(), temp))) {
        registry.register(tool);
    }
    let dispatcher = Dispatcher::new(Arc::new(registry));

    let mut dirs = UserDirectories::detect();
    dirs.custom_aliases
        .insert("vault".to_string(), work.path().join("archive").display().to_string());

    let outcome = dispatcher
        .dispatch(
            &format!("move {} to vault", work.path().join("report.md").display()),
            &dirs,
        )
        .await;

    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.action_taken.as_deref(), Some("move_file"));
    assert!(work.path().join("archive").join("report.md").exists());
    assert!(!work.path().join("report.md").exists());
}

#[tokio::test]
async fn moving_a_folder_onto_a_folder_nests_it() {
    let state = TempDir::new().unwrap();
    let work = workspace();
    fs::create_dir(work.path().join("project")).unwrap();
    fs::write(work.path().join("project").join("report.md"), "draft").unwrap();
    let mut jarvis = assistant(state.path()).await;

    let reply = jarvis
        .handle_input(
            &format!(
                "move {} to {}",
                work.path().join("project").display(),
                work.path().join("archive").display()
            ),
            InputType::Text,
        )
        .await;

    assert!(reply.success, "{}", reply.response);
    assert_eq!(
        fs::read_to_string(work.path().join("archive").join("project").join("report.md")).unwrap(),
        "draft"
    );
    assert_eq!(fs::read_to_string(work.path().join("report.md")).unwrap(), "# Q3\n");
}
