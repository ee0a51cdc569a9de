//! Application control
//!
//! Launching applications, opening URLs, bringing windows to the front and
//! sending media keys.

use std::process::{Output, Stdio};

use tokio::process::Command;

use crate::system::SystemError;

/// Well-known application names and their launch command per platform
const WINDOWS_APPS: &[(&str, &str)] = &[
    ("calculator", "calc"),
    ("notepad", "notepad"),
    ("text editor", "notepad"),
    ("paint", "mspaint"),
    ("cmd", "cmd"),
    ("terminal", "wt"),
    ("powershell", "powershell"),
    ("task manager", "taskmgr"),
    ("control panel", "control"),
    ("file explorer", "explorer"),
    ("file manager", "explorer"),
    ("explorer", "explorer"),
    ("registry editor", "regedit"),
    ("chrome", "chrome"),
    ("firefox", "firefox"),
    ("edge", "msedge"),
    ("browser", "msedge"),
    ("discord", "discord"),
    ("spotify", "spotify"),
    ("vscode", "code"),
    ("visual studio code", "code"),
];

const MACOS_APPS: &[(&str, &str)] = &[
    ("calculator", "Calculator"),
    ("notepad", "TextEdit"),
    ("text editor", "TextEdit"),
    ("terminal", "Terminal"),
    ("file explorer", "Finder"),
    ("file manager", "Finder"),
    ("finder", "Finder"),
    ("chrome", "Google Chrome"),
    ("firefox", "Firefox"),
    ("safari", "Safari"),
    ("browser", "Safari"),
    ("discord", "Discord"),
    ("spotify", "Spotify"),
    ("vscode", "Visual Studio Code"),
    ("visual studio code", "Visual Studio Code"),
    ("task manager", "Activity Monitor"),
    ("settings", "System Settings"),
];

const LINUX_APPS: &[(&str, &str)] = &[
    ("calculator", "gnome-calculator"),
    ("notepad", "gedit"),
    ("text editor", "gedit"),
    ("terminal", "x-terminal-emulator"),
    ("file explorer", "xdg-open ~"),
    ("file manager", "xdg-open ~"),
    ("chrome", "google-chrome"),
    ("firefox", "firefox"),
    ("browser", "firefox"),
    ("discord", "discord"),
    ("spotify", "spotify"),
    ("vscode", "code"),
    ("visual studio code", "code"),
    ("task manager", "gnome-system-monitor"),
];

fn app_table() -> &'static [(&'static str, &'static str)] {
    if cfg!(windows) {
        WINDOWS_APPS
    } else if cfg!(target_os = "macos") {
        MACOS_APPS
    } else {
        LINUX_APPS
    }
}

/// Launch target for a spoken application name
pub fn resolve_app(name: &str) -> String {
    let key = name.trim().to_lowercase();
    app_table()
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, target)| target.to_string())
        .unwrap_or_else(|| name.trim().to_string())
}

/// The program and arguments that start `target`
fn launch_command(target: &str) -> (String, Vec<String>) {
    if cfg!(windows) {
        (
            "cmd".to_string(),
            vec!["/C".into(), "start".into(), "".into(), target.to_string()],
        )
    } else if cfg!(target_os = "macos") {
        ("open".to_string(), vec!["-a".into(), target.to_string()])
    } else {
        let mut parts = target.split_whitespace().map(|p| {
            if p == "~" {
                crate::storage::home_dir().display().to_string()
            } else {
                p.to_string()
            }
        });
        let program = parts.next().unwrap_or_default();
        (program, parts.collect())
    }
}

/// Start `program` without waiting on it. The child is reaped by a
/// background task once it exits.
fn spawn_detached(program: &str, args: &[String]) -> Result<tokio::task::JoinHandle<()>, SystemError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(false)
        .spawn()
        .map_err(|e| SystemError::CommandFailed(format!("{}: {}", program, e)))?;

    let program = program.to_string();
    Ok(tokio::spawn(async move {
        match child.wait().await {
            Ok(status) => tracing::debug!("{} exited with {}", program, status),
            Err(e) => tracing::warn!("Could not wait for {}: {}", program, e),
        }
    }))
}

/// Run a short-lived desktop helper and wait for it. A missing helper
/// program means the platform has no backend for `what`.
async fn run_helper(program: &str, args: &[String], what: &str) -> Result<Output, SystemError> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SystemError::NoBackend(format!("{} ({})", what, program)),
            _ => SystemError::Io(e),
        })
}

fn powershell(script: String) -> (&'static str, Vec<String>) {
    ("powershell", vec!["-NoProfile".into(), "-Command".into(), script])
}

/// Start an application without waiting for it. Returns the launch target.
pub async fn launch_application(name: &str) -> Result<String, SystemError> {
    let target = resolve_app(name);
    if target.is_empty() {
        return Err(SystemError::CommandFailed("No application name given".to_string()));
    }
    let (program, args) = launch_command(&target);
    tracing::info!("Launching {} with: {} {:?}", name, program, args);
    spawn_detached(&program, &args)?;
    Ok(target)
}

/// Add `https://` when the URL has no scheme
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Open a URL with the default handler. Returns the normalised URL.
pub async fn open_url(url: &str) -> Result<String, SystemError> {
    let url = normalize_url(url);
    let (program, args): (&str, Vec<String>) = if cfg!(windows) {
        ("cmd", vec!["/C".into(), "start".into(), "".into(), url.clone()])
    } else if cfg!(target_os = "macos") {
        ("open", vec![url.clone()])
    } else {
        ("xdg-open", vec![url.clone()])
    };
    tracing::info!("Opening URL: {}", url);
    spawn_detached(program, &args)?;
    Ok(url)
}

/// Bring a window whose title or application matches `name` to the front
pub async fn focus_window(name: &str) -> Result<(), SystemError> {
    let target = resolve_app(name);
    let (program, args): (&str, Vec<String>) = if cfg!(target_os = "macos") {
        (
            "osascript",
            vec![
                "-e".into(),
                format!("tell application \"{}\" to activate", target.replace('"', "")),
            ],
        )
    } else if cfg!(windows) {
        powershell(format!(
            "$ok = (New-Object -ComObject WScript.Shell).AppActivate('{}'); if (-not $ok) {{ exit 1 }}",
            name.replace('\'', "''")
        ))
    } else {
        ("wmctrl", vec!["-a".into(), name.to_string()])
    };

    let output = run_helper(program, &args, "window manager tool").await?;
    if output.status.success() {
        tracing::info!("Focused window: {}", name);
        Ok(())
    } else {
        Err(SystemError::CommandFailed(format!(
            "No window matching '{}' could be focused",
            name
        )))
    }
}

fn switch_window_command() -> (&'static str, Vec<String>) {
    if cfg!(target_os = "macos") {
        (
            "osascript",
            vec![
                "-e".into(),
                "tell application \"System Events\" to key code 48 using command down".into(),
            ],
        )
    } else if cfg!(windows) {
        powershell("(New-Object -ComObject WScript.Shell).SendKeys('%{TAB}')".to_string())
    } else {
        ("xdotool", vec!["key".into(), "alt+Tab".into()])
    }
}

/// Send the platform's window switcher shortcut (Alt+Tab, Cmd+Tab on macOS)
pub async fn switch_window() -> Result<(), SystemError> {
    let (program, args) = switch_window_command();
    let output = run_helper(program, &args, "keyboard automation tool").await?;
    if output.status.success() {
        tracing::info!("Switched window");
        Ok(())
    } else {
        Err(SystemError::CommandFailed(format!(
            "{} exited with {}",
            program, output.status
        )))
    }
}

/// A media player command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaAction {
    PlayPause,
    Next,
    Previous,
}

impl MediaAction {
    pub fn parse(action: &str) -> Option<Self> {
        match action.trim().to_lowercase().as_str() {
            "play_pause" | "playpause" | "play" | "pause" | "toggle" => Some(Self::PlayPause),
            "next" | "skip" => Some(Self::Next),
            "previous" | "prev" | "back" => Some(Self::Previous),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlayPause => "play_pause",
            Self::Next => "next",
            Self::Previous => "previous",
        }
    }
}

/// The command that delivers `action`: MPRIS through playerctl on Linux,
/// Spotify's scripting interface on macOS, media keys on Windows
fn media_command(action: MediaAction) -> (&'static str, Vec<String>) {
    if cfg!(target_os = "macos") {
        let verb = match action {
            MediaAction::PlayPause => "playpause",
            MediaAction::Next => "next track",
            MediaAction::Previous => "previous track",
        };
        (
            "osascript",
            vec!["-e".into(), format!("tell application \"Spotify\" to {}", verb)],
        )
    } else if cfg!(windows) {
        let key = match action {
            MediaAction::PlayPause => 179,
            MediaAction::Next => 176,
            MediaAction::Previous => 177,
        };
        powershell(format!(
            "(New-Object -ComObject WScript.Shell).SendKeys([char]{})",
            key
        ))
    } else {
        let verb = match action {
            MediaAction::PlayPause => "play-pause",
            MediaAction::Next => "next",
            MediaAction::Previous => "previous",
        };
        ("playerctl", vec![verb.into()])
    }
}

/// Drive the active media player
pub async fn media_control(action: MediaAction) -> Result<(), SystemError> {
    let (program, args) = media_command(action);
    let output = run_helper(program, &args, "media player control").await?;
    if output.status.success() {
        tracing::info!("Media control: {}", action.as_str());
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(SystemError::CommandFailed(format!(
            "No media player accepted '{}'{}",
            action.as_str(),
            if stderr.trim().is_empty() {
                String::new()
            } else {
                format!(": {}", stderr.trim())
            }
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url(" http://a.b "), "http://a.b");
        assert_eq!(normalize_url("ftp://files"), "ftp://files");
    }

    #[test]
    fn test_resolve_known_and_unknown_apps() {
        let calc = resolve_app("CALCULATOR");
        assert!(app_table().iter().any(|(alias, target)| *alias == "calculator" && *target == calc));
        assert_eq!(resolve_app("  my-custom-tool "), "my-custom-tool");
    }

    #[test]
    fn test_launch_command_has_program() {
        let (program, _) = launch_command(&resolve_app("terminal"));
        assert!(!program.is_empty());
    }

    #[tokio::test]
    async fn test_empty_launch_is_rejected() {
        assert!(launch_application("   ").await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_detached_child_is_reaped() {
        let reaper = spawn_detached("true", &[]).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), reaper)
            .await
            .expect("child should exit and be waited on")
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_program_is_a_launch_error() {
        let err = spawn_detached("jarvis-no-such-program", &[]).unwrap_err();
        assert!(matches!(err, SystemError::CommandFailed(msg) if msg.starts_with("jarvis-no-such-program")));
    }

    #[test]
    fn test_media_action_parse() {
        assert_eq!(MediaAction::parse("Play_Pause"), Some(MediaAction::PlayPause));
        assert_eq!(MediaAction::parse("skip"), Some(MediaAction::Next));
        assert_eq!(MediaAction::parse("back"), Some(MediaAction::Previous));
        assert_eq!(MediaAction::parse("louder"), None);
        assert_eq!(MediaAction::Next.as_str(), "next");
    }

    #[test]
    fn test_media_commands_differ_per_action() {
        let (program, play) = media_command(MediaAction::PlayPause);
        let (_, next) = media_command(MediaAction::Next);
        assert!(!program.is_empty());
        assert_ne!(play, next);
        if cfg!(all(unix, not(target_os = "macos"))) {
            assert_eq!(program, "playerctl");
            assert_eq!(next, vec!["next".to_string()]);
        }
    }

    #[test]
    fn test_switch_window_command() {
        let (program, args) = switch_window_command();
        assert!(!program.is_empty());
        assert!(args.iter().any(|a| a.to_lowercase().contains("tab") || a.contains("48")));
    }
}
