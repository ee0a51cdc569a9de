//! Screen capture
//!
//! Full-screen screenshots through the platform's own capture tool.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::system::{format_size, SystemError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capture {
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    pub file_size_human: String,
}

/// Program and arguments for one capture attempt
struct CaptureCommand {
    program: &'static str,
    args: Vec<String>,
}

fn capture_commands(target: &Path) -> Vec<CaptureCommand> {
    let out = target.display().to_string();

    if cfg!(target_os = "macos") {
        return vec![CaptureCommand {
            program: "screencapture",
            args: vec!["-x".to_string(), out],
        }];
    }

    if cfg!(windows) {
        let script = format!(
            "Add-Type -AssemblyName System.Windows.Forms,System.Drawing; \
             $b = [System.Windows.Forms.SystemInformation]::VirtualScreen; \
             $bmp = New-Object System.Drawing.Bitmap $b.Width, $b.Height; \
             $g = [System.Drawing.Graphics]::FromImage($bmp); \
             $g.CopyFromScreen($b.Left, $b.Top, 0, 0, $bmp.Size); \
             $bmp.Save('{}', [System.Drawing.Imaging.ImageFormat]::Png); \
             $g.Dispose(); $bmp.Dispose()",
            out.replace('\'', "''")
        );
        return vec![CaptureCommand {
            program: "powershell",
            args: vec!["-NoProfile".to_string(), "-Command".to_string(), script],
        }];
    }

    vec![
        CaptureCommand {
            program: "grim",
            args: vec![out.clone()],
        },
        CaptureCommand {
            program: "gnome-screenshot",
            args: vec!["-f".to_string(), out.clone()],
        },
        CaptureCommand {
            program: "scrot",
            args: vec!["--overwrite".to_string(), out.clone()],
        },
        CaptureCommand {
            program: "import",
            args: vec!["-window".to_string(), "root".to_string(), out],
        },
    ]
}

/// Capture the whole screen into `target` (PNG)
pub async fn capture_screen(target: &Path) -> Result<Capture, SystemError> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut last_failure = None;
    for cmd in capture_commands(target) {
        let output = match Command::new(cmd.program).args(&cmd.args).output().await {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Screen capture tool not installed: {}", cmd.program);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if output.status.success() && target.exists() {
            tracing::info!("Screenshot captured with {}: {}", cmd.program, target.display());
            return describe_capture(target);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::warn!("{} failed to capture the screen: {}", cmd.program, stderr);
        last_failure = Some(format!("{}: {}", cmd.program, stderr));
    }

    Err(match last_failure {
        Some(failure) => SystemError::CommandFailed(failure),
        None => SystemError::NoBackend("screen capture tool".to_string()),
    })
}

/// Size information for an image already on disk
pub fn describe_capture(path: &Path) -> Result<Capture, SystemError> {
    let (width, height) = image::image_dimensions(path)?;
    let file_size = std::fs::metadata(path)?.len();
    Ok(Capture {
        path: path.display().to_string(),
        width,
        height,
        file_size,
        file_size_human: format_size(file_size),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_describe_capture_reads_dimensions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shot.png");
        image::RgbImage::new(32, 16).save(&path).unwrap();

        let capture = describe_capture(&path).unwrap();
        assert_eq!((capture.width, capture.height), (32, 16));
        assert!(capture.file_size > 0);
    }

    #[test]
    fn test_capture_commands_target_the_path() {
        let target = Path::new("/tmp/shot.png");
        let commands = capture_commands(target);
        assert!(!commands.is_empty());
        for cmd in commands {
            assert!(cmd.args.iter().any(|a| a.contains("shot.png")));
        }
    }
}
