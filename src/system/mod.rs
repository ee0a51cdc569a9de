//! System utilities
//!
//! Resource monitoring, screen capture and application control. Everything
//! platform specific lives here so the action handlers stay portable.

pub mod apps;
pub mod resources;
pub mod screen;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("No supported {0} is available on this system")]
    NoBackend(String),
    #[error("Command failed: {0}")]
    CommandFailed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Human-readable byte size with one decimal ("1.5 KB")
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.0 B");
        assert_eq!(format_size(512), "512.0 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
        assert_eq!(format_size(2048 * 1024 * 1024 * 1024 * 1024), "2048.0 TB");
    }
}
