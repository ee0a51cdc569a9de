//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup, after settings are loaded.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Initialise the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set. Output goes to stderr,
/// or is appended to `log_file` when one is given.
pub fn init(level: &str, log_file: Option<&Path>) -> Result<(), AppError> {
    let level = level.trim().to_lowercase();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    result.map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))
}

/// Logs how long an operation took when dropped
pub struct PerfTimer {
    operation: String,
    start: Instant,
}

impl PerfTimer {
    pub fn start(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        tracing::info!(
            operation = %self.operation,
            elapsed_ms = self.elapsed_ms(),
            "Performance: {} took {}ms",
            self.operation,
            self.elapsed_ms()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_succeeds_or_already_init() {
        match init("INFO", None) {
            Ok(()) => {}
            Err(AppError::Logger(msg)) if msg.contains("set subscriber") => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn perf_timer_measures() {
        let timer = PerfTimer::start("sleep");
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(timer.elapsed_ms() >= 5);
    }
}
