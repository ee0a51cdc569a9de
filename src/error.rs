//! Application-wide error type.

use thiserror::Error;

use crate::agent::tools::ToolError;
use crate::inference::InferenceError;
use crate::storage::conversations::HistoryError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("history error: {0}")]
    History(#[from] HistoryError),

    #[error("model error: {0}")]
    Inference(#[from] InferenceError),

    #[error("action error: {0}")]
    Tool(#[from] ToolError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
