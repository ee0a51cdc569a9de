//! Model inference
//!
//! This module handles all interaction with the local Ollama server: the
//! HTTP client, image preparation for the vision model, and the
//! conversational engine that keeps the session history.

pub mod client;
pub mod engine;
pub mod image;

pub use client::{GenerationOptions, OllamaClient};
pub use engine::{AiEngine, EngineResponse, VisionModel};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Ollama server not reachable at {0}")]
    Unavailable(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Ollama API error ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("Ollama API error: {0}")]
    Api(String),
    #[error("Image error: {0}")]
    Image(#[from] ::image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
