//! Jarvis Library
//!
//! A local AI assistant: natural-language file, screen and system actions,
//! with a locally hosted model for everything else.

pub mod agent;
pub mod app;
pub mod error;
pub mod inference;
pub mod logging;
pub mod storage;
pub mod system;
pub mod types;
