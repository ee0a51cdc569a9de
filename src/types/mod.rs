//! Plain data shared by the assistant's components: settings, chat turns
//! and model status.

pub mod config;
pub mod message;
pub mod model;
