//! Assistant actions
//!
//! This module maps user requests to actions: the routing table, the action
//! handlers, their safety checks and the text shown for their results.

pub mod dispatcher;
pub mod format;
pub mod prompts;
pub mod safety;
pub mod tools;

pub use dispatcher::{available_actions, DispatchOutcome, Dispatcher};
pub use format::{format_action_failure, format_action_response};
pub use safety::{PermissionLevel, SafetyManager};
pub use tools::{Tool, ToolError, ToolRegistry, ToolResult};
