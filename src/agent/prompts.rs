//! Prompts for the assistant
//!
//! The system prompt is rebuilt whenever the online mode changes so the
//! model always sees the current status and time.

use chrono::{DateTime, Local};

/// Sent with every screenshot to the vision model
pub const SCREEN_ANALYSIS_PROMPT: &str = r#"Analyze this screenshot and provide a detailed description of what you see. Be accurate and only describe what is actually visible.

Please describe:
1. Applications and windows that are open
2. Text content that is clearly readable
3. UI elements like buttons, menus, toolbars
4. File names, folder contents, or documents visible
5. Overall layout and what the user appears to be doing

Be factual and precise. If something is unclear or partially obscured, mention that rather than guessing."#;

/// Default prompt for a plain image description
pub const IMAGE_DESCRIPTION_PROMPT: &str = "Describe this image in detail.";

const CAPABILITIES: &str = r#"Capabilities:
- File management (list, copy, move, delete with backup, analyze, search)
- Screen capture and screenshot analysis
- Launching applications, opening websites and focusing windows
- System information (CPU, memory, disk, network)
- Temporary file management"#;

const GUIDELINES: &str = r#"Guidelines:
1. Be helpful, concise, and accurate
2. Respect user privacy and security
3. Explain what you're doing and why
4. Ask for clarification when needed
5. Perform requested actions directly when they are safe"#;

/// Build the system prompt for the current mode and time
pub fn build_system_prompt(online: bool, now: DateTime<Local>, extra_context: Option<&str>) -> String {
    let mode = if online { "online" } else { "offline" };
    let mut prompt = format!(
        "You are Jarvis, a helpful AI assistant running locally on the user's computer.\n\n\
         Current Status:\n\
         - Mode: {}\n\
         - Time: {}\n\
         - System: {} ({})\n\n\
         {}\n\n\
         {}\n\n\
         Remember: You are running locally and privately on the user's system.",
        mode,
        now.format("%Y-%m-%d %H:%M:%S"),
        std::env::consts::OS,
        std::env::consts::ARCH,
        CAPABILITIES,
        GUIDELINES,
    );

    if let Some(extra) = extra_context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str("\n\nAdditional Context:\n");
        prompt.push_str(extra);
    }
    prompt
}

/// Ask the model to explain a failed action in plain words
pub fn build_error_explanation_prompt(user_input: &str, action: &str, error: &str) -> String {
    format!(
        "The user asked: \"{}\"\n\
         I tried to perform the action '{}' but it failed with this error:\n{}\n\n\
         Explain briefly, in one or two sentences, what went wrong and what the user could try instead. \
         Do not claim the action succeeded.",
        user_input, action, error
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_reflects_mode() {
        let now = Local::now();
        assert!(build_system_prompt(false, now, None).contains("Mode: offline"));
        assert!(build_system_prompt(true, now, None).contains("Mode: online"));
    }

    #[test]
    fn test_extra_context_appended() {
        let prompt = build_system_prompt(false, Local::now(), Some("User prefers short answers"));
        assert!(prompt.ends_with("Additional Context:\nUser prefers short answers"));

        let prompt = build_system_prompt(false, Local::now(), Some("  "));
        assert!(!prompt.contains("Additional Context"));
    }

    #[test]
    fn test_error_prompt_mentions_everything() {
        let prompt = build_error_explanation_prompt("delete x", "delete_file", "Path does not exist");
        assert!(prompt.contains("delete x"));
        assert!(prompt.contains("delete_file"));
        assert!(prompt.contains("Path does not exist"));
    }
}
