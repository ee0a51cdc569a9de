//! Natural-language action routing
//!
//! An ordered table of regular expressions over the lower-cased input. The
//! first route that matches and accepts its arguments decides the action;
//! input that matches nothing goes to the conversational model instead.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::agent::tools::{ToolRegistry, ToolResult};
use crate::logging::PerfTimer;
use crate::storage::profile::{resolve_alias_in, resolve_exact_alias, UserDirectories};

/// Polite lead-ins allowed before a command
const LEAD_IN: &str = r"^(?:(?:please|jarvis|hey\s+jarvis|can\s+you|could\s+you|would\s+you)[,\s]+)*";

/// Top-level domains accepted without an explicit scheme
const KNOWN_TLDS: &[&str] = &[
    "com", "org", "net", "io", "dev", "ai", "edu", "gov", "co", "uk", "de", "fr", "app", "me",
    "info", "tv",
];

/// What happened to one input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub action_taken: Option<String>,
    pub success: bool,
    pub result: Option<ToolResult>,
    pub error: Option<String>,
}

impl DispatchOutcome {
    fn no_action() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// True when a route matched
    pub fn is_action(&self) -> bool {
        self.action_taken.is_some()
    }
}

/// An entry of the action catalogue
#[derive(Debug, Clone, Serialize)]
pub struct ActionCategory {
    pub category: &'static str,
    pub actions: Vec<&'static str>,
}

/// A matched route, with access to the captures in the user's own casing
struct RouteMatch<'a> {
    caps: Captures<'a>,
    original: &'a str,
    lower: &'a str,
}

impl RouteMatch<'_> {
    /// Capture group `i`, taken from the original text when lower-casing kept
    /// the byte layout
    fn arg(&self, i: usize) -> Option<String> {
        let m = self.caps.get(i)?;
        let text = if self.original.len() == self.lower.len() {
            self.original.get(m.range()).unwrap_or(m.as_str())
        } else {
            m.as_str()
        };
        let text = text.trim().trim_matches(|c| c == '"' || c == '\'');
        (!text.is_empty()).then(|| text.to_string())
    }

    fn has_word(&self, words: &[&str]) -> bool {
        self.lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|w| words.contains(&w))
    }
}

type ArgsFn = fn(&RouteMatch<'_>, &UserDirectories) -> Option<Value>;

struct Route {
    pattern: Regex,
    action: &'static str,
    args: ArgsFn,
}

fn route(pattern: &str, action: &'static str, args: ArgsFn) -> Route {
    let full = pattern.replace("{P}", LEAD_IN);
    Route {
        pattern: Regex::new(&full).expect("route regex must compile"),
        action,
        args,
    }
}

fn no_args(_: &RouteMatch<'_>, _: &UserDirectories) -> Option<Value> {
    Some(json!({}))
}

fn strip_trailing_words<'a>(text: &'a str, words: &[&str]) -> &'a str {
    let mut text = text.trim_end();
    while let Some((head, last)) = text.rsplit_once(char::is_whitespace) {
        if words.contains(&last.to_lowercase().as_str()) {
            text = head.trim_end();
        } else {
            break;
        }
    }
    text
}

fn strip_leading_words<'a>(text: &'a str, words: &[&str]) -> &'a str {
    let mut text = text.trim_start();
    while let Some((first, rest)) = text.split_once(char::is_whitespace) {
        if words.contains(&first.to_lowercase().as_str()) {
            text = rest.trim_start();
        } else {
            break;
        }
    }
    text
}

fn looks_like_path(text: &str) -> bool {
    text.contains('/')
        || text.contains('\\')
        || text.starts_with('~')
        || text.starts_with('.')
        || text.as_bytes().get(1) == Some(&b':')
}

/// Map directory words and aliases to a path. Returns `None` when the text
/// is neither a known directory name nor path-like.
pub fn resolve_directory(raw: &str, dirs: &UserDirectories) -> Option<String> {
    let cleaned = strip_trailing_words(raw, &["folder", "directory", "dir", "recursively", "recursive"]);
    let cleaned = strip_leading_words(cleaned, &["my", "the", "all"]);

    match cleaned.to_lowercase().as_str() {
        "" | "here" | "current" | "this" | "." => return Some(".".to_string()),
        "home" => return Some(dirs.home.clone()),
        _ => {}
    }
    if looks_like_path(cleaned) {
        return Some(cleaned.to_string());
    }
    resolve_alias_in(dirs, cleaned)
}

/// Like [`resolve_directory`], but keeps unknown names as relative paths
fn directory_or_literal(raw: &str, dirs: &UserDirectories) -> String {
    resolve_directory(raw, dirs).unwrap_or_else(|| {
        strip_trailing_words(raw, &["folder", "directory", "recursively", "recursive"]).to_string()
    })
}

fn list_args(m: &RouteMatch<'_>, path: String) -> Value {
    json!({
        "path": path,
        "recursive": m.has_word(&["recursive", "recursively", "all"]),
    })
}

fn list_named(m: &RouteMatch<'_>, dirs: &UserDirectories) -> Option<Value> {
    let raw = m.arg(1)?;
    Some(list_args(m, directory_or_literal(&raw, dirs)))
}

/// Loose phrasings only list directories the profile knows or path-like text
fn list_known(m: &RouteMatch<'_>, dirs: &UserDirectories) -> Option<Value> {
    let raw = m.arg(1).or_else(|| m.arg(2))?;
    let path = resolve_directory(&raw, dirs)?;
    Some(list_args(m, path))
}

fn list_current(m: &RouteMatch<'_>, _: &UserDirectories) -> Option<Value> {
    Some(list_args(m, ".".to_string()))
}

/// A copy/move target names a directory only when it is one outright;
/// "photo_old.jpg" stays a file name even though it mentions photos.
fn destination_directory(raw: &str, dirs: &UserDirectories) -> Option<String> {
    if looks_like_path(raw) {
        return None;
    }
    let cleaned = strip_trailing_words(raw, &["folder", "directory", "dir"]);
    let cleaned = strip_leading_words(cleaned, &["my", "the"]);
    match cleaned.to_lowercase().as_str() {
        "" => None,
        "here" | "current" | "this" => Some(".".to_string()),
        "home" => Some(dirs.home.clone()),
        _ => resolve_exact_alias(dirs, raw).or_else(|| resolve_exact_alias(dirs, cleaned)),
    }
}

fn source_destination(m: &RouteMatch<'_>, dirs: &UserDirectories) -> Option<Value> {
    let source = m.arg(1)?;
    let destination = m.arg(2)?;
    let destination = destination_directory(&destination, dirs).unwrap_or(destination);
    Some(json!({ "source": source, "destination": destination }))
}

fn delete_args(m: &RouteMatch<'_>, _: &UserDirectories) -> Option<Value> {
    let raw = m.arg(1)?;
    let path = strip_trailing_words(&raw, &["confirm", "confirmed", "yes", "now", "please"]);
    if path.is_empty() {
        return None;
    }
    Some(json!({
        "path": path,
        "confirm": m.has_word(&["confirm", "confirmed", "yes"]),
    }))
}

fn search_args(m: &RouteMatch<'_>, dirs: &UserDirectories) -> Option<Value> {
    let query = m.arg(1)?;
    let directory = directory_or_literal(&m.arg(2)?, dirs);
    let (query, file_type) = match query.strip_prefix("*.") {
        Some(ext) => (ext.to_string(), Some(ext.to_string())),
        None => (query, None),
    };
    Some(json!({ "directory": directory, "query": query, "file_type": file_type }))
}

fn path_arg(m: &RouteMatch<'_>, _: &UserDirectories) -> Option<Value> {
    Some(json!({ "path": m.arg(1)? }))
}

static HOURS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(?:hours?|hrs?|h)\b").expect("hours regex must compile"));

fn cleanup_args(m: &RouteMatch<'_>, _: &UserDirectories) -> Option<Value> {
    let hours = HOURS
        .captures(m.lower)
        .and_then(|c| c.get(1))
        .and_then(|h| h.as_str().parse::<u64>().ok());
    Some(match hours {
        Some(hours) => json!({ "hours": hours }),
        None => json!({}),
    })
}

fn history_args(m: &RouteMatch<'_>, _: &UserDirectories) -> Option<Value> {
    let limit = m
        .lower
        .split_whitespace()
        .find_map(|w| w.parse::<u64>().ok())
        .unwrap_or(10);
    Some(json!({ "limit": limit }))
}

fn website_args(m: &RouteMatch<'_>, _: &UserDirectories) -> Option<Value> {
    let url = m.arg(1)?;
    let lower = url.to_lowercase();
    let host = lower
        .split("://")
        .last()
        .unwrap_or(&lower)
        .split(|c| c == '/' || c == ':')
        .next()
        .unwrap_or_default();
    let tld = host.rsplit('.').next().unwrap_or_default();
    let explicit = lower.starts_with("http://") || lower.starts_with("https://") || host.starts_with("www.");
    (explicit || KNOWN_TLDS.contains(&tld)).then(|| json!({ "url": url }))
}

fn app_args(m: &RouteMatch<'_>, _: &UserDirectories) -> Option<Value> {
    let name = m.arg(1)?;
    let plausible = name.split_whitespace().count() <= 3 && !looks_like_path(&name) && !name.contains('.');
    plausible.then(|| json!({ "name": name }))
}

fn window_args(m: &RouteMatch<'_>, _: &UserDirectories) -> Option<Value> {
    let name = m.arg(1)?;
    (name.split_whitespace().count() <= 4).then(|| json!({ "name": name }))
}

fn media_args(m: &RouteMatch<'_>, _: &UserDirectories) -> Option<Value> {
    let verb = (1..=3).find_map(|i| m.caps.get(i))?.as_str();
    let action = match verb {
        "pause" | "stop" | "resume" | "play" => "play_pause",
        "next" | "skip" => "next",
        "previous" | "back" => "previous",
        _ => return None,
    };
    Some(json!({ "action": action }))
}

static ROUTES: Lazy<Vec<Route>> = Lazy::new(|| {
    vec![
        // Screen analysis
        route(
            r"{P}(?:analy[sz]e|describe|read)\s+(?:what'?s\s+on\s+)?(?:my\s+|the\s+)?(?:screen|display|screenshot)\b",
            "analyze_screenshot",
            no_args,
        ),
        route(
            r"\b(?:what'?s|what\s+is)\s+(?:on|in)\s+(?:my\s+|the\s+)?(?:screen|display|screenshot)\b",
            "analyze_screenshot",
            no_args,
        ),
        route(
            r"\bwhat\s+(?:do\s+you\s+see|am\s+i\s+looking\s+at)\b|\btell\s+me\s+about\s+(?:my\s+|the\s+)?screen\b",
            "analyze_screenshot",
            no_args,
        ),
        // Screen capture
        route(
            r"{P}(?:(?:take|grab|capture)\s+(?:a\s+|the\s+)?)?screen\s?shot\b|{P}(?:capture|grab)\s+(?:the\s+|my\s+)?screen\b",
            "screenshot",
            no_args,
        ),
        // Temp storage
        route(
            r"\b(?:clean|cleanup|clear|purge)\s+(?:up\s+)?(?:the\s+|my\s+)?(?:temp|temporary)\s+(?:files?|folder|storage)\b",
            "cleanup_temp",
            cleanup_args,
        ),
        route(
            r"\b(?:show|list|check)\s+(?:the\s+|my\s+)?(?:temp|temporary)\s+(?:files?|folder|storage)\b|\btemp\s+(?:info|information|status|usage)\b",
            "temp_info",
            no_args,
        ),
        route(
            r"\b(?:operation|file)\s+history\b|\brecent\s+(?:file\s+)?operations\b",
            "operation_history",
            history_args,
        ),
        // File operations
        route(
            r"{P}(?:copy|duplicate|back\s?up)\s+(?:the\s+)?(?:file\s+|folder\s+)?(.+?)\s+(?:to|into)\s+(.+)$",
            "copy_file",
            source_destination,
        ),
        route(
            r"{P}(?:move|relocate|transfer|rename)\s+(?:the\s+)?(?:file\s+|folder\s+)?(.+?)\s+(?:to|into|as)\s+(.+)$",
            "move_file",
            source_destination,
        ),
        route(
            r"{P}(?:delete|remove|trash|erase)\s+(?:the\s+)?(?:file\s+|folder\s+)?(.+)$",
            "delete_file",
            delete_args,
        ),
        route(
            r"{P}(?:search|find)\s+(?:for\s+)?(.+?)\s+(?:in|on|under|inside)\s+(.+)$",
            "search_files",
            search_args,
        ),
        route(
            r"{P}(?:analy[sz]e|examine|inspect)\s+(?:the\s+)?(?:file\s+)?(.+)$",
            "analyze_file",
            path_arg,
        ),
        // Listing
        route(
            r"{P}(?:list|show|display)\s+(?:me\s+)?(?:all\s+)?(?:the\s+)?(?:files?|contents?|folders?)\s+(?:in|on|at|of|inside)\s+(.+)$",
            "list_files",
            list_named,
        ),
        route(
            r"{P}(?:list|show|display)\s+(?:me\s+)?(?:all\s+)?(?:the\s+)?(?:files?|contents?)(?:\s+here)?$",
            "list_files",
            list_current,
        ),
        route(
            r"\b(?:what|which)\s+(?:files?|contents?)\s+(?:are\s+|is\s+)?(?:there\s+)?(?:in|on|at|inside)\s+(.+)$",
            "list_files",
            list_named,
        ),
        route(
            r"{P}(?:browse|explore|look\s+in|check|open)\s+(?:my\s+|the\s+)?(.+?\s+(?:folder|directory))$",
            "list_files",
            list_named,
        ),
        route(
            r"{P}(?:browse|explore|look\s+in)\s+(.+)$|\bwhat'?s\s+in\s+(?:my\s+|the\s+)?(.+)$",
            "list_files",
            list_known,
        ),
        // Applications and windows
        route(
            r"{P}(?:open|go\s+to|visit|browse\s+to)\s+(?:the\s+)?(?:website\s+|site\s+|url\s+|page\s+)?((?:https?://)?[a-z0-9-]+(?:\.[a-z0-9-]+)+(?::\d+)?(?:/\S*)?)$",
            "open_website",
            website_args,
        ),
        route(
            r"{P}(?:switch|cycle)\s+(?:between\s+)?(?:the\s+)?windows?$|{P}alt[\s-]*tab$",
            "switch_window",
            no_args,
        ),
        route(
            r"{P}(pause|stop|resume|play)\s+(?:the\s+)?(?:music|spotify|song|track|playback)$|{P}(next|skip|previous|back)\s+(?:(?:song|track)\s+)?(?:on\s+)?spotify$|{P}(next|skip|previous)\s+(?:this\s+|the\s+)?(?:song|track)$",
            "media_control",
            media_args,
        ),
        route(
            r"{P}(?:switch\s+to|focus(?:\s+on)?|bring\s+up)\s+(?:the\s+)?(.+?)(?:\s+window)?$",
            "focus_window",
            window_args,
        ),
        route(
            r"{P}(?:open|launch|start)\s+(?:up\s+)?(?:the\s+)?(?:app\s+|application\s+|program\s+)?(.+?)(?:\s+(?:app|application|program))?$",
            "open_application",
            app_args,
        ),
        // System status
        route(
            r"\bsystem\s+(?:info|information|status|stats)\b|{P}(?:info|status)$|\bhow\s+is\s+(?:the\s+|my\s+)?(?:system|computer|pc|machine)\s+(?:doing|performing|running)\b|\b(?:cpu|memory|ram|disk)\s+usage\b",
            "system_info",
            no_args,
        ),
    ]
});

/// Routes input text to registered action handlers
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// The action and parameters for `input`, if any route accepts it
    pub fn route(&self, input: &str, dirs: &UserDirectories) -> Option<(&'static str, Value)> {
        let original = input.trim().trim_end_matches(&['.', '!', '?'][..]).trim_end();
        let lower = original.to_lowercase();

        for route in ROUTES.iter() {
            let Some(caps) = route.pattern.captures(&lower) else {
                continue;
            };
            let m = RouteMatch {
                caps,
                original,
                lower: &lower,
            };
            match (route.args)(&m, dirs) {
                Some(params) => {
                    tracing::info!("Action detected: {} ({})", route.action, route.pattern.as_str());
                    return Some((route.action, params));
                }
                None => {
                    tracing::debug!("Route {} matched but rejected its arguments", route.action);
                }
            }
        }
        None
    }

    /// Route and run `input`. Input no route accepts is reported as a
    /// successful no-op so the caller can hand it to the model.
    pub async fn dispatch(&self, input: &str, dirs: &UserDirectories) -> DispatchOutcome {
        let Some((action, params)) = self.route(input, dirs) else {
            tracing::info!("No action pattern matched");
            return DispatchOutcome::no_action();
        };

        let _timer = PerfTimer::start(format!("Action execution: {}", action));
        match self.registry.execute(action, params).await {
            Ok(result) => DispatchOutcome {
                action_taken: Some(action.to_string()),
                success: result.success,
                error: (!result.success).then(|| result.message.clone()),
                result: Some(result),
            },
            Err(e) => {
                tracing::error!("Action {} failed: {}", action, e);
                DispatchOutcome {
                    action_taken: Some(action.to_string()),
                    success: false,
                    result: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// The categorised catalogue of what the dispatcher understands
pub fn available_actions() -> Vec<ActionCategory> {
    vec![
        ActionCategory {
            category: "File Management",
            actions: vec![
                "List files in directory",
                "Copy files/directories",
                "Move/rename files",
                "Delete files (with backup)",
                "Analyze file properties",
                "Search files by name/content",
                "Show recent file operations",
            ],
        },
        ActionCategory {
            category: "Screen Capture & Analysis",
            actions: vec!["Take screenshot", "Analyze screen content"],
        },
        ActionCategory {
            category: "Applications & Windows",
            actions: vec![
                "Open applications",
                "Open websites",
                "Switch to a window",
                "Cycle windows (alt-tab)",
                "Control media playback",
            ],
        },
        ActionCategory {
            category: "Temporary File Management",
            actions: vec!["Clean up temp files", "Show temp folder info"],
        },
        ActionCategory {
            category: "System Information",
            actions: vec!["Get system status", "Check performance metrics"],
        },
    ]
}
