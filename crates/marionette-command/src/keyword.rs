//! Deterministic keyword interpreters used offline and as the fallback.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use marionette_contracts::error::MarionetteResult;

use crate::call::{FunctionCall, Interpretation, Turn};
use crate::interpreter::Interpreter;

static BUTTON_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:button.*?["']([^"']+)["'])|(?:button\s+(?:that\s+says\s+|saying\s+|with\s+text\s+)?["']?([^"'\n]+)["']?)"#)
        .expect("valid button pattern")
});
static COUNTER_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:counter.*?["']([^"']+)["'])|(?:counter\s+(?:for\s+|called\s+|labeled\s+)?["']?([^"'\n]+)["']?)"#)
        .expect("valid counter pattern")
});
static CARD_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:card.*?["']([^"']+)["'])|(?:card\s+(?:for\s+|called\s+|titled\s+)?["']?([^"'\n]+)["']?)"#)
        .expect("valid card pattern")
});
static QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["']([^"']+)["']"#).expect("valid quote pattern"));
static EVENT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:called|named|titled)\s+["']?([^"'\n,.]+)["']?"#).expect("valid name pattern")
});
static EVENT_DESCRIPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:description|about)\s*[:\-]?\s*["']([^"']+)["']"#)
        .expect("valid description pattern")
});
static PRICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\s*(\d+(?:\.\d+)?)").expect("valid price pattern"));

/// Longest command excerpt echoed back in the help paragraph.
const MAX_ECHO_CHARS: usize = 200;

const COLORS: [&str; 6] = ["purple", "blue", "green", "red", "gold", "magic"];

/// First capture group that matched, trimmed and non-empty.
fn extract(pattern: &Regex, command: &str) -> Option<String> {
    let caps = pattern.captures(command)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn any(command: &str, words: &[&str]) -> bool {
    words.iter().any(|w| command.contains(w))
}

// ── UI variant ────────────────────────────────────────────────────────────────

/// Keyword heuristics for the UI-manipulation capabilities.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordInterpreter;

impl KeywordInterpreter {
    pub fn new() -> Self {
        Self
    }

    fn story(cmd: &str) -> Vec<FunctionCall> {
        let (theme, title, button, counter) = if cmd.contains("pirate") {
            (
                Some("ocean"),
                "🏴‍☠️ The Treasure of Captain Blackbeard",
                ("🗝️ Find Treasure", "gold"),
                Some(("Treasure Found", "gold")),
            )
        } else if any(cmd, &["space", "galaxy"]) {
            (
                Some("space"),
                "🚀 Mission to Alpha Centauri",
                ("🚀 Launch", "blue"),
                Some(("Light Years", "blue")),
            )
        } else if any(cmd, &["magic", "wizard", "fairy"]) {
            (
                Some("magical"),
                "🧙 The Academy of Mystic Arts",
                ("✨ Cast Spell", "magic"),
                Some(("Spells Mastered", "purple")),
            )
        } else {
            (None, "📖 An AI-Generated Adventure", ("Continue Story", "purple"), None)
        };

        let mut calls = Vec::new();
        if let Some(theme) = theme {
            calls.push(FunctionCall::new("setTheme", json!({ "themeName": theme })));
        }
        calls.push(FunctionCall::new(
            "addStoryElement",
            json!({ "type": "title", "content": title }),
        ));
        calls.push(FunctionCall::new(
            "addButton",
            json!({ "text": button.0, "style": { "color": button.1 } }),
        ));
        if let Some((label, color)) = counter {
            calls.push(FunctionCall::new(
                "addCounter",
                json!({ "label": label, "style": { "color": color } }),
            ));
        }
        calls
    }

    fn theme_for(cmd: &str) -> Option<&'static str> {
        if any(cmd, &["space", "stars"]) {
            Some("space")
        } else if any(cmd, &["ocean", "blue"]) {
            Some("ocean")
        } else if any(cmd, &["magic", "purple"]) {
            Some("magical")
        } else if any(cmd, &["sunset", "orange"]) {
            Some("sunset")
        } else if any(cmd, &["forest", "green"]) {
            Some("forest")
        } else if any(cmd, &["corporate", "business"]) {
            Some("corporate")
        } else if any(cmd, &["default", "reset", "plain"]) {
            Some("default")
        } else {
            None
        }
    }

    fn help(command: &str) -> FunctionCall {
        let command = if command.chars().count() > MAX_ECHO_CHARS {
            let excerpt: String = command.chars().take(MAX_ECHO_CHARS).collect();
            format!("{excerpt}...")
        } else {
            command.to_string()
        };
        FunctionCall::new(
            "addStoryElement",
            json!({
                "type": "paragraph",
                "content": format!(
                    "AI processed: \"{command}\" - Try commands like \"create a magical story\", \"add purple buttons\", or \"change to space theme\""
                ),
            }),
        )
    }
}

impl Interpreter for KeywordInterpreter {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn interpret(&mut self, command: &str, _history: &[Turn]) -> MarionetteResult<Interpretation> {
        let cmd = command.to_lowercase();

        let calls = if any(&cmd, &["story", "tale", "adventure"]) {
            Self::story(&cmd)
        } else if cmd.contains("button") {
            let color = COLORS.iter().find(|c| cmd.contains(*c)).copied().unwrap_or("purple");
            let text = extract(&BUTTON_TEXT, command).unwrap_or_else(|| "AI Generated Button".into());
            vec![FunctionCall::new(
                "addButton",
                json!({ "text": text, "style": { "color": color } }),
            )]
        } else if any(&cmd, &["background", "theme"]) {
            match Self::theme_for(&cmd) {
                Some(theme) => vec![FunctionCall::new("setTheme", json!({ "themeName": theme }))],
                None => vec![Self::help(command)],
            }
        } else if any(&cmd, &["counter", "count"]) {
            let label = extract(&COUNTER_LABEL, command).unwrap_or_else(|| "Progress Counter".into());
            let color = if cmd.contains("blue") {
                "blue"
            } else if cmd.contains("green") {
                "green"
            } else {
                "purple"
            };
            vec![FunctionCall::new(
                "addCounter",
                json!({ "label": label, "style": { "color": color } }),
            )]
        } else if any(&cmd, &["card", "dashboard"]) {
            let title = extract(&CARD_TITLE, command).unwrap_or_else(|| "AI Generated Card".into());
            let content = format!(
                "This {} was created by AI based on your command.",
                title.to_lowercase()
            );
            vec![FunctionCall::new(
                "addCard",
                json!({ "title": title, "content": content, "style": { "color": "blue" } }),
            )]
        } else {
            vec![Self::help(command)]
        };

        Ok(Interpretation::calls(calls))
    }
}

// ── Event variant ─────────────────────────────────────────────────────────────

const EVENT_TYPES: [&str; 8] = [
    "conference",
    "workshop",
    "festival",
    "meetup",
    "seminar",
    "concert",
    "training",
    "networking",
];

const TICKET_TYPES: [(&str, &str); 6] = [
    ("general admission", "General Admission"),
    ("vip", "VIP"),
    ("early bird", "Early Bird"),
    ("student", "Student"),
    ("premium", "Premium"),
    ("standard", "Standard"),
];

/// Keyword heuristics for the event-creation capabilities.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventKeywordInterpreter;

impl EventKeywordInterpreter {
    pub fn new() -> Self {
        Self
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Interpreter for EventKeywordInterpreter {
    fn name(&self) -> &'static str {
        "event-keyword"
    }

    fn interpret(&mut self, command: &str, _history: &[Turn]) -> MarionetteResult<Interpretation> {
        let cmd = command.to_lowercase();
        let event_type = EVENT_TYPES.iter().find(|t| cmd.contains(*t)).copied();
        let mut calls = Vec::new();

        let name = extract(&EVENT_NAME, command)
            .or_else(|| {
                if any(&cmd, &["description", "about"]) {
                    None
                } else {
                    extract(&QUOTED, command)
                }
            })
            .or_else(|| event_type.map(|t| format!("New {}", capitalize(t))));
        if let Some(name) = name {
            calls.push(FunctionCall::new("setEventName", json!({ "name": name })));
        }

        let description = extract(&EVENT_DESCRIPTION, command).or_else(|| {
            event_type.map(|t| format!("A {t} for everyone interested in taking part."))
        });
        if let Some(description) = description {
            calls.push(FunctionCall::new(
                "setEventDescription",
                json!({ "description": description }),
            ));
        }

        let tickets: Vec<&str> = TICKET_TYPES
            .iter()
            .filter(|(keyword, _)| cmd.contains(keyword))
            .map(|(_, name)| *name)
            .collect();
        let price = PRICE
            .captures(command)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok());
        for ticket in &tickets {
            let args = match price {
                Some(p) if tickets.len() == 1 => json!({ "name": ticket, "price": p }),
                _ => json!({ "name": ticket }),
            };
            calls.push(FunctionCall::new("addTicketType", args));
        }

        if any(&cmd, &["waitlist", "wait list", "waiting list"]) {
            let enabled = !any(&cmd, &["no waitlist", "without", "disable", "turn off", "remove"]);
            calls.push(FunctionCall::new("toggleWaitlist", json!({ "enabled": enabled })));
        }

        if calls.is_empty() {
            return Ok(Interpretation::reply(
                "Try commands like \"create a tech conference called 'RustConf'\", \"add VIP tickets for $50\", or \"enable the waitlist\"",
            ));
        }
        Ok(Interpretation::calls(calls))
    }
}
