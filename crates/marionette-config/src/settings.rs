//! Deployment settings and their TOML schema.
//!
//! Every field has a default, so an empty document is a valid configuration:
//! the UI variant, a 100-entry audit log and the offline keyword interpreter.
//!
//! Example:
//! ```toml
//! variant = "event"
//!
//! [audit]
//! capacity = 250
//!
//! [assistant]
//! mode = "live"
//! model = "gpt-4o-mini"
//! temperature = 0.7
//! ```

use serde::{Deserialize, Serialize};

/// The capability set a deployment exposes. Exactly one per deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Ui,
    Event,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ui => "ui",
            Self::Event => "event",
        }
    }
}

/// How commands are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistantMode {
    /// Keyword heuristics only; no external service is contacted.
    #[default]
    Mock,
    /// The injected primary interpreter, with keyword fallback.
    Live,
}

/// Audit log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    /// Maximum number of retained entries. Oldest are evicted first.
    pub capacity: usize,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

/// Command interpreter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantSettings {
    pub mode: AssistantMode,
    pub model: String,
    /// Sampling temperature, `0.0..=2.0`.
    pub temperature: f64,
    pub max_tokens: u32,
    /// Number of past exchanges kept as conversation context.
    pub conversation_limit: usize,
    /// Requests the primary interpreter may serve before the session falls
    /// back to keyword heuristics.
    pub session_limit: usize,
    /// Base URL of the OpenAI-compatible chat completions API.
    pub api_base: String,
    /// Per-request timeout for the live interpreter.
    pub timeout_secs: u64,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            mode: AssistantMode::Mock,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 300,
            conversation_limit: 5,
            session_limit: 100,
            api_base: "https://api.openai.com/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

/// The complete deployment configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarionetteConfig {
    pub variant: Variant,
    pub audit: AuditSettings,
    pub assistant: AssistantSettings,
}
