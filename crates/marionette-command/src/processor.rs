//! `CommandProcessor`: routes commands through an interpreter and dispatches
//! the resulting calls through a capability registry.
//!
//! Routing:
//!
//! 1. In mock mode, or with no primary interpreter, the keyword fallback
//!    handles every command.
//! 2. Once the session request limit is reached the fallback takes over
//!    until `reset_usage` is called.
//! 3. A primary interpreter error falls back for that command.
//!
//! Each call is dispatched on its own; a failed call is reported and the
//! remaining calls still run.

use std::collections::VecDeque;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use marionette_config::{AssistantMode, AssistantSettings};
use marionette_contracts::{
    capability::CapabilityOutput,
    error::{MarionetteError, MarionetteResult},
};
use marionette_core::{registry::CapabilityRegistry, traits::CapabilitySurface};

use crate::call::{FunctionCall, Interpretation, Role, Turn};
use crate::interpreter::Interpreter;

/// The result of one dispatched call.
#[derive(Debug)]
pub struct CallOutcome {
    pub call: FunctionCall,
    pub result: MarionetteResult<CapabilityOutput>,
}

/// Everything that happened while processing one command.
#[derive(Debug)]
pub struct CommandReport {
    /// Name of the interpreter that produced the calls.
    pub interpreter: &'static str,
    /// True when the keyword fallback stood in for the primary interpreter.
    pub fell_back: bool,
    /// Free-text reply from the interpreter, if any.
    pub reply: Option<String>,
    pub outcomes: Vec<CallOutcome>,
}

impl CommandReport {
    /// True when every dispatched call succeeded.
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CallOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

/// Request accounting for cost control.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub mode: AssistantMode,
    pub model: String,
    pub max_tokens: u32,
    pub request_count: usize,
    pub session_limit: usize,
    pub remaining_requests: usize,
}

/// Where free-text replies go when an interpreter answers without calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StorySink {
    capability: &'static str,
}

pub struct CommandProcessor {
    settings: AssistantSettings,
    primary: Option<Box<dyn Interpreter>>,
    fallback: Box<dyn Interpreter>,
    history: VecDeque<Turn>,
    request_count: usize,
    story_sink: Option<StorySink>,
}

impl CommandProcessor {
    /// A processor that uses `fallback` until a primary interpreter is set.
    pub fn new(settings: AssistantSettings, fallback: Box<dyn Interpreter>) -> Self {
        Self {
            settings,
            primary: None,
            fallback,
            history: VecDeque::new(),
            request_count: 0,
            story_sink: None,
        }
    }

    /// Set the primary (usually LLM-backed) interpreter.
    pub fn with_primary(mut self, primary: Box<dyn Interpreter>) -> Self {
        self.primary = Some(primary);
        self
    }

    /// Route text-only replies to `capability` as a paragraph story element.
    pub fn with_story_sink(mut self, capability: &'static str) -> Self {
        self.story_sink = Some(StorySink { capability });
        self
    }

    pub fn mode(&self) -> AssistantMode {
        self.settings.mode
    }

    /// True when the next command would reach the primary interpreter.
    pub fn is_live(&self) -> bool {
        self.settings.mode == AssistantMode::Live
            && self.primary.is_some()
            && self.request_count < self.settings.session_limit
    }

    pub fn usage_stats(&self) -> UsageStats {
        UsageStats {
            mode: self.settings.mode,
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            request_count: self.request_count,
            session_limit: self.settings.session_limit,
            remaining_requests: self.settings.session_limit.saturating_sub(self.request_count),
        }
    }

    /// Start a new session's request accounting.
    pub fn reset_usage(&mut self) {
        self.request_count = 0;
        info!("command processor usage counter reset");
    }

    /// Conversation context, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Turn> {
        self.history.iter()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Interpret `command` and dispatch every resulting call through
    /// `registry`.
    ///
    /// Returns `InterpreterError` only when the fallback itself fails.
    pub fn process<S: CapabilitySurface>(
        &mut self,
        registry: &CapabilityRegistry<S>,
        command: &str,
    ) -> MarionetteResult<CommandReport> {
        let (interpreter, fell_back, interpretation) = self.interpret(command)?;

        let mut outcomes = Vec::with_capacity(interpretation.calls.len());
        for call in &interpretation.calls {
            let result = call
                .parse_arguments()
                .and_then(|args| registry.dispatch(&call.name, args));
            match &result {
                Ok(_) => debug!(function = %call.name, "function call applied"),
                Err(e) => warn!(function = %call.name, error = %e, "function call failed"),
            }
            outcomes.push(CallOutcome {
                call: call.clone(),
                result,
            });
        }

        if interpretation.calls.is_empty() {
            if let (Some(text), Some(sink)) = (&interpretation.reply, self.story_sink) {
                let call = FunctionCall::new(
                    sink.capability,
                    json!({ "type": "paragraph", "content": text }),
                );
                let result = call
                    .parse_arguments()
                    .and_then(|args| registry.dispatch(&call.name, args));
                outcomes.push(CallOutcome { call, result });
            }
        }

        let summary = match &interpretation.reply {
            Some(text) => text.clone(),
            None => {
                let names: Vec<&str> = interpretation.calls.iter().map(|c| c.name.as_str()).collect();
                format!("Executed: {}", names.join(", "))
            }
        };
        self.remember(Role::User, command);
        self.remember(Role::Assistant, &summary);

        let report = CommandReport {
            interpreter,
            fell_back,
            reply: interpretation.reply,
            outcomes,
        };
        info!(
            interpreter,
            fell_back,
            calls = report.outcomes.len(),
            failures = report.failures().count(),
            "command processed"
        );
        Ok(report)
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn interpret(&mut self, command: &str) -> MarionetteResult<(&'static str, bool, Interpretation)> {
        let history: Vec<Turn> = self.history.iter().cloned().collect();

        if self.settings.mode == AssistantMode::Live {
            if self.request_count >= self.settings.session_limit {
                warn!(
                    session_limit = self.settings.session_limit,
                    "session request limit reached, using keyword interpreter"
                );
            } else if let Some(primary) = self.primary.as_mut() {
                self.request_count += 1;
                match primary.interpret(command, &history) {
                    Ok(interpretation) => return Ok((primary.name(), false, interpretation)),
                    Err(e) => {
                        warn!(interpreter = primary.name(), error = %e, "primary interpreter failed, falling back");
                    }
                }
            }
        }

        let fell_back = self.settings.mode == AssistantMode::Live;
        let interpretation = self
            .fallback
            .interpret(command, &history)
            .map_err(|e| MarionetteError::InterpreterError {
                reason: format!("fallback interpreter failed: {e}"),
            })?;
        Ok((self.fallback.name(), fell_back, interpretation))
    }

    fn remember(&mut self, role: Role, content: &str) {
        self.history.push_back(Turn {
            role,
            content: content.to_string(),
        });
        let cap = self.settings.conversation_limit * 2;
        while self.history.len() > cap {
            self.history.pop_front();
        }
    }
}
