//! Function calls and interpretations exchanged with an interpreter.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use marionette_contracts::{
    capability::Arguments,
    error::{MarionetteError, MarionetteResult},
};

/// One function call as an LLM emits it: a name and a raw JSON argument
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

impl FunctionCall {
    /// Build a call from structured arguments.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.to_string(),
        }
    }

    /// Parse the raw argument string. An object becomes named arguments, an
    /// array positional ones; an empty string means no arguments.
    pub fn parse_arguments(&self) -> MarionetteResult<Arguments> {
        if self.arguments.trim().is_empty() {
            return Ok(Arguments::none());
        }
        let value: Value =
            serde_json::from_str(&self.arguments).map_err(|e| MarionetteError::InterpreterError {
                reason: format!("arguments for '{}' are not valid JSON: {e}", self.name),
            })?;
        Ok(Arguments::from(value))
    }
}

/// What an interpreter made of a command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpretation {
    /// Calls to dispatch, in order.
    pub calls: Vec<FunctionCall>,
    /// Free-text answer, if the interpreter produced one.
    pub reply: Option<String>,
}

impl Interpretation {
    pub fn calls(calls: Vec<FunctionCall>) -> Self {
        Self { calls, reply: None }
    }

    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            calls: Vec::new(),
            reply: Some(text.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.reply.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message of conversation context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}
