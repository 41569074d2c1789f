//! `OpenAiInterpreter`: live interpretation through an OpenAI-compatible
//! chat completions API with function calling.
//!
//! The request carries the system prompt, the recent conversation, the
//! command and one `tools` entry per capability. Tool calls in the response
//! become `FunctionCall`s; a plain text answer becomes the reply. The HTTP
//! exchange sits behind `CompletionTransport` so the request and response
//! mapping can run without a network.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::debug;

use marionette_config::AssistantSettings;
use marionette_contracts::{
    capability::CapabilityDescriptor,
    error::{MarionetteError, MarionetteResult},
};
use marionette_schema::function_definitions;

use crate::call::{FunctionCall, Interpretation, Turn};
use crate::interpreter::Interpreter;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const UI_SYSTEM_PROMPT: &str = "You turn natural-language requests into calls to a fixed set of \
UI functions. You cannot run code or reach any other system; the functions are all you have.

You can add buttons, cards, counters, images and story elements (titles, paragraphs, characters), \
change the background or apply a theme, and increment counters.

For creative requests such as \"build a pirate adventure\", combine several calls into one coherent \
scene and keep colors and themes consistent with the mood. If a request cannot be met with these \
functions, say briefly what you can do instead.";

pub const EVENT_SYSTEM_PROMPT: &str = "You help set up a single event by calling a fixed set of \
functions: set the event name, set the description, add or update ticket types with optional \
prices, and switch the waitlist on or off. You cannot run code or reach any other system.

Pick a clear name and a description of at least a sentence. When a ticket type already exists, \
calling addTicketType with the same name updates it. If a request cannot be met with these \
functions, say briefly what you can do instead.";

fn failure(reason: impl Into<String>) -> MarionetteError {
    MarionetteError::InterpreterError {
        reason: reason.into(),
    }
}

// ── Transport ─────────────────────────────────────────────────────────────────

/// Sends one chat completions request body and returns the response body.
pub trait CompletionTransport: Send {
    fn complete(&self, body: &Value) -> MarionetteResult<Value>;
}

/// `reqwest` transport driven by its own single-threaded tokio runtime.
///
/// `complete` blocks; do not call it from inside an async runtime.
pub struct HttpTransport {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    endpoint: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(settings: &AssistantSettings, api_key: impl Into<String>) -> MarionetteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| failure(format!("failed to build HTTP client: {e}")))?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| failure(format!("failed to start HTTP runtime: {e}")))?;
        Ok(Self {
            client,
            runtime,
            endpoint: format!("{}/chat/completions", settings.api_base.trim_end_matches('/')),
            api_key: api_key.into(),
        })
    }

    /// A transport keyed from `OPENAI_API_KEY`, or `None` when it is unset
    /// or blank.
    pub fn from_env(settings: &AssistantSettings) -> MarionetteResult<Option<Self>> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Self::new(settings, key.trim()).map(Some),
            _ => Ok(None),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl CompletionTransport for HttpTransport {
    fn complete(&self, body: &Value) -> MarionetteResult<Value> {
        self.runtime.block_on(async {
            let response = self
                .client
                .post(&self.endpoint)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(body)
                .send()
                .await
                .map_err(|e| failure(format!("chat completions request failed: {e}")))?;

            let status = response.status();
            let text = response
                .text()
                .await
                .map_err(|e| failure(format!("failed to read chat completions response: {e}")))?;

            if !status.is_success() {
                let excerpt: String = text.chars().take(500).collect();
                return Err(failure(format!("chat completions API error ({status}): {excerpt}")));
            }
            serde_json::from_str(&text)
                .map_err(|e| failure(format!("chat completions response is not valid JSON: {e}")))
        })
    }
}

// ── Interpreter ───────────────────────────────────────────────────────────────

pub struct OpenAiInterpreter {
    model: String,
    temperature: f64,
    max_tokens: u32,
    system_prompt: String,
    tools: Vec<Value>,
    transport: Box<dyn CompletionTransport>,
}

impl OpenAiInterpreter {
    /// An interpreter offering one tool per descriptor.
    pub fn new(
        settings: &AssistantSettings,
        system_prompt: impl Into<String>,
        descriptors: &[CapabilityDescriptor],
        transport: Box<dyn CompletionTransport>,
    ) -> Self {
        let tools = function_definitions(descriptors)
            .into_iter()
            .map(|function| json!({ "type": "function", "function": function }))
            .collect();
        Self {
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            system_prompt: system_prompt.into(),
            tools,
            transport,
        }
    }

    pub fn tools(&self) -> &[Value] {
        &self.tools
    }

    /// The chat completions request for `command`.
    pub fn request_body(&self, command: &str, history: &[Turn]) -> Value {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(json!({ "role": "system", "content": self.system_prompt }));
        for turn in history {
            messages.push(json!({ "role": turn.role, "content": turn.content }));
        }
        messages.push(json!({ "role": "user", "content": command }));

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });
        if !self.tools.is_empty() {
            body["tools"] = json!(self.tools);
            body["tool_choice"] = json!("auto");
        }
        body
    }
}

impl Interpreter for OpenAiInterpreter {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn interpret(&mut self, command: &str, history: &[Turn]) -> MarionetteResult<Interpretation> {
        let body = self.request_body(command, history);
        debug!(model = %self.model, messages = history.len() + 2, tools = self.tools.len(), "sending chat completion");
        let response = self.transport.complete(&body)?;
        parse_completion(&response)
    }
}

/// Map a chat completions response to an interpretation.
///
/// `tool_calls` take precedence; the single legacy `function_call` is read
/// when there are none. Without calls the message content is the reply.
pub fn parse_completion(response: &Value) -> MarionetteResult<Interpretation> {
    let message = response
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| failure("chat completions response has no message"))?;

    if let Some(usage) = response.get("usage") {
        debug!(
            prompt_tokens = usage.get("prompt_tokens").and_then(serde_json::Value::as_u64).unwrap_or(0),
            completion_tokens = usage.get("completion_tokens").and_then(serde_json::Value::as_u64).unwrap_or(0),
            "chat completion token usage"
        );
    }

    let mut calls = Vec::new();
    if let Some(tool_calls) = message.get("tool_calls").and_then(Value::as_array) {
        for tool_call in tool_calls {
            let function = tool_call
                .get("function")
                .ok_or_else(|| failure("tool call has no function"))?;
            calls.push(function_call_from(function)?);
        }
    }
    if calls.is_empty() {
        if let Some(function) = message.get("function_call").filter(|f| !f.is_null()) {
            calls.push(function_call_from(function)?);
        }
    }
    if !calls.is_empty() {
        return Ok(Interpretation::calls(calls));
    }

    match message
        .get("content")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        Some(text) => Ok(Interpretation::reply(text)),
        None => Err(failure("chat completions response has neither tool calls nor content")),
    }
}

fn function_call_from(function: &Value) -> MarionetteResult<FunctionCall> {
    let name = function
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| failure("function call has no name"))?;
    let arguments = match function.get("arguments") {
        Some(Value::String(raw)) => raw.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    Ok(FunctionCall {
        name: name.to_string(),
        arguments,
    })
}
