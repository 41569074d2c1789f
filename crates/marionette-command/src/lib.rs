//! # marionette-command
//!
//! Natural-language command processing on top of a capability registry.
//!
//! An `Interpreter` turns command text into `FunctionCall`s; the
//! `CommandProcessor` dispatches each call through the registry, which stays
//! the only path to state. `OpenAiInterpreter` is the live, LLM-backed
//! primary the host injects; the keyword interpreters run offline and serve
//! as the fallback.
//!
//! ```rust,ignore
//! use marionette_command::{CommandProcessor, KeywordInterpreter};
//!
//! let mut processor = CommandProcessor::new(settings, Box::new(KeywordInterpreter::new()))
//!     .with_story_sink("addStoryElement");
//! let report = processor.process(&registry, "create a pirate story")?;
//! ```

pub mod call;
pub mod interpreter;
pub mod keyword;
pub mod openai;
pub mod processor;

pub use call::{FunctionCall, Interpretation, Role, Turn};
pub use interpreter::Interpreter;
pub use keyword::{EventKeywordInterpreter, KeywordInterpreter};
pub use openai::{
    parse_completion, CompletionTransport, HttpTransport, OpenAiInterpreter, API_KEY_ENV,
    EVENT_SYSTEM_PROMPT, UI_SYSTEM_PROMPT,
};
pub use processor::{CallOutcome, CommandProcessor, CommandReport, UsageStats};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use marionette_config::{AssistantMode, AssistantSettings};
    use marionette_contracts::error::{MarionetteError, MarionetteResult};
    use marionette_core::traits::AuditTrail;
    use marionette_event::{event_registry, EventState};
    use marionette_ui::{ui_registry, ElementKind, StoryType, Theme, UiState};

    use super::*;

    // ── Mock interpreters ─────────────────────────────────────────────────────

    /// Returns a fixed interpretation and records what it was asked.
    struct ScriptedInterpreter {
        response: Interpretation,
        seen: Arc<Mutex<Vec<(String, usize)>>>,
    }

    impl ScriptedInterpreter {
        fn new(response: Interpretation) -> (Self, Arc<Mutex<Vec<(String, usize)>>>) {
            let seen = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    response,
                    seen: Arc::clone(&seen),
                },
                seen,
            )
        }
    }

    impl Interpreter for ScriptedInterpreter {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn interpret(&mut self, command: &str, history: &[Turn]) -> MarionetteResult<Interpretation> {
            self.seen.lock().unwrap().push((command.to_string(), history.len()));
            Ok(self.response.clone())
        }
    }

    struct FailingInterpreter;

    impl Interpreter for FailingInterpreter {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn interpret(&mut self, _command: &str, _history: &[Turn]) -> MarionetteResult<Interpretation> {
            Err(MarionetteError::InterpreterError {
                reason: "service unavailable".into(),
            })
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn live(session_limit: usize) -> AssistantSettings {
        AssistantSettings {
            mode: AssistantMode::Live,
            session_limit,
            ..AssistantSettings::default()
        }
    }

    fn ui_processor(settings: AssistantSettings) -> CommandProcessor {
        CommandProcessor::new(settings, Box::new(KeywordInterpreter::new()))
            .with_story_sink("addStoryElement")
    }

    fn interpret_ui(command: &str) -> Vec<FunctionCall> {
        KeywordInterpreter::new().interpret(command, &[]).unwrap().calls
    }

    fn interpret_event(command: &str) -> Interpretation {
        EventKeywordInterpreter::new().interpret(command, &[]).unwrap()
    }

    // ── Function calls ────────────────────────────────────────────────────────

    #[test]
    fn test_function_call_arguments() {
        let named = FunctionCall {
            name: "addButton".into(),
            arguments: r#"{"text":"Go"}"#.into(),
        };
        assert_eq!(named.parse_arguments().unwrap().to_json(), json!({ "text": "Go" }));

        let positional = FunctionCall {
            name: "incrementCounter".into(),
            arguments: "[42, 5]".into(),
        };
        assert_eq!(positional.parse_arguments().unwrap().to_json(), json!([42, 5]));

        let empty = FunctionCall {
            name: "getActiveTheme".into(),
            arguments: "  ".into(),
        };
        assert!(empty.parse_arguments().unwrap().is_empty());

        let broken = FunctionCall {
            name: "addButton".into(),
            arguments: "{text:".into(),
        };
        match broken.parse_arguments() {
            Err(MarionetteError::InterpreterError { reason }) => assert!(reason.contains("addButton")),
            other => panic!("expected InterpreterError, got {:?}", other),
        }
    }

    // ── Keyword interpreter (UI) ──────────────────────────────────────────────

    #[test]
    fn test_keyword_pirate_story() {
        let calls = interpret_ui("Tell me a pirate adventure");
        let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["setTheme", "addStoryElement", "addButton", "addCounter"]);
        assert!(calls[0].arguments.contains("ocean"));
    }

    #[test]
    fn test_keyword_button_text_and_color() {
        let calls = interpret_ui("Add a red button that says 'Buy Now'");
        assert_eq!(calls.len(), 1);
        let args: serde_json::Value = serde_json::from_str(&calls[0].arguments).unwrap();
        assert_eq!(args["text"], "Buy Now");
        assert_eq!(args["style"]["color"], "red");

        let calls = interpret_ui("add purple buttons");
        let args: serde_json::Value = serde_json::from_str(&calls[0].arguments).unwrap();
        assert_eq!(args["text"], "AI Generated Button");
        assert_eq!(args["style"]["color"], "purple");
    }

    #[test]
    fn test_keyword_theme() {
        let calls = interpret_ui("change the background to the stars");
        assert_eq!(calls[0].name, "setTheme");
        assert!(calls[0].arguments.contains("space"));

        let calls = interpret_ui("a forest theme please");
        assert!(calls[0].arguments.contains("forest"));
    }

    #[test]
    fn test_keyword_default_paragraph() {
        let calls = interpret_ui("hello there");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "addStoryElement");
        assert!(calls[0].arguments.contains("paragraph"));
        assert!(calls[0].arguments.contains("hello there"));
    }

    // ── Keyword interpreter (event) ───────────────────────────────────────────

    #[test]
    fn test_event_keywords() {
        let interpretation =
            interpret_event("Create a tech conference called 'RustConf' with VIP tickets for $50 and a waitlist");
        let names: Vec<&str> = interpretation.calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["setEventName", "setEventDescription", "addTicketType", "toggleWaitlist"]
        );
        let ticket: serde_json::Value =
            serde_json::from_str(&interpretation.calls[2].arguments).unwrap();
        assert_eq!(ticket["name"], "VIP");
        assert_eq!(ticket["price"], 50.0);
        assert!(interpretation.calls[3].arguments.contains("true"));
    }

    #[test]
    fn test_event_keywords_disable_waitlist() {
        let interpretation = interpret_event("disable the waitlist");
        assert_eq!(interpretation.calls.len(), 1);
        assert!(interpretation.calls[0].arguments.contains("false"));
    }

    #[test]
    fn test_event_keywords_reply_when_nothing_matches() {
        let interpretation = interpret_event("what can you do?");
        assert!(interpretation.calls.is_empty());
        assert!(interpretation.reply.is_some());
    }

    // ── Processor ─────────────────────────────────────────────────────────────

    #[test]
    fn test_mock_mode_uses_keywords() {
        let registry = ui_registry(UiState::default(), 100).unwrap();
        let mut processor = ui_processor(AssistantSettings::default());

        let report = processor.process(&registry, "create a space story").unwrap();
        assert_eq!(report.interpreter, "keyword");
        assert!(!report.fell_back);
        assert!(report.succeeded(), "failures: {:?}", report.failures().collect::<Vec<_>>());

        let state = registry.snapshot().unwrap();
        assert_eq!(state.active_theme(), Theme::Space);
        assert_eq!(state.story_elements.len(), 1);
        assert_eq!(state.elements.iter().filter(|e| e.kind() == ElementKind::Counter).count(), 1);
        assert_eq!(processor.usage_stats().request_count, 0);
    }

    #[test]
    fn test_primary_calls_dispatched() {
        let registry = ui_registry(UiState::default(), 100).unwrap();
        let (primary, seen) = ScriptedInterpreter::new(Interpretation::calls(vec![
            FunctionCall::new("addCounter", json!({ "label": "Laps", "id": 42 })),
            FunctionCall::new("incrementCounter", json!({ "id": 42, "amount": 5 })),
        ]));
        let mut processor = ui_processor(live(10)).with_primary(Box::new(primary));

        let report = processor.process(&registry, "count my laps").unwrap();
        assert_eq!(report.interpreter, "scripted");
        assert!(report.succeeded());
        assert_eq!(report.outcomes[1].result.as_ref().unwrap().as_number(), Some(5.0));
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(processor.usage_stats().request_count, 1);
        assert_eq!(processor.usage_stats().remaining_requests, 9);
    }

    /// A rejected call is reported; later calls still run.
    #[test]
    fn test_failed_call_does_not_abort_the_rest() {
        let registry = ui_registry(UiState::default(), 100).unwrap();
        let (primary, _) = ScriptedInterpreter::new(Interpretation::calls(vec![
            FunctionCall::new("changeBackground", json!({ "style": "url(javascript:alert(1))" })),
            FunctionCall::new("runShell", json!({ "cmd": "rm -rf /" })),
            FunctionCall::new("setTheme", json!({ "themeName": "sunset" })),
        ]));
        let mut processor = ui_processor(live(10)).with_primary(Box::new(primary));

        let report = processor.process(&registry, "make it pretty").unwrap();
        assert!(!report.succeeded());
        assert_eq!(report.failures().count(), 2);
        match &report.outcomes[1].result {
            Err(MarionetteError::CapabilityNotFound { name }) => assert_eq!(name, "runShell"),
            other => panic!("expected CapabilityNotFound, got {:?}", other),
        }
        assert_eq!(registry.snapshot().unwrap().active_theme(), Theme::Sunset);
        assert_eq!(registry.audit().len(), 3);
    }

    #[test]
    fn test_text_reply_becomes_paragraph() {
        let registry = ui_registry(UiState::default(), 100).unwrap();
        let (primary, _) = ScriptedInterpreter::new(Interpretation::reply("Once upon a time"));
        let mut processor = ui_processor(live(10)).with_primary(Box::new(primary));

        let report = processor.process(&registry, "tell me something").unwrap();
        assert_eq!(report.reply.as_deref(), Some("Once upon a time"));
        let state = registry.snapshot().unwrap();
        assert_eq!(state.story_elements.len(), 1);
        assert_eq!(state.story_elements[0].story_type, StoryType::Paragraph);
        assert_eq!(state.story_elements[0].content, "Once upon a time");
    }

    #[test]
    fn test_primary_error_falls_back() {
        let registry = ui_registry(UiState::default(), 100).unwrap();
        let mut processor = ui_processor(live(10)).with_primary(Box::new(FailingInterpreter));

        let report = processor.process(&registry, "add a gold button").unwrap();
        assert_eq!(report.interpreter, "keyword");
        assert!(report.fell_back);
        assert_eq!(registry.snapshot().unwrap().elements.len(), 1);
        assert_eq!(processor.usage_stats().request_count, 1, "failed requests still count");
    }

    #[test]
    fn test_session_limit_and_reset() {
        let registry = ui_registry(UiState::default(), 100).unwrap();
        let (primary, seen) = ScriptedInterpreter::new(Interpretation::calls(vec![FunctionCall::new(
            "getElementCount",
            json!({}),
        )]));
        let mut processor = ui_processor(live(2)).with_primary(Box::new(primary));

        processor.process(&registry, "one").unwrap();
        processor.process(&registry, "two").unwrap();
        assert!(!processor.is_live());
        let third = processor.process(&registry, "three").unwrap();
        assert!(third.fell_back);
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert_eq!(processor.usage_stats().remaining_requests, 0);

        processor.reset_usage();
        assert!(processor.is_live());
        let fourth = processor.process(&registry, "four").unwrap();
        assert!(!fourth.fell_back);
    }

    #[test]
    fn test_history_is_bounded() {
        let registry = ui_registry(UiState::default(), 100).unwrap();
        let (primary, seen) = ScriptedInterpreter::new(Interpretation::calls(Vec::new()));
        let settings = AssistantSettings {
            conversation_limit: 2,
            ..live(10)
        };
        let mut processor = ui_processor(settings).with_primary(Box::new(primary));

        for n in 0..5 {
            processor.process(&registry, &format!("command {n}")).unwrap();
        }
        assert_eq!(processor.history().count(), 4);
        assert_eq!(processor.history().next().unwrap().content, "command 3");

        let seen = seen.lock().unwrap();
        let history_lengths: Vec<usize> = seen.iter().map(|(_, len)| *len).collect();
        assert_eq!(history_lengths, vec![0, 2, 4, 4, 4]);

        drop(seen);
        processor.clear_history();
        assert_eq!(processor.history().count(), 0);
    }

    #[test]
    fn test_event_processing() {
        let registry = event_registry(EventState::default(), 100).unwrap();
        let mut processor = CommandProcessor::new(
            AssistantSettings::default(),
            Box::new(EventKeywordInterpreter::new()),
        );

        processor
            .process(&registry, "Create a music festival named 'Summer Sounds' with VIP tickets for $50")
            .unwrap();
        let report = processor.process(&registry, "vip tickets are now $75").unwrap();
        assert!(report.succeeded());

        let state = registry.snapshot().unwrap();
        assert_eq!(state.event_name, "Summer Sounds");
        assert_eq!(state.ticket_types.len(), 1);
        assert_eq!(state.ticket_types[0].name, "VIP");
        assert_eq!(state.ticket_types[0].price, Some(75.0));
    }

    /// Without a story sink a text reply changes nothing.
    #[test]
    fn test_reply_without_sink() {
        let registry = event_registry(EventState::default(), 100).unwrap();
        let mut processor = CommandProcessor::new(
            AssistantSettings::default(),
            Box::new(EventKeywordInterpreter::new()),
        );
        let report = processor.process(&registry, "hi").unwrap();
        assert!(report.outcomes.is_empty());
        assert!(report.reply.is_some());
        assert_eq!(registry.audit().len(), 0);
    }

    /// The help paragraph echoes only an excerpt, so an oversized command
    /// still yields a story element within the length limit.
    #[test]
    fn test_long_command_help_stays_within_story_limit() {
        let registry = ui_registry(UiState::default(), 100).unwrap();
        let mut processor = ui_processor(AssistantSettings::default());
        let command = "z".repeat(5000);

        let report = processor.process(&registry, &command).unwrap();
        assert!(report.succeeded(), "failures: {:?}", report.failures().collect::<Vec<_>>());
        let state = registry.snapshot().unwrap();
        assert_eq!(state.story_elements.len(), 1);
        let content = &state.story_elements[0].content;
        assert!(content.chars().count() < 2000);
        assert!(content.contains(&"z".repeat(200)));
        assert!(!content.contains(&"z".repeat(201)));
    }

    // ── OpenAI interpreter ────────────────────────────────────────────────────

    /// Returns canned response bodies in order and records each request.
    struct CannedTransport {
        responses: Mutex<Vec<MarionetteResult<serde_json::Value>>>,
        requests: Arc<Mutex<Vec<serde_json::Value>>>,
    }

    impl CannedTransport {
        fn new(
            responses: Vec<MarionetteResult<serde_json::Value>>,
        ) -> (Self, Arc<Mutex<Vec<serde_json::Value>>>) {
            let requests = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    responses: Mutex::new(responses.into_iter().rev().collect()),
                    requests: Arc::clone(&requests),
                },
                requests,
            )
        }
    }

    impl CompletionTransport for CannedTransport {
        fn complete(&self, body: &serde_json::Value) -> MarionetteResult<serde_json::Value> {
            self.requests.lock().unwrap().push(body.clone());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| panic!("no canned response left"))
        }
    }

    fn tool_call_response(calls: &[(&str, serde_json::Value)]) -> serde_json::Value {
        let tool_calls: Vec<serde_json::Value> = calls
            .iter()
            .enumerate()
            .map(|(i, (name, args))| {
                json!({
                    "id": format!("call_{i}"),
                    "type": "function",
                    "function": { "name": name, "arguments": args.to_string() },
                })
            })
            .collect();
        json!({
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": null, "tool_calls": tool_calls },
                "finish_reason": "tool_calls",
            }],
            "usage": { "prompt_tokens": 420, "completion_tokens": 38, "total_tokens": 458 },
        })
    }

    fn text_response(text: &str) -> serde_json::Value {
        json!({
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": text },
                "finish_reason": "stop",
            }],
        })
    }

    fn openai_settings() -> AssistantSettings {
        AssistantSettings {
            model: "gpt-4o".into(),
            temperature: 0.2,
            max_tokens: 512,
            ..live(10)
        }
    }

    #[test]
    fn test_openai_request_body() {
        let registry = ui_registry(UiState::default(), 100).unwrap();
        let descriptors = registry.descriptors();
        let (transport, _) = CannedTransport::new(Vec::new());
        let interpreter =
            OpenAiInterpreter::new(&openai_settings(), UI_SYSTEM_PROMPT, &descriptors, Box::new(transport));

        let history = vec![
            Turn { role: Role::User, content: "add a button".into() },
            Turn { role: Role::Assistant, content: "Executed: addButton".into() },
        ];
        let body = interpreter.request_body("now a counter", &history);

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["temperature"], 0.2);
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["tool_choice"], "auto");

        let messages = body["messages"].as_array().unwrap();
        let roles: Vec<&str> = messages.iter().map(|m| m["role"].as_str().unwrap()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(messages[0]["content"], UI_SYSTEM_PROMPT);
        assert_eq!(messages[3]["content"], "now a counter");

        let tools = body["tools"].as_array().unwrap();
        assert_eq!(tools.len(), descriptors.len());
        assert!(tools.iter().all(|t| t["type"] == "function"));
        let add_button = tools
            .iter()
            .find(|t| t["function"]["name"] == "addButton")
            .expect("addButton tool offered");
        assert_eq!(add_button["function"]["parameters"]["required"], json!(["text"]));
    }

    #[test]
    fn test_openai_tool_calls_dispatched() {
        let registry = ui_registry(UiState::default(), 100).unwrap();
        let (transport, requests) = CannedTransport::new(vec![Ok(tool_call_response(&[
            ("addCounter", json!({ "label": "Laps", "id": 42 })),
            ("incrementCounter", json!({ "id": "42", "amount": 5 })),
        ]))]);
        let interpreter = OpenAiInterpreter::new(
            &openai_settings(),
            UI_SYSTEM_PROMPT,
            &registry.descriptors(),
            Box::new(transport),
        );
        let mut processor = ui_processor(openai_settings()).with_primary(Box::new(interpreter));

        let report = processor.process(&registry, "track my laps, I just ran five").unwrap();
        assert_eq!(report.interpreter, "openai");
        assert!(!report.fell_back);
        assert!(report.succeeded(), "failures: {:?}", report.failures().collect::<Vec<_>>());
        assert_eq!(registry.snapshot().unwrap().counter("42"), 5.0);
        assert_eq!(requests.lock().unwrap().len(), 1);
        assert_eq!(processor.usage_stats().request_count, 1);
    }

    #[test]
    fn test_openai_text_reply_becomes_paragraph() {
        let registry = ui_registry(UiState::default(), 100).unwrap();
        let (transport, _) =
            CannedTransport::new(vec![Ok(text_response("I can only work with the UI functions."))]);
        let interpreter = OpenAiInterpreter::new(
            &openai_settings(),
            UI_SYSTEM_PROMPT,
            &registry.descriptors(),
            Box::new(transport),
        );
        let mut processor = ui_processor(openai_settings()).with_primary(Box::new(interpreter));

        let report = processor.process(&registry, "book me a flight").unwrap();
        assert_eq!(report.reply.as_deref(), Some("I can only work with the UI functions."));
        let state = registry.snapshot().unwrap();
        assert_eq!(state.story_elements[0].story_type, StoryType::Paragraph);
    }

    /// A transport error falls back to keywords for that command only.
    #[test]
    fn test_openai_transport_error_falls_back() {
        let registry = ui_registry(UiState::default(), 100).unwrap();
        let (transport, requests) = CannedTransport::new(vec![
            Err(MarionetteError::InterpreterError {
                reason: "chat completions API error (503 Service Unavailable)".into(),
            }),
            Ok(tool_call_response(&[("setTheme", json!({ "themeName": "forest" }))])),
        ]);
        let interpreter = OpenAiInterpreter::new(
            &openai_settings(),
            UI_SYSTEM_PROMPT,
            &registry.descriptors(),
            Box::new(transport),
        );
        let mut processor = ui_processor(openai_settings()).with_primary(Box::new(interpreter));

        let first = processor.process(&registry, "add a blue button").unwrap();
        assert_eq!(first.interpreter, "keyword");
        assert!(first.fell_back);

        let second = processor.process(&registry, "something woodland").unwrap();
        assert_eq!(second.interpreter, "openai");
        assert_eq!(registry.snapshot().unwrap().active_theme(), Theme::Forest);

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        // user + assistant turns from the first command precede the second
        assert_eq!(requests[1]["messages"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_parse_completion_shapes() {
        let legacy = json!({
            "choices": [{ "message": {
                "content": null,
                "function_call": { "name": "toggleWaitlist", "arguments": "{\"enabled\":true}" },
            }}],
        });
        let interpretation = parse_completion(&legacy).unwrap();
        assert_eq!(interpretation.calls.len(), 1);
        assert_eq!(interpretation.calls[0].name, "toggleWaitlist");

        let object_arguments = json!({
            "choices": [{ "message": { "tool_calls": [
                { "type": "function", "function": { "name": "setEventName", "arguments": { "name": "RustConf" } } },
            ]}}],
        });
        let call = &parse_completion(&object_arguments).unwrap().calls[0];
        assert_eq!(call.parse_arguments().unwrap().to_json(), json!({ "name": "RustConf" }));

        for broken in [json!({}), json!({ "choices": [] }), text_response("   ")] {
            match parse_completion(&broken) {
                Err(MarionetteError::InterpreterError { .. }) => {}
                other => panic!("expected InterpreterError, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_openai_event_tools() {
        let registry = event_registry(EventState::default(), 100).unwrap();
        let (transport, _) = CannedTransport::new(vec![Ok(tool_call_response(&[
            ("setEventName", json!({ "name": "RustConf" })),
            ("addTicketType", json!({ "name": "VIP", "price": 499 })),
        ]))]);
        let interpreter = OpenAiInterpreter::new(
            &openai_settings(),
            EVENT_SYSTEM_PROMPT,
            &registry.descriptors(),
            Box::new(transport),
        );
        assert_eq!(interpreter.tools().len(), 4);

        let mut processor = CommandProcessor::new(openai_settings(), Box::new(EventKeywordInterpreter::new()))
            .with_primary(Box::new(interpreter));
        let report = processor.process(&registry, "RustConf with VIP tickets at 499").unwrap();
        assert!(report.succeeded());
        let state = registry.snapshot().unwrap();
        assert_eq!(state.event_name, "RustConf");
        assert_eq!(state.ticket_types[0].price, Some(499.0));
    }
}
