//! MARIONETTE Demo CLI
//!
//! Drives a capability registry with natural-language commands.  In `live`
//! mode with `OPENAI_API_KEY` set, commands go to the OpenAI chat completions
//! API; otherwise the offline keyword interpreters handle them.  Every
//! resulting call goes through the registry, so the audit trail shows
//! exactly what ran.
//!
//! Usage:
//!   cargo run -p marionette-demo -- run "create a pirate story" "add a red button"
//!   cargo run -p marionette-demo -- --config config/marionette.toml functions
//!   cargo run -p marionette-demo -- showcase
//!   cargo run -p marionette-demo -- event

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use marionette_command::{
    CommandProcessor, CommandReport, EventKeywordInterpreter, HttpTransport, Interpreter,
    KeywordInterpreter, OpenAiInterpreter, API_KEY_ENV, EVENT_SYSTEM_PROMPT, UI_SYSTEM_PROMPT,
};
use marionette_config::{AssistantMode, MarionetteConfig, Variant};
use marionette_contracts::{capability::CapabilityDescriptor, error::MarionetteResult};
use marionette_core::{AuditTrail, CapabilityRegistry, CapabilitySurface};
use marionette_event::{event_registry, EventState};
use marionette_schema::function_definitions;
use marionette_ui::{ui_registry, UiState};

// ── CLI definition ────────────────────────────────────────────────────────────

/// MARIONETTE: natural-language control over a fixed capability set.
#[derive(Parser)]
#[command(
    name = "marionette-demo",
    about = "MARIONETTE capability registry demo",
    long_about = "Interprets natural-language commands into capability calls and runs them\n\
                  through the registry, printing the resulting state and audit trail."
)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interpret and run one or more commands against the configured variant.
    Run {
        #[arg(required = true)]
        commands: Vec<String>,
    },
    /// Print the function definitions the configured variant exposes.
    Functions,
    /// Walk through the UI variant: stories, themes, counters and refusals.
    Showcase,
    /// Build an event with the event-creation variant.
    Event,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for per-call output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_ref()).and_then(|config| match cli.command {
        Command::Run { commands } => run(&config, &commands),
        Command::Functions => print_functions(&config),
        Command::Showcase => showcase(&config),
        Command::Event => event_demo(&config),
    });

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&PathBuf>) -> MarionetteResult<MarionetteConfig> {
    let config = match path {
        Some(path) => MarionetteConfig::from_file(path)?,
        None => MarionetteConfig::default(),
    };
    config.validate()?;
    info!(
        variant = config.variant.as_str(),
        capacity = config.audit.capacity,
        "configuration loaded"
    );
    Ok(config)
}

// ── Subcommands ───────────────────────────────────────────────────────────────

fn run(config: &MarionetteConfig, commands: &[String]) -> MarionetteResult<()> {
    match config.variant {
        Variant::Ui => {
            let registry = ui_registry(UiState::default(), config.audit.capacity)?;
            let mut processor = ui_processor(config, &registry.descriptors())?;
            run_commands(&registry, &mut processor, commands)
        }
        Variant::Event => {
            let registry = event_registry(EventState::default(), config.audit.capacity)?;
            let mut processor = event_processor(config, &registry.descriptors())?;
            run_commands(&registry, &mut processor, commands)
        }
    }
}

fn print_functions(config: &MarionetteConfig) -> MarionetteResult<()> {
    let descriptors = match config.variant {
        Variant::Ui => ui_registry(UiState::default(), config.audit.capacity)?.descriptors(),
        Variant::Event => event_registry(EventState::default(), config.audit.capacity)?.descriptors(),
    };
    println!("{}", pretty(&function_definitions(&descriptors)));
    Ok(())
}

fn showcase(config: &MarionetteConfig) -> MarionetteResult<()> {
    print_banner("UI manipulation");
    let registry = ui_registry(UiState::default(), config.audit.capacity)?;
    let mut processor = ui_processor(config, &registry.descriptors())?;

    let commands = [
        "create a pirate story",
        "add a gold button that says 'Open the Chest'",
        "add a counter called 'Doubloons'",
        "change the theme to sunset",
    ]
    .map(String::from);
    run_commands(&registry, &mut processor, &commands)?;

    println!("── Direct calls ──");
    show_call("changeBackground", registry.dispatch(
        "changeBackground",
        json!({ "style": "background: url(javascript:alert(1))" }),
    ));
    show_call("deleteEverything", registry.dispatch("deleteEverything", json!({})));
    show_call("addCounter", registry.dispatch("addCounter", json!({ "label": "Score", "id": 42 })));
    show_call("incrementCounter", registry.dispatch("incrementCounter", json!([42, 5])));
    show_call("incrementCounter", registry.dispatch("incrementCounter", json!({ "id": 42, "amount": 5000 })));
    show_call("getElementCount", registry.dispatch("getElementCount", json!({})));
    println!();

    print_audit_tail(&registry, 10)
}

fn event_demo(config: &MarionetteConfig) -> MarionetteResult<()> {
    print_banner("Event creation");
    let registry = event_registry(EventState::default(), config.audit.capacity)?;
    let mut processor = event_processor(config, &registry.descriptors())?;

    let commands = [
        "Create a tech conference called 'RustConf' with early bird tickets for $199",
        "add VIP tickets for $499 and a waitlist",
        "early bird tickets are now $149",
        "what can you do?",
    ]
    .map(String::from);
    run_commands(&registry, &mut processor, &commands)
}

// ── Shared helpers ────────────────────────────────────────────────────────────

fn ui_processor(config: &MarionetteConfig, descriptors: &[CapabilityDescriptor]) -> MarionetteResult<CommandProcessor> {
    let processor = CommandProcessor::new(config.assistant.clone(), Box::new(KeywordInterpreter::new()))
        .with_story_sink("addStoryElement");
    Ok(match live_interpreter(config, UI_SYSTEM_PROMPT, descriptors)? {
        Some(primary) => processor.with_primary(primary),
        None => processor,
    })
}

fn event_processor(config: &MarionetteConfig, descriptors: &[CapabilityDescriptor]) -> MarionetteResult<CommandProcessor> {
    let processor =
        CommandProcessor::new(config.assistant.clone(), Box::new(EventKeywordInterpreter::new()));
    Ok(match live_interpreter(config, EVENT_SYSTEM_PROMPT, descriptors)? {
        Some(primary) => processor.with_primary(primary),
        None => processor,
    })
}

/// The OpenAI interpreter when live mode is configured and a key is present.
fn live_interpreter(
    config: &MarionetteConfig,
    system_prompt: &str,
    descriptors: &[CapabilityDescriptor],
) -> MarionetteResult<Option<Box<dyn Interpreter>>> {
    if config.assistant.mode != AssistantMode::Live {
        return Ok(None);
    }
    match HttpTransport::from_env(&config.assistant)? {
        Some(transport) => {
            info!(model = %config.assistant.model, endpoint = transport.endpoint(), "live interpreter enabled");
            Ok(Some(Box::new(OpenAiInterpreter::new(
                &config.assistant,
                system_prompt,
                descriptors,
                Box::new(transport),
            ))))
        }
        None => {
            warn!("live mode configured but {} is not set, using keyword interpreter", API_KEY_ENV);
            Ok(None)
        }
    }
}

fn run_commands<S: CapabilitySurface>(
    registry: &CapabilityRegistry<S>,
    processor: &mut CommandProcessor,
    commands: &[String],
) -> MarionetteResult<()> {
    for command in commands {
        let report = processor.process(registry, command)?;
        print_report(command, &report);
    }

    println!("── State ──");
    println!("{}", pretty(&registry.snapshot()?));
    println!();
    print_audit_tail(registry, 20)?;
    println!("── Usage ──");
    println!("{}", pretty(&processor.usage_stats()));
    Ok(())
}

fn print_report(command: &str, report: &CommandReport) {
    println!("> {}", command);
    if let Some(reply) = &report.reply {
        println!("  {} says: {}", report.interpreter, reply);
    }
    for outcome in &report.outcomes {
        show_call(&outcome.call.name, outcome.result.as_ref());
    }
    println!();
}

fn show_call<T: Serialize, E: std::fmt::Display>(name: &str, result: Result<T, E>) {
    match result {
        Ok(output) => println!("  ✓ {} → {}", name, compact(&output)),
        Err(e) => println!("  ✗ {} → {}", name, e),
    }
}

fn print_audit_tail<S: CapabilitySurface>(registry: &CapabilityRegistry<S>, limit: usize) -> MarionetteResult<()> {
    let audit = registry.audit();
    println!("── Audit log ({} of {} retained) ──", limit.min(audit.len()), audit.len());
    for entry in audit.recent(limit)? {
        let detail = entry.error.as_deref().or(entry.effective.as_deref()).unwrap_or(entry.arguments.as_str());
        println!(
            "  #{:<4} {:<8} {:<20} {}",
            entry.sequence,
            entry.outcome.as_str(),
            entry.capability,
            detail
        );
    }
    println!();
    Ok(())
}

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unprintable: {e}>"))
}

fn compact<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unprintable: {e}>"))
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner(variant: &str) {
    println!();
    println!("MARIONETTE — Capability-bound command runtime");
    println!("{} demo", variant);
    println!("=============================================");
    println!();
    println!("Every call passes through the registry:");
    println!("  [1] Lookup: only names in the capability table resolve");
    println!("  [2] Arguments normalized and checked against the JSON Schema");
    println!("  [3] Capability validates and mutates a staged copy of state");
    println!("  [4] Audit entry appended to the SHA-256 chained log");
    println!("  [5] Staged state committed only after the audit write succeeds");
    println!();
}
