//! The `Interpreter` trait: turns command text into function calls.

use marionette_contracts::error::MarionetteResult;

use crate::call::{Interpretation, Turn};

/// Translates a natural-language command into function calls.
///
/// An LLM client implements this for live use; the keyword interpreters are
/// deterministic offline implementations. Interpreters never touch state:
/// every call they produce is dispatched through the registry.
pub trait Interpreter: Send {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Interpret `command` given the recent conversation, oldest turn first.
    fn interpret(&mut self, command: &str, history: &[Turn]) -> MarionetteResult<Interpretation>;
}
