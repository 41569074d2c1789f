//! Error types for the MARIONETTE capability registry.
//!
//! All fallible operations across the workspace return `MarionetteResult<T>`.
//! Variants carry enough context to produce a useful audit entry.

use thiserror::Error;

/// The unified error type for the MARIONETTE crates.
#[derive(Debug, Error)]
pub enum MarionetteError {
    /// The injected state container lacks one or more required slots.
    ///
    /// Raised at registry construction only; a registry is never built over
    /// an incomplete container.
    #[error("missing required state slots: {}", missing.join(", "))]
    MissingStateSlots { missing: Vec<String> },

    /// The injected state container is present but malformed or already
    /// violates a state invariant.
    #[error("invalid state container: {reason}")]
    InvalidState { reason: String },

    /// Two capabilities in one variant share a name.
    #[error("capability '{name}' is declared more than once")]
    DuplicateCapability { name: String },

    /// The caller supplied arguments the capability refuses.
    #[error("validation failed for '{capability}': {reason}")]
    Validation { capability: String, reason: String },

    /// The requested name is not part of the authorized capability set.
    #[error("capability '{name}' not found")]
    CapabilityNotFound { name: String },

    /// The shared state could not be locked for a mutating call.
    #[error("state unavailable: {reason}")]
    StateUnavailable { reason: String },

    /// The audit log could not record an invocation.
    ///
    /// Fatal for the invocation: a mutation that cannot be audited is not
    /// committed.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// A configuration document is missing, malformed, or out of range.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The command interpreter (LLM client or fallback) failed.
    #[error("interpreter error: {reason}")]
    InterpreterError { reason: String },
}

impl MarionetteError {
    /// Shorthand for a `Validation` error.
    pub fn validation(capability: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            capability: capability.into(),
            reason: reason.into(),
        }
    }

    /// True for errors that only concern one invocation; the registry stays
    /// usable afterwards.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::CapabilityNotFound { .. } | Self::InterpreterError { .. }
        )
    }
}

/// Convenience alias used throughout the MARIONETTE crates.
pub type MarionetteResult<T> = Result<T, MarionetteError>;
