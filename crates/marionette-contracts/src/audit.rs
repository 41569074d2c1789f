//! Invocation records and audit log entries.
//!
//! `InvocationRecord` is what the registry produces for every call, one per
//! invocation. `AuditEntry` is what the audit log stores: the record plus its
//! identity and its link in the hash chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Whether an invocation was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// An immutable description of one capability invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRecord {
    /// Capability name as requested, including names outside the registry.
    pub capability: String,
    /// Arguments exactly as the caller supplied them.
    pub arguments: Value,
    /// Sanitized or effective arguments. Present on success only.
    pub effective: Option<Value>,
    pub outcome: Outcome,
    /// Error message on failure.
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl InvocationRecord {
    pub fn success(capability: impl Into<String>, arguments: Value, effective: Value) -> Self {
        Self {
            capability: capability.into(),
            arguments,
            effective: Some(effective),
            outcome: Outcome::Success,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(capability: impl Into<String>, arguments: Value, error: impl ToString) -> Self {
        Self {
            capability: capability.into(),
            arguments,
            effective: None,
            outcome: Outcome::Failure,
            error: Some(error.to_string()),
            timestamp: Utc::now(),
        }
    }
}

/// One entry of the bounded audit log.
///
/// `id` disambiguates entries with identical timestamps; `sequence` counts
/// every entry ever written, so it keeps growing after old entries are
/// evicted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub capability: String,
    /// Supplied arguments serialized as compact JSON.
    pub arguments: String,
    /// Effective arguments serialized as compact JSON.
    pub effective: Option<String>,
    pub outcome: Outcome,
    pub error: Option<String>,
    /// Hash of the entry written before this one.
    pub prev_hash: String,
    /// SHA-256 over this entry's content and `prev_hash`, lowercase hex.
    pub hash: String,
}
