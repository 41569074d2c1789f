//! In-memory implementation of `AuditTrail`.
//!
//! `BoundedAuditLog` keeps the most recent entries in a `VecDeque` protected
//! by a `Mutex`. When the retention cap is reached the oldest entry is
//! evicted first; sequence numbers keep counting so a reader can tell how
//! many entries were dropped.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};
use uuid::Uuid;

use marionette_contracts::{
    audit::{AuditEntry, InvocationRecord},
    error::{MarionetteError, MarionetteResult},
};
use marionette_core::traits::AuditTrail;

use crate::chain::{hash_entry, verify_window, GENESIS_HASH};

/// Retention cap used when no configuration overrides it.
pub const DEFAULT_CAPACITY: usize = 100;

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct LogState {
    /// Retained entries, oldest first.
    pub(crate) entries: VecDeque<AuditEntry>,

    /// The sequence number the next entry receives.
    pub(crate) sequence: u64,

    /// Hash of the last written entry, evicted or not.
    pub(crate) last_hash: String,

    /// Number of entries dropped by eviction.
    pub(crate) evicted: u64,
}

// ── Public log ────────────────────────────────────────────────────────────────

/// A bounded, append-only audit log backed by a SHA-256 hash chain.
///
/// Cloning the log shares the underlying entries, so a host can keep a
/// reading handle while the registry owns the writing one.
#[derive(Clone)]
pub struct BoundedAuditLog {
    capacity: usize,
    pub(crate) state: Arc<Mutex<LogState>>,
}

impl BoundedAuditLog {
    /// Create a log retaining at most `capacity` entries.
    ///
    /// A capacity of zero is raised to one; a log that cannot hold the entry
    /// it just wrote would violate the one-entry-per-invocation contract.
    pub fn new(capacity: usize) -> Self {
        let state = LogState {
            entries: VecDeque::with_capacity(capacity.max(1)),
            sequence: 0,
            last_hash: GENESIS_HASH.to_string(),
            evicted: 0,
        };
        Self {
            capacity: capacity.max(1),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Every retained entry, oldest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        match self.state.lock() {
            Ok(state) => state.entries.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Number of entries dropped by eviction so far.
    pub fn evicted(&self) -> u64 {
        self.state.lock().map(|s| s.evicted).unwrap_or_default()
    }

    /// Verify that the retained window has not been tampered with.
    pub fn verify_integrity(&self) -> bool {
        match self.state.lock() {
            Ok(mut state) => verify_window(state.entries.make_contiguous()),
            Err(_) => false,
        }
    }

    fn lock(&self) -> MarionetteResult<std::sync::MutexGuard<'_, LogState>> {
        self.state.lock().map_err(|e| MarionetteError::AuditWriteFailed {
            reason: format!("audit log lock poisoned: {e}"),
        })
    }
}

impl Default for BoundedAuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ── AuditTrail impl ───────────────────────────────────────────────────────────

impl AuditTrail for BoundedAuditLog {
    /// Append one record, evicting the oldest entry when the log is full.
    fn record(&self, record: &InvocationRecord) -> MarionetteResult<AuditEntry> {
        let mut state = self.lock()?;

        let arguments = record.arguments.to_string();
        let effective = record.effective.as_ref().map(|v| v.to_string());

        let mut entry = AuditEntry {
            id: Uuid::new_v4(),
            sequence: state.sequence,
            timestamp: record.timestamp,
            capability: record.capability.clone(),
            arguments,
            effective,
            outcome: record.outcome,
            error: record.error.clone(),
            prev_hash: state.last_hash.clone(),
            hash: String::new(),
        };
        entry.hash = hash_entry(&entry)?;

        if state.entries.len() == self.capacity {
            if let Some(evicted) = state.entries.pop_front() {
                state.evicted += 1;
                debug!(sequence = evicted.sequence, capability = %evicted.capability, "audit entry evicted");
            }
        }

        info!(
            sequence = entry.sequence,
            capability = %entry.capability,
            outcome = entry.outcome.as_str(),
            "capability invocation audited"
        );

        state.sequence += 1;
        state.last_hash = entry.hash.clone();
        state.entries.push_back(entry.clone());

        Ok(entry)
    }

    fn recent(&self, limit: usize) -> MarionetteResult<Vec<AuditEntry>> {
        let state = self.lock()?;
        let skip = state.entries.len().saturating_sub(limit);
        Ok(state.entries.iter().skip(skip).cloned().collect())
    }

    fn len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or_default()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
