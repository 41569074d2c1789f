//! Hash-chain primitives: entry hashing and window verification.
//!
//! Hash input layout (bytes, in order):
//!   1. sequence as 8-byte little-endian
//!   2. entry id as 16 raw bytes
//!   3. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   4. canonical JSON of the entry body (everything except the two hashes)
//!
//! The log evicts old entries, so verification works on the retained window:
//! the first retained entry's `prev_hash` is taken as the anchor unless it is
//! entry 0, which must link to `GENESIS_HASH`.

use serde::Serialize;
use sha2::{Digest, Sha256};

use marionette_contracts::{
    audit::{AuditEntry, Outcome},
    error::{MarionetteError, MarionetteResult},
};

/// The `prev_hash` of the first entry ever written.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// The hashed part of an entry. Field order is part of the hash layout.
#[derive(Serialize)]
struct EntryBody<'a> {
    timestamp: &'a chrono::DateTime<chrono::Utc>,
    capability: &'a str,
    arguments: &'a str,
    effective: Option<&'a str>,
    outcome: Outcome,
    error: Option<&'a str>,
}

/// Compute the hash for `entry` from its content and `prev_hash`.
///
/// The stored `entry.hash` is ignored. Returns a lowercase 64-character hex
/// string.
pub fn hash_entry(entry: &AuditEntry) -> MarionetteResult<String> {
    let body = EntryBody {
        timestamp: &entry.timestamp,
        capability: &entry.capability,
        arguments: &entry.arguments,
        effective: entry.effective.as_deref(),
        outcome: entry.outcome,
        error: entry.error.as_deref(),
    };
    let body_json = serde_json::to_vec(&body).map_err(|e| MarionetteError::AuditWriteFailed {
        reason: format!("audit entry is not serializable: {e}"),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(entry.sequence.to_le_bytes());
    hasher.update(entry.id.as_bytes());
    hasher.update(entry.prev_hash.as_bytes());
    hasher.update(&body_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Verify a window of consecutive entries.
///
/// Valid when sequences are consecutive, each `prev_hash` links to the
/// preceding entry's `hash`, each `hash` matches its recomputed value, and an
/// entry with sequence 0 links to `GENESIS_HASH`. An empty window is valid.
pub fn verify_window(entries: &[AuditEntry]) -> bool {
    let mut expected: Option<(u64, &str)> = None;

    for entry in entries {
        match expected {
            Some((sequence, prev)) => {
                if entry.sequence != sequence || entry.prev_hash != prev {
                    return false;
                }
            }
            None => {
                if entry.sequence == 0 && entry.prev_hash != GENESIS_HASH {
                    return false;
                }
            }
        }

        match hash_entry(entry) {
            Ok(recomputed) if recomputed == entry.hash => {}
            _ => return false,
        }

        expected = Some((entry.sequence + 1, entry.hash.as_str()));
    }

    true
}
