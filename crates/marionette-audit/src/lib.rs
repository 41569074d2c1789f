//! # marionette-audit
//!
//! Bounded, append-only, SHA-256 hash-chained audit log for the MARIONETTE
//! capability registry.
//!
//! ## Overview
//!
//! Every invocation the registry handles is wrapped in an `AuditEntry` that
//! links to the previous entry via its SHA-256 hash. The log keeps the most
//! recent entries (100 by default) and evicts the oldest first. Tampering with
//! any retained entry breaks the chain and is detected by `verify_window`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use marionette_audit::BoundedAuditLog;
//! use marionette_core::traits::AuditTrail;
//!
//! let log = BoundedAuditLog::new(100);
//! log.record(&invocation)?;
//! assert!(log.verify_integrity());
//! ```

pub mod chain;
pub mod memory;

pub use chain::{hash_entry, verify_window, GENESIS_HASH};
pub use memory::{BoundedAuditLog, DEFAULT_CAPACITY};

// ── Tests ─────────────────────────────────────────────────────────────────────
