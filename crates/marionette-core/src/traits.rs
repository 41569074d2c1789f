//! Core trait definitions for the MARIONETTE registry.
//!
//! These traits define the trust boundary around a capability set:
//!
//! - `StateContainer`: the injected, mutable application state
//! - `CapabilityKey`: an enum naming each capability of a variant
//! - `CapabilitySurface`: validation and mutation logic for one variant
//! - `AuditTrail`: the bounded, append-only invocation log
//! - `ArgumentCheck`: structural argument checks run before validation
//!
//! The registry wires them together. A surface is never asked to mutate state
//! for a name that is not in its own `CapabilityKey` enums.

use std::fmt::Debug;
use std::hash::Hash;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use marionette_contracts::{
    audit::{AuditEntry, InvocationRecord},
    capability::{CapabilityDescriptor, CapabilityOutput},
    error::MarionetteResult,
};

use crate::args::ArgumentMap;

/// The mutable state a capability set operates on.
///
/// The serialized form of a container is a JSON object whose top-level keys
/// are its slots. `REQUIRED_SLOTS` lists the keys every container must carry;
/// the registry refuses to start over a container missing any of them.
pub trait StateContainer: Clone + Serialize + DeserializeOwned + Send + 'static {
    /// Slot names (serialized keys) the capability set depends on.
    const REQUIRED_SLOTS: &'static [&'static str];

    /// Check invariants the capabilities rely on, such as unique ids.
    ///
    /// Returns a human-readable reason on violation.
    fn check_invariants(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Return the required slots absent from a serialized state container.
///
/// A non-object value is missing every slot.
pub fn missing_slots<S: StateContainer>(value: &Value) -> Vec<String> {
    S::REQUIRED_SLOTS
        .iter()
        .filter(|slot| value.get(**slot).is_none())
        .map(|slot| slot.to_string())
        .collect()
}

/// An enum of capability names.
///
/// Implementations list every variant in `all()` and describe each one. The
/// registry builds its name table from `all()`, so a capability not listed
/// there cannot be reached.
pub trait CapabilityKey: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {
    /// Every capability of this kind, in publication order.
    fn all() -> &'static [Self];

    /// The external name callers dispatch on.
    fn name(self) -> &'static str;

    /// The full contract for this capability.
    fn descriptor(self) -> CapabilityDescriptor;
}

/// The empty query set, for variants that expose no read-only capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NoQuery {}

impl CapabilityKey for NoQuery {
    fn all() -> &'static [Self] {
        &[]
    }

    fn name(self) -> &'static str {
        match self {}
    }

    fn descriptor(self) -> CapabilityDescriptor {
        match self {}
    }
}

/// The result of a successful mutating capability.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    /// Value returned to the caller.
    pub output: CapabilityOutput,
    /// Sanitized or effective arguments, recorded in the audit log.
    pub effective: Value,
}

impl Applied {
    pub fn new(output: CapabilityOutput, effective: Value) -> Self {
        Self { output, effective }
    }
}

/// Validation and mutation logic for one capability variant.
///
/// Write capabilities (`Command`) and read-only capabilities (`Query`) are
/// separate enums with separate error policies: commands propagate every
/// error, queries degrade to `fallback()`.
pub trait CapabilitySurface: Send + Sync + 'static {
    type State: StateContainer;
    type Command: CapabilityKey;
    type Query: CapabilityKey;

    /// Short deployment name of this variant (e.g. "ui", "event").
    fn variant(&self) -> &'static str;

    /// Validate `args` and apply `command` to `state`.
    ///
    /// `state` is a staged copy: the registry discards it on error, so an
    /// implementation may fail at any point without leaving a partial write.
    fn apply(
        &self,
        command: Self::Command,
        state: &mut Self::State,
        args: &ArgumentMap,
    ) -> MarionetteResult<Applied>;

    /// Evaluate a read-only capability.
    fn query(
        &self,
        query: Self::Query,
        state: &Self::State,
        audit: &dyn AuditTrail,
        args: &ArgumentMap,
    ) -> MarionetteResult<CapabilityOutput>;

    /// The safe default a query returns when evaluation fails.
    fn fallback(&self, query: Self::Query) -> CapabilityOutput;
}

/// The audit log: every invocation produces exactly one entry.
pub trait AuditTrail: Send + Sync {
    /// Append one invocation record and return the stored entry.
    fn record(&self, record: &InvocationRecord) -> MarionetteResult<AuditEntry>;

    /// The most recent `limit` entries, oldest first.
    fn recent(&self, limit: usize) -> MarionetteResult<Vec<AuditEntry>>;

    /// Number of retained entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of retained entries.
    fn capacity(&self) -> usize;
}

/// Structural argument check run after normalization and before the
/// surface's own validation.
pub trait ArgumentCheck: Send + Sync {
    /// Return a reason when `args` do not fit `descriptor`.
    fn check(&self, descriptor: &CapabilityDescriptor, args: &Map<String, Value>) -> Result<(), String>;
}
