//! The capability registry: the single authorization boundary between an
//! external (AI-driven) caller and the injected application state.
//!
//! Every dispatch follows the same pipeline under one lock:
//!
//!   Lookup → Normalize → Structural check → Validate+mutate (staged) → Audit → Commit
//!
//! A name missing from the capability table never reaches a surface. A
//! mutation is applied to a staged copy of the state and only replaces the
//! live state after its audit entry has been written, so a failed validation
//! or a failed audit write leaves the state untouched.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use tracing::{debug, info, warn};

use marionette_contracts::{
    audit::InvocationRecord,
    capability::{Arguments, CapabilityDescriptor, CapabilityOutput},
    error::{MarionetteError, MarionetteResult},
};

use crate::{
    args::ArgumentMap,
    traits::{missing_slots, ArgumentCheck, AuditTrail, CapabilityKey, CapabilitySurface, StateContainer},
};

/// A capability of a surface, tagged by its error policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityId<C, Q> {
    Command(C),
    Query(Q),
}

type IdOf<S> = CapabilityId<<S as CapabilitySurface>::Command, <S as CapabilitySurface>::Query>;

/// Owns one variant's capability table, its state, and its audit trail.
///
/// Construct one registry per session. The capability table is fixed at
/// construction; nothing can be added or removed afterwards.
pub struct CapabilityRegistry<S: CapabilitySurface> {
    surface: S,
    state: Mutex<S::State>,
    audit: Box<dyn AuditTrail>,
    checker: Box<dyn ArgumentCheck>,
    table: BTreeMap<&'static str, IdOf<S>>,
}

impl<S: CapabilitySurface> CapabilityRegistry<S> {
    /// Create a registry over an injected state container.
    ///
    /// Fails with `MissingStateSlots` if the container's serialized form lacks
    /// a required slot, `InvalidState` if it violates its own invariants, and
    /// `DuplicateCapability` if the surface declares a name twice.
    pub fn new(
        surface: S,
        state: S::State,
        audit: Box<dyn AuditTrail>,
        checker: Box<dyn ArgumentCheck>,
    ) -> MarionetteResult<Self> {
        let serialized = serde_json::to_value(&state).map_err(|e| MarionetteError::InvalidState {
            reason: format!("state container is not serializable: {e}"),
        })?;
        check_slots::<S::State>(&serialized)?;
        state
            .check_invariants()
            .map_err(|reason| MarionetteError::InvalidState { reason })?;

        let table = build_table::<S>()?;

        info!(
            variant = surface.variant(),
            capabilities = table.len(),
            audit_capacity = audit.capacity(),
            "capability registry constructed"
        );

        Ok(Self {
            surface,
            state: Mutex::new(state),
            audit,
            checker,
            table,
        })
    }

    /// Create a registry from a JSON snapshot of the state container.
    ///
    /// Missing slots are reported together, before any deserialization.
    pub fn from_snapshot(
        surface: S,
        snapshot: Value,
        audit: Box<dyn AuditTrail>,
        checker: Box<dyn ArgumentCheck>,
    ) -> MarionetteResult<Self> {
        check_slots::<S::State>(&snapshot)?;
        let state: S::State =
            serde_json::from_value(snapshot).map_err(|e| MarionetteError::InvalidState {
                reason: format!("state snapshot does not match the container shape: {e}"),
            })?;
        Self::new(surface, state, audit, checker)
    }

    /// Short deployment name of the active variant.
    pub fn variant(&self) -> &'static str {
        self.surface.variant()
    }

    /// The complete mapping from capability name to invocable handle.
    ///
    /// This is the only way to obtain a `CapabilityHandle`; a caller holding
    /// the table cannot reach anything outside it.
    pub fn available_capabilities(&self) -> CapabilityTable<'_, S> {
        CapabilityTable { registry: self }
    }

    /// Descriptors of every capability, in name order.
    pub fn descriptors(&self) -> Vec<CapabilityDescriptor> {
        self.table.values().map(|id| descriptor_of::<S>(*id)).collect()
    }

    /// Look up `name` and invoke it.
    ///
    /// A name outside the table fails with `CapabilityNotFound`, mutates
    /// nothing, and is recorded as a failure.
    pub fn dispatch(&self, name: &str, args: impl Into<Arguments>) -> MarionetteResult<CapabilityOutput> {
        let args = args.into();
        match self.table.get(name) {
            Some(id) => self.invoke(*id, &args),
            None => {
                let err = MarionetteError::CapabilityNotFound {
                    name: name.to_string(),
                };
                warn!(capability = %name, variant = self.variant(), "dispatch to unknown capability refused");
                // Hold the state lock so the entry is ordered with concurrent dispatches.
                let _guard = self.state.lock();
                self.audit
                    .record(&InvocationRecord::failure(name, args.to_json(), &err))?;
                Err(err)
            }
        }
    }

    /// A clone of the current state.
    pub fn snapshot(&self) -> MarionetteResult<S::State> {
        self.with_state(|state| state.clone())
    }

    /// Run `f` against the current state under the registry lock.
    pub fn with_state<R>(&self, f: impl FnOnce(&S::State) -> R) -> MarionetteResult<R> {
        let guard = self.lock_state()?;
        Ok(f(&*guard))
    }

    /// The audit trail every invocation is written to.
    pub fn audit(&self) -> &dyn AuditTrail {
        self.audit.as_ref()
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn invoke(&self, id: IdOf<S>, args: &Arguments) -> MarionetteResult<CapabilityOutput> {
        match id {
            CapabilityId::Command(command) => self.run_command(command, args),
            CapabilityId::Query(query) => Ok(self.run_query(query, args)),
        }
    }

    fn lock_state(&self) -> MarionetteResult<MutexGuard<'_, S::State>> {
        self.state.lock().map_err(|e| MarionetteError::StateUnavailable {
            reason: format!("state lock poisoned: {e}"),
        })
    }

    /// Normalize and structurally check arguments for `descriptor`.
    fn prepare(&self, descriptor: &CapabilityDescriptor, args: &Arguments) -> MarionetteResult<ArgumentMap> {
        let map = ArgumentMap::normalize(descriptor, args)?;
        self.checker
            .check(descriptor, map.values())
            .map_err(|reason| MarionetteError::validation(descriptor.name, reason))?;
        Ok(map)
    }

    fn run_command(&self, command: S::Command, args: &Arguments) -> MarionetteResult<CapabilityOutput> {
        let name = command.name();
        let supplied = args.to_json();

        let mut guard = match self.lock_state() {
            Ok(guard) => guard,
            Err(err) => {
                warn!(capability = name, error = %err, "command refused, state unavailable");
                self.audit.record(&InvocationRecord::failure(name, supplied, &err))?;
                return Err(err);
            }
        };

        debug!(capability = name, arguments = %supplied, "command starting");

        let descriptor = command.descriptor();
        let attempt = self.prepare(&descriptor, args).and_then(|map| {
            let mut staged = (*guard).clone();
            let applied = self.surface.apply(command, &mut staged, &map)?;
            Ok((staged, applied))
        });

        match attempt {
            Ok((staged, applied)) => {
                let entry = self
                    .audit
                    .record(&InvocationRecord::success(name, supplied, applied.effective))?;
                *guard = staged;
                info!(
                    capability = name,
                    sequence = entry.sequence,
                    outcome = entry.outcome.as_str(),
                    "command applied"
                );
                Ok(applied.output)
            }
            Err(err) => {
                warn!(capability = name, error = %err, "command rejected");
                self.audit.record(&InvocationRecord::failure(name, supplied, &err))?;
                Err(err)
            }
        }
    }

    /// Evaluate a query. Failures are recorded and degrade to the surface's
    /// safe default; they never reach the caller.
    fn run_query(&self, query: S::Query, args: &Arguments) -> CapabilityOutput {
        let name = query.name();
        let supplied = args.to_json();

        let guard = self.state.lock();
        let result = match &guard {
            Ok(state) => self.prepare(&query.descriptor(), args).and_then(|map| {
                let output = self.surface.query(query, state, self.audit.as_ref(), &map)?;
                Ok((output, map.to_value()))
            }),
            Err(e) => Err(MarionetteError::StateUnavailable {
                reason: format!("state lock poisoned: {e}"),
            }),
        };

        let (record, output) = match result {
            Ok((output, effective)) => {
                debug!(capability = name, "query evaluated");
                (InvocationRecord::success(name, supplied, effective), output)
            }
            Err(err) => {
                warn!(capability = name, error = %err, "query failed, returning safe default");
                (
                    InvocationRecord::failure(name, supplied, &err),
                    self.surface.fallback(query),
                )
            }
        };

        if let Err(err) = self.audit.record(&record) {
            warn!(capability = name, error = %err, "query could not be audited");
        }
        drop(guard);
        output
    }
}

/// The name → handle mapping returned by `available_capabilities()`.
pub struct CapabilityTable<'r, S: CapabilitySurface> {
    registry: &'r CapabilityRegistry<S>,
}

impl<'r, S: CapabilitySurface> CapabilityTable<'r, S> {
    /// The handle registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<CapabilityHandle<'r, S>> {
        self.registry.table.get(name).map(|id| CapabilityHandle {
            registry: self.registry,
            id: *id,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.table.contains_key(name)
    }

    /// Every capability name, sorted.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + 'r {
        let registry = self.registry;
        registry.table.keys().copied()
    }

    /// Every handle, in name order.
    pub fn handles(&self) -> impl Iterator<Item = CapabilityHandle<'r, S>> + 'r {
        let registry = self.registry;
        registry
            .table
            .values()
            .map(move |id| CapabilityHandle { registry, id: *id })
    }

    pub fn len(&self) -> usize {
        self.registry.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.table.is_empty()
    }
}

/// An invocable capability, bound to the registry that issued it.
pub struct CapabilityHandle<'r, S: CapabilitySurface> {
    registry: &'r CapabilityRegistry<S>,
    id: IdOf<S>,
}

impl<S: CapabilitySurface> Clone for CapabilityHandle<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: CapabilitySurface> Copy for CapabilityHandle<'_, S> {}

impl<S: CapabilitySurface> CapabilityHandle<'_, S> {
    pub fn name(&self) -> &'static str {
        match self.id {
            CapabilityId::Command(c) => c.name(),
            CapabilityId::Query(q) => q.name(),
        }
    }

    pub fn descriptor(&self) -> CapabilityDescriptor {
        descriptor_of::<S>(self.id)
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self.id, CapabilityId::Query(_))
    }

    /// Invoke the capability with positional or named arguments.
    pub fn invoke(&self, args: impl Into<Arguments>) -> MarionetteResult<CapabilityOutput> {
        self.registry.invoke(self.id, &args.into())
    }
}

fn descriptor_of<S: CapabilitySurface>(id: IdOf<S>) -> CapabilityDescriptor {
    match id {
        CapabilityId::Command(c) => c.descriptor(),
        CapabilityId::Query(q) => q.descriptor(),
    }
}

fn check_slots<T: StateContainer>(value: &Value) -> MarionetteResult<()> {
    let missing = missing_slots::<T>(value);
    if missing.is_empty() {
        Ok(())
    } else {
        warn!(missing = %missing.join(", "), "state container rejected");
        Err(MarionetteError::MissingStateSlots { missing })
    }
}

fn build_table<S: CapabilitySurface>() -> MarionetteResult<BTreeMap<&'static str, IdOf<S>>> {
    let mut table = BTreeMap::new();
    let ids = S::Command::all()
        .iter()
        .map(|c| CapabilityId::Command(*c))
        .chain(S::Query::all().iter().map(|q| CapabilityId::Query(*q)));

    for id in ids {
        let name = match id {
            CapabilityId::Command(c) => c.name(),
            CapabilityId::Query(q) => q.name(),
        };
        if table.insert(name, id).is_some() {
            return Err(MarionetteError::DuplicateCapability {
                name: name.to_string(),
            });
        }
    }
    Ok(table)
}
