//! # marionette-core
//!
//! Whitelisted, validated, audited capability dispatch.
//!
//! This crate provides:
//! - The core traits (`StateContainer`, `CapabilityKey`, `CapabilitySurface`,
//!   `AuditTrail`, `ArgumentCheck`)
//! - `ArgumentMap`, the normalized view of positional or named arguments
//! - The `CapabilityRegistry` that wires them together under one lock
//!
//! ## Usage
//!
//! ```rust,ignore
//! use marionette_core::CapabilityRegistry;
//!
//! let registry = CapabilityRegistry::new(surface, state, audit, checker)?;
//! let handle = registry.available_capabilities().get("addButton").unwrap();
//! let id = handle.invoke(serde_json::json!({ "text": "Launch" }))?;
//! ```

pub mod args;
pub mod registry;
pub mod traits;

pub use args::{char_len, ArgumentMap};
pub use registry::{CapabilityHandle, CapabilityId, CapabilityRegistry, CapabilityTable};
pub use traits::{
    missing_slots, Applied, ArgumentCheck, AuditTrail, CapabilityKey, CapabilitySurface, NoQuery,
    StateContainer,
};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde::{Deserialize, Serialize};
    use serde_json::{json, Map, Value};

    use marionette_contracts::{
        audit::{AuditEntry, InvocationRecord, Outcome},
        capability::{CapabilityDescriptor, CapabilityOutput, ParamSpec, ParamType},
        error::{MarionetteError, MarionetteResult},
    };

    use super::*;

    // ── Mock helpers ─────────────────────────────────────────────────────────

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct NoteBoard {
        notes: Vec<String>,
        pinned: Option<String>,
    }

    impl StateContainer for NoteBoard {
        const REQUIRED_SLOTS: &'static [&'static str] = &["notes", "pinned"];

        fn check_invariants(&self) -> Result<(), String> {
            let mut seen = std::collections::HashSet::new();
            for note in &self.notes {
                if !seen.insert(note) {
                    return Err(format!("duplicate note '{note}'"));
                }
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    enum NoteCommand {
        AddNote,
        /// Writes to the staged state, then fails.
        Explode,
    }

    impl CapabilityKey for NoteCommand {
        fn all() -> &'static [Self] {
            &[Self::AddNote, Self::Explode]
        }

        fn name(self) -> &'static str {
            match self {
                Self::AddNote => "addNote",
                Self::Explode => "explode",
            }
        }

        fn descriptor(self) -> CapabilityDescriptor {
            match self {
                Self::AddNote => CapabilityDescriptor::command(
                    "addNote",
                    "Add a note",
                    vec![
                        ParamSpec::required("text", ParamType::String, "Note text").length(1, 10),
                        ParamSpec::optional("pin", ParamType::Boolean, "Pin the note"),
                    ],
                ),
                Self::Explode => CapabilityDescriptor::command("explode", "Always fails", vec![]),
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    enum NoteQuery {
        CountNotes,
    }

    impl CapabilityKey for NoteQuery {
        fn all() -> &'static [Self] {
            &[Self::CountNotes]
        }

        fn name(self) -> &'static str {
            "countNotes"
        }

        fn descriptor(self) -> CapabilityDescriptor {
            CapabilityDescriptor::query(
                "countNotes",
                "Count notes",
                vec![ParamSpec::optional("fail", ParamType::Boolean, "Force a failure")],
            )
        }
    }

    struct NoteSurface;

    impl CapabilitySurface for NoteSurface {
        type State = NoteBoard;
        type Command = NoteCommand;
        type Query = NoteQuery;

        fn variant(&self) -> &'static str {
            "notes"
        }

        fn apply(
            &self,
            command: NoteCommand,
            state: &mut NoteBoard,
            args: &ArgumentMap,
        ) -> MarionetteResult<Applied> {
            match command {
                NoteCommand::AddNote => {
                    let text = args.required_str("text")?.trim();
                    if text.is_empty() || char_len(text) > 10 {
                        return Err(args.invalid("text must be 1-10 characters"));
                    }
                    state.notes.push(text.to_string());
                    if args.optional_bool("pin")?.unwrap_or(false) {
                        state.pinned = Some(text.to_string());
                    }
                    Ok(Applied::new(
                        CapabilityOutput::Count(state.notes.len() as u64),
                        json!({ "text": text }),
                    ))
                }
                NoteCommand::Explode => {
                    state.notes.push("half-written".to_string());
                    Err(args.invalid("exploded after writing"))
                }
            }
        }

        fn query(
            &self,
            _query: NoteQuery,
            state: &NoteBoard,
            _audit: &dyn AuditTrail,
            args: &ArgumentMap,
        ) -> MarionetteResult<CapabilityOutput> {
            if args.optional_bool("fail")?.unwrap_or(false) {
                return Err(args.invalid("forced failure"));
            }
            Ok(CapabilityOutput::Count(state.notes.len() as u64))
        }

        fn fallback(&self, _query: NoteQuery) -> CapabilityOutput {
            CapabilityOutput::Count(0)
        }
    }

    /// Declares `addNote` as both a command and a query.
    struct ClashingSurface;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    enum ClashingQuery {
        AddNote,
    }

    impl CapabilityKey for ClashingQuery {
        fn all() -> &'static [Self] {
            &[Self::AddNote]
        }

        fn name(self) -> &'static str {
            "addNote"
        }

        fn descriptor(self) -> CapabilityDescriptor {
            CapabilityDescriptor::query("addNote", "Clashes with the command", vec![])
        }
    }

    impl CapabilitySurface for ClashingSurface {
        type State = NoteBoard;
        type Command = NoteCommand;
        type Query = ClashingQuery;

        fn variant(&self) -> &'static str {
            "clashing"
        }

        fn apply(&self, _: NoteCommand, _: &mut NoteBoard, _: &ArgumentMap) -> MarionetteResult<Applied> {
            unreachable!("construction must fail first")
        }

        fn query(
            &self,
            _: ClashingQuery,
            _: &NoteBoard,
            _: &dyn AuditTrail,
            _: &ArgumentMap,
        ) -> MarionetteResult<CapabilityOutput> {
            unreachable!("construction must fail first")
        }

        fn fallback(&self, _: ClashingQuery) -> CapabilityOutput {
            CapabilityOutput::Count(0)
        }
    }

    /// An audit trail that records every call for later inspection.
    #[derive(Clone)]
    struct MockAudit {
        records: Arc<Mutex<Vec<InvocationRecord>>>,
        fail: bool,
    }

    impl MockAudit {
        fn new() -> Self {
            Self {
                records: Arc::new(Mutex::new(vec![])),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn outcomes(&self) -> Vec<(String, Outcome)> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .map(|r| (r.capability.clone(), r.outcome))
                .collect()
        }
    }

    impl AuditTrail for MockAudit {
        fn record(&self, record: &InvocationRecord) -> MarionetteResult<AuditEntry> {
            if self.fail {
                return Err(MarionetteError::AuditWriteFailed {
                    reason: "disk full".to_string(),
                });
            }
            let mut records = self.records.lock().unwrap();
            records.push(record.clone());
            Ok(entry_for(records.len() as u64 - 1, record))
        }

        fn recent(&self, _limit: usize) -> MarionetteResult<Vec<AuditEntry>> {
            Ok(vec![])
        }

        fn len(&self) -> usize {
            self.records.lock().unwrap().len()
        }

        fn capacity(&self) -> usize {
            100
        }
    }

    struct AcceptAll;

    impl ArgumentCheck for AcceptAll {
        fn check(&self, _: &CapabilityDescriptor, _: &Map<String, Value>) -> Result<(), String> {
            Ok(())
        }
    }

    /// Rejects argument names the descriptor does not declare.
    struct KnownNamesOnly;

    impl ArgumentCheck for KnownNamesOnly {
        fn check(&self, descriptor: &CapabilityDescriptor, args: &Map<String, Value>) -> Result<(), String> {
            match args.keys().find(|k| descriptor.param(k).is_none()) {
                Some(unknown) => Err(format!("unknown argument '{unknown}'")),
                None => Ok(()),
            }
        }
    }

    fn entry_for(sequence: u64, record: &InvocationRecord) -> AuditEntry {
        AuditEntry {
            id: uuid::Uuid::from_u128(sequence as u128),
            sequence,
            timestamp: record.timestamp,
            capability: record.capability.clone(),
            arguments: record.arguments.to_string(),
            effective: record.effective.as_ref().map(|v| v.to_string()),
            outcome: record.outcome,
            error: record.error.clone(),
            prev_hash: String::new(),
            hash: String::new(),
        }
    }

    fn registry_with(audit: MockAudit) -> CapabilityRegistry<NoteSurface> {
        CapabilityRegistry::new(
            NoteSurface,
            NoteBoard::default(),
            Box::new(audit),
            Box::new(KnownNamesOnly),
        )
        .unwrap()
    }

    // ── Construction ─────────────────────────────────────────────────────────

    #[test]
    fn construction_rejects_snapshot_missing_slots() {
        let result = CapabilityRegistry::from_snapshot(
            NoteSurface,
            json!({ "notes": [] }),
            Box::new(MockAudit::new()),
            Box::new(AcceptAll),
        );
        match result {
            Err(MarionetteError::MissingStateSlots { missing }) => {
                assert_eq!(missing, vec!["pinned".to_string()]);
            }
            Err(other) => panic!("expected MissingStateSlots, got {other:?}"),
            Ok(_) => panic!("expected construction to fail"),
        }
    }

    #[test]
    fn construction_rejects_non_object_snapshot() {
        let result = CapabilityRegistry::from_snapshot(
            NoteSurface,
            json!("not a container"),
            Box::new(MockAudit::new()),
            Box::new(AcceptAll),
        );
        match result {
            Err(MarionetteError::MissingStateSlots { missing }) => assert_eq!(missing.len(), 2),
            Err(other) => panic!("expected MissingStateSlots, got {other:?}"),
            Ok(_) => panic!("expected construction to fail"),
        }
    }

    #[test]
    fn construction_rejects_state_violating_invariants() {
        let state = NoteBoard {
            notes: vec!["a".into(), "a".into()],
            pinned: None,
        };
        let result = CapabilityRegistry::new(NoteSurface, state, Box::new(MockAudit::new()), Box::new(AcceptAll));
        match result {
            Err(MarionetteError::InvalidState { reason }) => assert!(reason.contains("duplicate")),
            Err(other) => panic!("expected InvalidState, got {other:?}"),
            Ok(_) => panic!("expected construction to fail"),
        }
    }

    #[test]
    fn construction_from_complete_snapshot_succeeds() {
        let registry = CapabilityRegistry::from_snapshot(
            NoteSurface,
            json!({ "notes": ["x"], "pinned": null }),
            Box::new(MockAudit::new()),
            Box::new(AcceptAll),
        )
        .unwrap();
        assert_eq!(registry.snapshot().unwrap().notes, vec!["x".to_string()]);
    }

    #[test]
    fn construction_rejects_duplicate_capability_names() {
        let result = CapabilityRegistry::new(
            ClashingSurface,
            NoteBoard::default(),
            Box::new(MockAudit::new()),
            Box::new(AcceptAll),
        );
        match result {
            Err(MarionetteError::DuplicateCapability { name }) => assert_eq!(name, "addNote"),
            Err(other) => panic!("expected DuplicateCapability, got {other:?}"),
            Ok(_) => panic!("expected construction to fail"),
        }
    }

    // ── Capability table ─────────────────────────────────────────────────────

    #[test]
    fn table_lists_commands_and_queries() {
        let registry = registry_with(MockAudit::new());
        let table = registry.available_capabilities();

        let names: Vec<&str> = table.names().collect();
        assert_eq!(names, vec!["addNote", "countNotes", "explode"]);
        assert_eq!(table.len(), 3);
        assert!(table.get("countNotes").unwrap().is_read_only());
        assert!(!table.get("addNote").unwrap().is_read_only());
        assert!(table.get("eval").is_none());
        assert_eq!(registry.descriptors().len(), 3);
    }

    /// Handles enumerate the same capabilities as the names, in the same order.
    #[test]
    fn table_handles_cover_every_capability() {
        let registry = registry_with(MockAudit::new());
        let table = registry.available_capabilities();

        let handles: Vec<_> = table.handles().collect();
        assert_eq!(handles.len(), table.len());
        let handle_names: Vec<&str> = handles.iter().map(|h| h.name()).collect();
        assert_eq!(handle_names, table.names().collect::<Vec<_>>());
        for handle in &handles {
            assert_eq!(handle.descriptor().name, handle.name());
        }
        let read_only: Vec<&str> = handles.iter().filter(|h| h.is_read_only()).map(|h| h.name()).collect();
        assert_eq!(read_only, vec!["countNotes"]);
    }

    #[test]
    fn handle_invocation_matches_dispatch() {
        let audit = MockAudit::new();
        let registry = registry_with(audit.clone());
        let handle = registry.available_capabilities().get("addNote").unwrap();

        assert_eq!(handle.name(), "addNote");
        assert_eq!(handle.invoke(json!(["first"])).unwrap(), CapabilityOutput::Count(1));
        assert_eq!(
            registry.dispatch("addNote", json!({ "text": "second" })).unwrap(),
            CapabilityOutput::Count(2)
        );
        assert_eq!(audit.len(), 2);
    }

    // ── Dispatch ─────────────────────────────────────────────────────────────

    #[test]
    fn unknown_capability_is_refused_and_audited() {
        let audit = MockAudit::new();
        let registry = registry_with(audit.clone());

        for name in ["eval", "deleteEverything", "", "ADDNOTE"] {
            match registry.dispatch(name, json!(["x"])) {
                Err(MarionetteError::CapabilityNotFound { name: reported }) => assert_eq!(reported, name),
                other => panic!("expected CapabilityNotFound for '{name}', got {other:?}"),
            }
        }

        assert!(registry.snapshot().unwrap().notes.is_empty());
        assert!(audit.outcomes().iter().all(|(_, o)| *o == Outcome::Failure));
        assert_eq!(audit.len(), 4);
    }

    #[test]
    fn validation_failure_leaves_state_untouched() {
        let audit = MockAudit::new();
        let registry = registry_with(audit.clone());

        let err = registry.dispatch("addNote", json!(["this note is too long"])).unwrap_err();
        assert!(matches!(err, MarionetteError::Validation { .. }));
        assert!(registry.snapshot().unwrap().notes.is_empty());
        assert_eq!(audit.outcomes(), vec![("addNote".to_string(), Outcome::Failure)]);
    }

    #[test]
    fn failure_after_staged_write_is_discarded() {
        let registry = registry_with(MockAudit::new());
        registry.dispatch("addNote", json!(["kept"])).unwrap();

        assert!(registry.dispatch("explode", json!([])).is_err());
        assert_eq!(registry.snapshot().unwrap().notes, vec!["kept".to_string()]);
    }

    #[test]
    fn argument_check_rejection_is_a_validation_error() {
        let audit = MockAudit::new();
        let registry = registry_with(audit.clone());

        match registry.dispatch("addNote", json!({ "text": "ok", "script": "alert(1)" })) {
            Err(MarionetteError::Validation { capability, reason }) => {
                assert_eq!(capability, "addNote");
                assert!(reason.contains("script"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
        assert!(registry.snapshot().unwrap().notes.is_empty());
        assert_eq!(audit.len(), 1);
    }

    #[test]
    fn audit_failure_prevents_commit() {
        let registry = registry_with(MockAudit::failing());
        match registry.dispatch("addNote", json!(["lost"])) {
            Err(MarionetteError::AuditWriteFailed { .. }) => {}
            other => panic!("expected AuditWriteFailed, got {other:?}"),
        }
        assert!(registry.snapshot().unwrap().notes.is_empty());
    }

    #[test]
    fn success_records_supplied_and_effective_arguments() {
        let audit = MockAudit::new();
        let registry = registry_with(audit.clone());
        registry.dispatch("addNote", json!(["  padded  ", true])).unwrap();

        let records = audit.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].arguments, json!(["  padded  ", true]));
        assert_eq!(records[0].effective, Some(json!({ "text": "padded" })));
        assert_eq!(registry.snapshot().unwrap().pinned.as_deref(), Some("padded"));
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    #[test]
    fn query_failure_degrades_to_fallback() {
        let audit = MockAudit::new();
        let registry = registry_with(audit.clone());
        registry.dispatch("addNote", json!(["one"])).unwrap();

        assert_eq!(registry.dispatch("countNotes", json!([])).unwrap(), CapabilityOutput::Count(1));
        assert_eq!(
            registry.dispatch("countNotes", json!({ "fail": true })).unwrap(),
            CapabilityOutput::Count(0)
        );
        assert_eq!(
            audit.outcomes(),
            vec![
                ("addNote".to_string(), Outcome::Success),
                ("countNotes".to_string(), Outcome::Success),
                ("countNotes".to_string(), Outcome::Failure),
            ]
        );
    }

    #[test]
    fn query_survives_audit_failure() {
        let registry = registry_with(MockAudit::failing());
        assert_eq!(registry.dispatch("countNotes", json!([])).unwrap(), CapabilityOutput::Count(0));
    }
}
