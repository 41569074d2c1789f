//! # marionette-event
//!
//! The event-creation capability set: name, description, ticket types and
//! the waitlist flag.
//!
//! Ticket types are keyed by name ignoring case. Adding a name that already
//! exists updates that ticket in place and keeps the casing it was first
//! added with.

pub mod state;
pub mod surface;

pub use state::{EventState, TicketType};
pub use surface::{EventCommand, EventSurface};

use marionette_audit::BoundedAuditLog;
use marionette_contracts::error::MarionetteResult;
use marionette_core::CapabilityRegistry;
use marionette_schema::JsonSchemaCheck;

/// A registry exposing the event-creation capabilities.
pub type EventRegistry = CapabilityRegistry<EventSurface>;

/// Build an event registry over `state` with a bounded audit log of
/// `capacity` entries and the JSON Schema argument check.
pub fn event_registry(state: EventState, capacity: usize) -> MarionetteResult<EventRegistry> {
    CapabilityRegistry::new(
        EventSurface,
        state,
        Box::new(BoundedAuditLog::new(capacity)),
        Box::new(JsonSchemaCheck::new()),
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
