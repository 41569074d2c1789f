//! The event-creation capability set and its surface.

use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use marionette_contracts::{
    capability::{CapabilityDescriptor, CapabilityOutput, Constraint, ParamSpec, ParamType},
    error::MarionetteResult,
};
use marionette_core::{
    args::{char_len, ArgumentMap},
    traits::{Applied, AuditTrail, CapabilityKey, CapabilitySurface, NoQuery},
};

use crate::state::{EventState, TicketType};

/// Capabilities that change `EventState`. The event variant has no queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventCommand {
    SetEventName,
    SetEventDescription,
    AddTicketType,
    ToggleWaitlist,
}

impl CapabilityKey for EventCommand {
    fn all() -> &'static [Self] {
        &[
            Self::SetEventName,
            Self::SetEventDescription,
            Self::AddTicketType,
            Self::ToggleWaitlist,
        ]
    }

    fn name(self) -> &'static str {
        match self {
            Self::SetEventName => "setEventName",
            Self::SetEventDescription => "setEventDescription",
            Self::AddTicketType => "addTicketType",
            Self::ToggleWaitlist => "toggleWaitlist",
        }
    }

    fn descriptor(self) -> CapabilityDescriptor {
        let name = self.name();
        match self {
            Self::SetEventName => CapabilityDescriptor::command(
                name,
                "Set the event name",
                vec![ParamSpec::required("name", ParamType::String, "Event name").length(3, 100)],
            ),
            Self::SetEventDescription => CapabilityDescriptor::command(
                name,
                "Set the event description",
                vec![ParamSpec::required("description", ParamType::String, "Event description")
                    .length(10, 500)],
            ),
            Self::AddTicketType => CapabilityDescriptor::command(
                name,
                "Add a ticket type, or update the price of an existing one with the same name",
                vec![
                    ParamSpec::required("name", ParamType::String, "Ticket type name").length(2, 50),
                    ParamSpec::optional("price", ParamType::Number, "Ticket price")
                        .with(Constraint::Minimum { value: 0.0 }),
                ],
            ),
            Self::ToggleWaitlist => CapabilityDescriptor::command(
                name,
                "Enable or disable the waitlist (default disabled)",
                vec![ParamSpec::optional("enabled", ParamType::Boolean, "Whether the waitlist is on")],
            ),
        }
    }
}

/// The event-creation capability set.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventSurface;

impl CapabilitySurface for EventSurface {
    type State = EventState;
    type Command = EventCommand;
    type Query = NoQuery;

    fn variant(&self) -> &'static str {
        "event"
    }

    fn apply(&self, command: EventCommand, state: &mut EventState, args: &ArgumentMap) -> MarionetteResult<Applied> {
        match command {
            EventCommand::SetEventName => {
                let name = sanitized_arg(args, "name", "event name", 3, 100)?;
                state.event_name = name.clone();
                Ok(Applied::new(CapabilityOutput::Text(name.clone()), json!({ "name": name })))
            }
            EventCommand::SetEventDescription => {
                let description = sanitized_arg(args, "description", "event description", 10, 500)?;
                state.event_description = description.clone();
                Ok(Applied::new(
                    CapabilityOutput::Text(description.clone()),
                    json!({ "description": description }),
                ))
            }
            EventCommand::AddTicketType => {
                let name = sanitized_arg(args, "name", "ticket name", 2, 50)?;
                let price = args.optional_number("price")?;
                if let Some(p) = price {
                    if p < 0.0 {
                        return Err(args.invalid(format!(
                            "ticket price must be a non-negative number, got {p}"
                        )));
                    }
                }

                let key = name.to_lowercase();
                let existing = state
                    .ticket_types
                    .iter_mut()
                    .find(|t| t.name.to_lowercase() == key);
                let (ticket, updated) = match existing {
                    Some(ticket) => {
                        if price.is_some() {
                            ticket.price = price;
                        }
                        (ticket.clone(), true)
                    }
                    None => {
                        let ticket = TicketType {
                            id: Uuid::new_v4().to_string(),
                            name,
                            price,
                        };
                        state.ticket_types.push(ticket.clone());
                        (ticket, false)
                    }
                };
                debug!(ticket = %ticket.name, updated, "ticket type stored");

                Ok(Applied::new(
                    CapabilityOutput::Id(ticket.id.clone()),
                    json!({ "name": ticket.name, "price": ticket.price, "id": ticket.id, "updated": updated }),
                ))
            }
            EventCommand::ToggleWaitlist => {
                let enabled = args.optional_bool("enabled")?.unwrap_or(false);
                state.waitlist_enabled = enabled;
                Ok(Applied::new(CapabilityOutput::Flag(enabled), json!({ "enabled": enabled })))
            }
        }
    }

    fn query(
        &self,
        query: NoQuery,
        _state: &EventState,
        _audit: &dyn AuditTrail,
        _args: &ArgumentMap,
    ) -> MarionetteResult<CapabilityOutput> {
        match query {}
    }

    fn fallback(&self, query: NoQuery) -> CapabilityOutput {
        match query {}
    }
}

/// A required string with `<` and `>` stripped and whitespace trimmed, whose
/// sanitized length lies in `min..=max` characters.
fn sanitized_arg(args: &ArgumentMap, name: &str, label: &str, min: usize, max: usize) -> MarionetteResult<String> {
    let raw = args.required_str(name)?;
    let cleaned = raw.replace(['<', '>'], "");
    let cleaned = cleaned.trim();
    let len = char_len(cleaned);
    if len < min || len > max {
        return Err(args.invalid(format!(
            "{label} must be between {min} and {max} characters"
        )));
    }
    Ok(cleaned.to_string())
}
