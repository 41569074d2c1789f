//! The event state container.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use marionette_core::traits::StateContainer;

/// One ticket tier. Names are unique case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketType {
    pub id: String,
    /// Casing of the first insertion.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventState {
    pub event_name: String,
    pub event_description: String,
    pub ticket_types: Vec<TicketType>,
    pub waitlist_enabled: bool,
}

impl EventState {
    /// The ticket whose name matches `name` ignoring case.
    pub fn ticket(&self, name: &str) -> Option<&TicketType> {
        let key = name.to_lowercase();
        self.ticket_types.iter().find(|t| t.name.to_lowercase() == key)
    }
}

impl StateContainer for EventState {
    const REQUIRED_SLOTS: &'static [&'static str] =
        &["eventName", "eventDescription", "ticketTypes", "waitlistEnabled"];

    fn check_invariants(&self) -> Result<(), String> {
        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for ticket in &self.ticket_types {
            if !names.insert(ticket.name.to_lowercase()) {
                return Err(format!("ticket type '{}' is listed more than once", ticket.name));
            }
            if !ids.insert(ticket.id.as_str()) {
                return Err(format!("ticket id '{}' is used more than once", ticket.id));
            }
        }
        Ok(())
    }
}
