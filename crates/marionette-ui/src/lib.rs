//! # marionette-ui
//!
//! The UI-manipulation capability set: buttons, cards, counters, images, a
//! story sequence, and the page background.
//!
//! ## Capabilities
//!
//! | Name | Kind | Returns |
//! |---|---|---|
//! | `addButton`, `addCard`, `addCounter`, `addImage`, `addStoryElement` | command | element id |
//! | `incrementCounter` | command | new counter value |
//! | `changeBackground` | command | applied style |
//! | `setTheme` | command | theme name |
//! | `clearAllElements` | command | `true` |
//! | `getElementCount`, `getActiveTheme`, `getActionLog` | query | count, theme, entries |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use marionette_ui::{ui_registry, UiState};
//!
//! let registry = ui_registry(UiState::default(), 100)?;
//! let id = registry.dispatch("addButton", serde_json::json!({ "text": "Launch" }))?;
//! ```

pub mod capabilities;
pub mod state;
pub mod surface;
pub mod theme;

pub use capabilities::{UiCommand, UiQuery};
pub use state::{Color, Element, ElementBody, ElementKind, Size, StoryElement, StoryType, Style, UiState};
pub use surface::{UiSurface, DANGEROUS_PATTERNS};
pub use theme::Theme;

use marionette_audit::BoundedAuditLog;
use marionette_contracts::error::MarionetteResult;
use marionette_core::CapabilityRegistry;
use marionette_schema::JsonSchemaCheck;

/// A registry exposing the UI-manipulation capabilities.
pub type UiRegistry = CapabilityRegistry<UiSurface>;

/// Build a UI registry over `state` with a bounded audit log of `capacity`
/// entries and the JSON Schema argument check.
pub fn ui_registry(state: UiState, capacity: usize) -> MarionetteResult<UiRegistry> {
    CapabilityRegistry::new(
        UiSurface,
        state,
        Box::new(BoundedAuditLog::new(capacity)),
        Box::new(JsonSchemaCheck::new()),
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
