//! `UiSurface`: validation and mutation for the UI-manipulation variant.

use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use marionette_contracts::{
    capability::CapabilityOutput,
    error::MarionetteResult,
};
use marionette_core::{
    args::{char_len, ArgumentMap},
    traits::{Applied, AuditTrail, CapabilitySurface},
};

use crate::capabilities::*;
use crate::state::{Element, ElementBody, ElementKind, StoryElement, StoryType, Style, UiState};
use crate::theme::Theme;

/// Substrings that make a background declaration unsafe, matched
/// case-insensitively.
pub const DANGEROUS_PATTERNS: [&str; 6] = [
    "javascript:",
    "data:",
    "vbscript:",
    "onload",
    "onerror",
    "<script",
];

/// The UI-manipulation capability set.
#[derive(Debug, Default, Clone, Copy)]
pub struct UiSurface;

impl CapabilitySurface for UiSurface {
    type State = UiState;
    type Command = UiCommand;
    type Query = UiQuery;

    fn variant(&self) -> &'static str {
        "ui"
    }

    fn apply(&self, command: UiCommand, state: &mut UiState, args: &ArgumentMap) -> MarionetteResult<Applied> {
        match command {
            UiCommand::AddButton => {
                let text = text_arg(args, "text", "button text", MAX_LABEL_CHARS)?;
                let body = ElementBody::Button { text: text.clone() };
                let (id, style) = push_element(state, args, body)?;
                Ok(Applied::new(
                    CapabilityOutput::Id(id.clone()),
                    json!({ "text": text, "id": id, "style": style }),
                ))
            }
            UiCommand::AddCard => {
                let title = text_arg(args, "title", "card title", MAX_CARD_TITLE_CHARS)?;
                let content = text_arg(args, "content", "card content", MAX_CARD_CONTENT_CHARS)?;
                let body = ElementBody::Card {
                    title: title.clone(),
                    content: content.clone(),
                };
                let (id, style) = push_element(state, args, body)?;
                Ok(Applied::new(
                    CapabilityOutput::Id(id.clone()),
                    json!({ "title": title, "content": content, "id": id, "style": style }),
                ))
            }
            UiCommand::AddCounter => {
                let label = text_arg(args, "label", "counter label", MAX_LABEL_CHARS)?;
                let body = ElementBody::Counter { label: label.clone() };
                let (id, style) = push_element(state, args, body)?;
                state.counters.entry(id.clone()).or_insert(0.0);
                Ok(Applied::new(
                    CapabilityOutput::Id(id.clone()),
                    json!({ "label": label, "id": id, "style": style }),
                ))
            }
            UiCommand::AddImage => {
                let content = text_arg(args, "content", "image content", MAX_IMAGE_CONTENT_CHARS)?;
                let alt = text_arg(args, "alt", "image alt text", MAX_IMAGE_ALT_CHARS)?;
                let body = ElementBody::Image {
                    content: content.clone(),
                    alt: alt.clone(),
                };
                let (id, style) = push_element(state, args, body)?;
                Ok(Applied::new(
                    CapabilityOutput::Id(id.clone()),
                    json!({ "content": content, "alt": alt, "id": id, "style": style }),
                ))
            }
            UiCommand::AddStoryElement => {
                let raw_type = args.required_str("type")?;
                let story_type = StoryType::parse(raw_type).ok_or_else(|| {
                    args.invalid(format!(
                        "story type must be one of: title, paragraph, character (got '{raw_type}')"
                    ))
                })?;
                let content = text_arg(args, "content", "story content", MAX_STORY_CHARS)?;
                let id = claim_id(state, args)?;
                state.story_elements.push(StoryElement {
                    id: id.clone(),
                    story_type,
                    content: content.clone(),
                    created_at: Utc::now(),
                });
                Ok(Applied::new(
                    CapabilityOutput::Id(id.clone()),
                    json!({ "type": story_type.as_str(), "content": content, "id": id }),
                ))
            }
            UiCommand::IncrementCounter => {
                let id = args
                    .optional_id("id")?
                    .ok_or_else(|| args.invalid("counter id is required"))?;
                let amount = args.optional_number("amount")?.unwrap_or(1.0);
                if !(amount > 0.0 && amount <= MAX_INCREMENT) {
                    return Err(args.invalid(format!(
                        "increment amount must be greater than 0 and at most {MAX_INCREMENT}, got {amount}"
                    )));
                }
                let counter = state.counters.entry(id.clone()).or_insert(0.0);
                let old_value = *counter;
                *counter += amount;
                let new_value = *counter;
                Ok(Applied::new(
                    CapabilityOutput::Number(new_value),
                    json!({ "id": id, "amount": amount, "oldValue": old_value, "newValue": new_value }),
                ))
            }
            UiCommand::ChangeBackground => {
                let style = background_arg(args)?;
                state.background_style = style.clone();
                Ok(Applied::new(
                    CapabilityOutput::Text(style.clone()),
                    json!({ "style": style }),
                ))
            }
            UiCommand::SetTheme => {
                let raw = args.required_str("themeName")?;
                let theme = Theme::parse(raw).ok_or_else(|| {
                    args.invalid(format!(
                        "theme must be one of: {} (got '{raw}')",
                        Theme::NAMES.join(", ")
                    ))
                })?;
                let style = theme.background();
                state.background_style = style.clone();
                Ok(Applied::new(
                    CapabilityOutput::Text(theme.as_str().to_string()),
                    json!({ "themeName": theme.as_str(), "themeStyle": style }),
                ))
            }
            UiCommand::ClearAllElements => {
                let before_count = state.total_elements();
                state.elements.clear();
                state.story_elements.clear();
                state.counters.clear();
                state.background_style.clear();
                debug!(before_count, "ui state cleared");
                Ok(Applied::new(
                    CapabilityOutput::Flag(true),
                    json!({ "beforeCount": before_count }),
                ))
            }
        }
    }

    fn query(
        &self,
        query: UiQuery,
        state: &UiState,
        audit: &dyn AuditTrail,
        args: &ArgumentMap,
    ) -> MarionetteResult<CapabilityOutput> {
        match query {
            UiQuery::GetElementCount => {
                let count = match args.optional_str("elementType")?.map(str::trim) {
                    None | Some("") => state.total_elements(),
                    Some("story") => state.story_elements.len(),
                    Some(other) => match ElementKind::parse(other) {
                        Some(kind) => state.elements.iter().filter(|e| e.kind() == kind).count(),
                        None => 0,
                    },
                };
                Ok(CapabilityOutput::Count(count as u64))
            }
            UiQuery::GetActiveTheme => Ok(CapabilityOutput::Text(
                state.active_theme().as_str().to_string(),
            )),
            UiQuery::GetActionLog => {
                let limit = args.optional_count("limit")?.unwrap_or(DEFAULT_LOG_LIMIT);
                Ok(CapabilityOutput::Entries(audit.recent(limit)?))
            }
        }
    }

    fn fallback(&self, query: UiQuery) -> CapabilityOutput {
        match query {
            UiQuery::GetElementCount => CapabilityOutput::Count(0),
            UiQuery::GetActiveTheme => CapabilityOutput::Text(Theme::Default.as_str().to_string()),
            UiQuery::GetActionLog => CapabilityOutput::Entries(Vec::new()),
        }
    }
}

// ── Validation helpers ────────────────────────────────────────────────────────

/// A required text argument, trimmed, non-empty and at most `max` characters.
fn text_arg(args: &ArgumentMap, name: &str, label: &str, max: usize) -> MarionetteResult<String> {
    let value = args
        .optional_str(name)?
        .map(str::trim)
        .unwrap_or_default();
    if value.is_empty() {
        return Err(args.invalid(format!("{label} must be a non-empty string")));
    }
    if char_len(value) > max {
        return Err(args.invalid(format!("{label} must be {max} characters or less")));
    }
    Ok(value.to_string())
}

/// A background declaration that passed the length and denylist checks.
fn background_arg(args: &ArgumentMap) -> MarionetteResult<String> {
    let style = args.optional_str("style")?.map(str::trim).unwrap_or_default();
    if style.is_empty() {
        return Err(args.invalid("background style must be a non-empty string"));
    }
    if char_len(style) > MAX_BACKGROUND_CHARS {
        return Err(args.invalid(format!(
            "background style must be {MAX_BACKGROUND_CHARS} characters or less"
        )));
    }
    let lowered = style.to_lowercase();
    if let Some(pattern) = DANGEROUS_PATTERNS.iter().find(|p| lowered.contains(*p)) {
        return Err(args.invalid(format!(
            "background style contains potentially dangerous content ('{pattern}')"
        )));
    }
    Ok(style.to_string())
}

/// The caller's id if it is free, or a fresh one.
fn claim_id(state: &UiState, args: &ArgumentMap) -> MarionetteResult<String> {
    match args.optional_id("id")? {
        Some(id) if state.id_in_use(&id) => {
            Err(args.invalid(format!("element id '{id}' is already in use")))
        }
        Some(id) => Ok(id),
        None => Ok(Uuid::new_v4().to_string()),
    }
}

/// Append an element built from `body`; returns its id and resolved style.
fn push_element(state: &mut UiState, args: &ArgumentMap, body: ElementBody) -> MarionetteResult<(String, Value)> {
    let id = claim_id(state, args)?;
    let style = Style::resolve(body.kind(), args.optional_object("style")?);
    let style_json = serde_json::to_value(&style).map_err(|e| args.invalid(e.to_string()))?;
    state.elements.push(Element {
        id: id.clone(),
        body,
        style,
        visible: true,
        created_at: Utc::now(),
    });
    Ok((id, style_json))
}
