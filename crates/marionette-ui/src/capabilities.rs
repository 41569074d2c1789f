//! The UI-manipulation capability set.
//!
//! Parameter order matters: positional arguments are mapped onto it.

use marionette_contracts::capability::{CapabilityDescriptor, Constraint, ParamSpec, ParamType};
use marionette_core::traits::CapabilityKey;

use crate::theme::Theme;

/// Longest button text, counter label and similar short strings.
pub const MAX_LABEL_CHARS: usize = 100;
pub const MAX_CARD_TITLE_CHARS: usize = 200;
pub const MAX_CARD_CONTENT_CHARS: usize = 1000;
pub const MAX_IMAGE_CONTENT_CHARS: usize = 50;
pub const MAX_IMAGE_ALT_CHARS: usize = 200;
pub const MAX_STORY_CHARS: usize = 2000;
pub const MAX_BACKGROUND_CHARS: usize = 500;
pub const MAX_INCREMENT: f64 = 1000.0;
pub const DEFAULT_LOG_LIMIT: usize = 50;

/// Capabilities that change `UiState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UiCommand {
    AddButton,
    AddCard,
    AddCounter,
    AddImage,
    AddStoryElement,
    IncrementCounter,
    ChangeBackground,
    SetTheme,
    ClearAllElements,
}

/// Read-only capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UiQuery {
    GetElementCount,
    GetActiveTheme,
    GetActionLog,
}

// ── Shared parameter specs ────────────────────────────────────────────────────

fn id_param() -> ParamSpec {
    ParamSpec::optional("id", ParamType::Id, "Unique element id; generated when omitted")
}

fn style_param() -> ParamSpec {
    ParamSpec::optional("style", ParamType::Object, "Visual style of the element").with(
        Constraint::Properties {
            fields: vec![
                ParamSpec::optional("color", ParamType::String, "Color scheme").with(
                    Constraint::Suggested {
                        values: vec!["purple", "blue", "green", "red", "gold", "magic"],
                    },
                ),
                ParamSpec::optional("size", ParamType::String, "Button size").with(
                    Constraint::Suggested {
                        values: vec!["small", "medium", "large"],
                    },
                ),
                ParamSpec::optional("theme", ParamType::String, "Visual theme").with(
                    Constraint::Suggested {
                        values: Theme::NAMES.to_vec(),
                    },
                ),
            ],
        },
    )
}

// ── CapabilityKey impls ───────────────────────────────────────────────────────

impl CapabilityKey for UiCommand {
    fn all() -> &'static [Self] {
        &[
            Self::AddButton,
            Self::AddCard,
            Self::AddCounter,
            Self::AddImage,
            Self::AddStoryElement,
            Self::IncrementCounter,
            Self::ChangeBackground,
            Self::SetTheme,
            Self::ClearAllElements,
        ]
    }

    fn name(self) -> &'static str {
        match self {
            Self::AddButton => "addButton",
            Self::AddCard => "addCard",
            Self::AddCounter => "addCounter",
            Self::AddImage => "addImage",
            Self::AddStoryElement => "addStoryElement",
            Self::IncrementCounter => "incrementCounter",
            Self::ChangeBackground => "changeBackground",
            Self::SetTheme => "setTheme",
            Self::ClearAllElements => "clearAllElements",
        }
    }

    fn descriptor(self) -> CapabilityDescriptor {
        let name = self.name();
        match self {
            Self::AddButton => CapabilityDescriptor::command(
                name,
                "Add an interactive button to the interface",
                vec![
                    ParamSpec::required("text", ParamType::String, "Button label")
                        .length(1, MAX_LABEL_CHARS),
                    id_param(),
                    style_param(),
                ],
            ),
            Self::AddCard => CapabilityDescriptor::command(
                name,
                "Add an information card with a title and body text",
                vec![
                    ParamSpec::required("title", ParamType::String, "Card title")
                        .length(1, MAX_CARD_TITLE_CHARS),
                    ParamSpec::required("content", ParamType::String, "Card body text")
                        .length(1, MAX_CARD_CONTENT_CHARS),
                    id_param(),
                    style_param(),
                ],
            ),
            Self::AddCounter => CapabilityDescriptor::command(
                name,
                "Add a labelled counter starting at zero",
                vec![
                    ParamSpec::required("label", ParamType::String, "Counter label")
                        .length(1, MAX_LABEL_CHARS),
                    id_param(),
                    style_param(),
                ],
            ),
            Self::AddImage => CapabilityDescriptor::command(
                name,
                "Add an image, usually an emoji, with alternative text",
                vec![
                    ParamSpec::required("content", ParamType::String, "Image content or emoji")
                        .length(1, MAX_IMAGE_CONTENT_CHARS),
                    ParamSpec::required("alt", ParamType::String, "Alternative text")
                        .length(1, MAX_IMAGE_ALT_CHARS),
                    id_param(),
                    style_param(),
                ],
            ),
            Self::AddStoryElement => CapabilityDescriptor::command(
                name,
                "Append a title, paragraph or character to the story",
                vec![
                    ParamSpec::required("type", ParamType::String, "Story element type")
                        .one_of(&["title", "paragraph", "character"]),
                    ParamSpec::required("content", ParamType::String, "Story text")
                        .length(1, MAX_STORY_CHARS),
                    id_param(),
                ],
            ),
            Self::IncrementCounter => CapabilityDescriptor::command(
                name,
                "Increase a counter by an amount (default 1)",
                vec![
                    ParamSpec::required("id", ParamType::Id, "Counter id"),
                    ParamSpec::optional("amount", ParamType::Number, "Amount to add")
                        .with(Constraint::ExclusiveMinimum { value: 0.0 })
                        .with(Constraint::Maximum { value: MAX_INCREMENT }),
                ],
            ),
            Self::ChangeBackground => CapabilityDescriptor::command(
                name,
                "Set the interface background to a CSS declaration",
                vec![ParamSpec::required("style", ParamType::String, "CSS background declaration")
                    .length(1, MAX_BACKGROUND_CHARS)],
            ),
            Self::SetTheme => CapabilityDescriptor::command(
                name,
                "Apply a predefined background theme",
                vec![ParamSpec::required("themeName", ParamType::String, "Theme name")
                    .one_of(&Theme::NAMES)],
            ),
            Self::ClearAllElements => CapabilityDescriptor::command(
                name,
                "Remove every element, story element and counter and reset the background",
                Vec::new(),
            ),
        }
    }
}

impl CapabilityKey for UiQuery {
    fn all() -> &'static [Self] {
        &[Self::GetElementCount, Self::GetActiveTheme, Self::GetActionLog]
    }

    fn name(self) -> &'static str {
        match self {
            Self::GetElementCount => "getElementCount",
            Self::GetActiveTheme => "getActiveTheme",
            Self::GetActionLog => "getActionLog",
        }
    }

    fn descriptor(self) -> CapabilityDescriptor {
        let name = self.name();
        match self {
            Self::GetElementCount => CapabilityDescriptor::query(
                name,
                "Count elements, optionally of one kind",
                vec![ParamSpec::optional("elementType", ParamType::String, "Element kind to count")
                    .with(Constraint::Suggested {
                        values: vec!["button", "card", "counter", "image", "story"],
                    })],
            ),
            Self::GetActiveTheme => CapabilityDescriptor::query(
                name,
                "Name the theme the background currently shows",
                Vec::new(),
            ),
            Self::GetActionLog => CapabilityDescriptor::query(
                name,
                "Read the most recent audit log entries, newest last",
                vec![ParamSpec::optional("limit", ParamType::Integer, "Maximum entries (default 50)")
                    .with(Constraint::Minimum { value: 0.0 })],
            ),
        }
    }
}
