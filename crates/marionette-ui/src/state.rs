//! The UI state container and the records it holds.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use marionette_core::traits::StateContainer;

use crate::theme::Theme;

// ── Element kinds and styles ──────────────────────────────────────────────────

/// The kinds of element the `elements` slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Button,
    Card,
    Counter,
    Image,
}

impl ElementKind {
    pub const ALL: [ElementKind; 4] = [Self::Button, Self::Card, Self::Counter, Self::Image];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Card => "card",
            Self::Counter => "counter",
            Self::Image => "image",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// The color an element of this kind gets when none (or an unknown one)
    /// is requested.
    pub fn default_color(self) -> Color {
        match self {
            Self::Button | Self::Image => Color::Purple,
            Self::Card => Color::Blue,
            Self::Counter => Color::Green,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Purple,
    Blue,
    Green,
    Red,
    Gold,
    Magic,
}

impl Color {
    pub const ALL: [Color; 6] = [
        Self::Purple,
        Self::Blue,
        Self::Green,
        Self::Red,
        Self::Gold,
        Self::Magic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Purple => "purple",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Red => "red",
            Self::Gold => "gold",
            Self::Magic => "magic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Small,
    #[default]
    Medium,
    Large,
}

impl Size {
    pub const ALL: [Size; 3] = [Self::Small, Self::Medium, Self::Large];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|size| size.as_str() == s)
    }
}

/// The visual style of an element. Only these three keys survive; anything
/// else a caller sends is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub color: Color,
    /// Buttons only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    pub theme: Theme,
}

impl Style {
    /// Resolve a caller-supplied style object for an element of `kind`.
    ///
    /// Unknown colors fall back to the kind's default color, unknown sizes to
    /// medium, unknown themes to `default`.
    pub fn resolve(kind: ElementKind, requested: Option<&Map<String, Value>>) -> Self {
        let field = |name: &str| requested.and_then(|m| m.get(name)).and_then(Value::as_str);

        let color = field("color")
            .and_then(Color::parse)
            .unwrap_or_else(|| kind.default_color());
        let size = match kind {
            ElementKind::Button => Some(field("size").and_then(Size::parse).unwrap_or_default()),
            _ => None,
        };
        let theme = field("theme").and_then(Theme::parse).unwrap_or_default();

        Self { color, size, theme }
    }
}

// ── Records ───────────────────────────────────────────────────────────────────

/// Kind-specific fields of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ElementBody {
    Button { text: String },
    Card { title: String, content: String },
    Counter { label: String },
    Image { content: String, alt: String },
}

impl ElementBody {
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Button { .. } => ElementKind::Button,
            Self::Card { .. } => ElementKind::Card,
            Self::Counter { .. } => ElementKind::Counter,
            Self::Image { .. } => ElementKind::Image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,
    #[serde(flatten)]
    pub body: ElementBody,
    pub style: Style,
    pub visible: bool,
    pub created_at: DateTime<Utc>,
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        self.body.kind()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryType {
    Title,
    Paragraph,
    Character,
}

impl StoryType {
    pub const ALL: [StoryType; 3] = [Self::Title, Self::Paragraph, Self::Character];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Paragraph => "paragraph",
            Self::Character => "character",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryElement {
    pub id: String,
    pub story_type: StoryType,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// ── State container ───────────────────────────────────────────────────────────

/// Everything the UI-manipulation capabilities may touch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    /// Rendered elements, in insertion order.
    pub elements: Vec<Element>,
    /// The story sequence, in insertion order.
    pub story_elements: Vec<StoryElement>,
    /// Counter values keyed by element id. Absent means 0.
    pub counters: BTreeMap<String, f64>,
    /// CSS background declaration; empty for the default look.
    pub background_style: String,
}

impl UiState {
    /// Elements plus story elements.
    pub fn total_elements(&self) -> usize {
        self.elements.len() + self.story_elements.len()
    }

    /// True when `id` names an element or a story element.
    pub fn id_in_use(&self, id: &str) -> bool {
        self.elements.iter().any(|e| e.id == id) || self.story_elements.iter().any(|s| s.id == id)
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Current value of the counter keyed by `id`.
    pub fn counter(&self, id: &str) -> f64 {
        self.counters.get(id).copied().unwrap_or(0.0)
    }

    /// The theme whose gradient the background currently carries.
    pub fn active_theme(&self) -> Theme {
        Theme::detect(&self.background_style)
    }
}

impl StateContainer for UiState {
    const REQUIRED_SLOTS: &'static [&'static str] =
        &["elements", "storyElements", "counters", "backgroundStyle"];

    fn check_invariants(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        let ids = self
            .elements
            .iter()
            .map(|e| e.id.as_str())
            .chain(self.story_elements.iter().map(|s| s.id.as_str()));
        for id in ids {
            if !seen.insert(id) {
                return Err(format!("element id '{id}' is used more than once"));
            }
        }
        Ok(())
    }
}
