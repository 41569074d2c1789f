//! Canned background themes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Space,
    Ocean,
    Forest,
    Sunset,
    Magical,
    Corporate,
    #[default]
    Default,
}

impl Theme {
    /// Every theme. Detection tries them in this order.
    pub const ALL: [Theme; 7] = [
        Self::Space,
        Self::Ocean,
        Self::Forest,
        Self::Sunset,
        Self::Magical,
        Self::Corporate,
        Self::Default,
    ];

    pub const NAMES: [&'static str; 7] = [
        "space",
        "ocean",
        "forest",
        "sunset",
        "magical",
        "corporate",
        "default",
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Space => "space",
            Self::Ocean => "ocean",
            Self::Forest => "forest",
            Self::Sunset => "sunset",
            Self::Magical => "magical",
            Self::Corporate => "corporate",
            Self::Default => "default",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s.trim())
    }

    /// The gradient that identifies this theme. `Default` has none.
    pub fn gradient(self) -> Option<&'static str> {
        match self {
            Self::Space => Some("linear-gradient(135deg, #0c0c0c 0%, #1a1a2e 50%, #16213e 100%)"),
            Self::Ocean => Some("linear-gradient(135deg, #667eea 0%, #764ba2 100%)"),
            Self::Forest => Some("linear-gradient(135deg, #134e5e 0%, #71b280 100%)"),
            Self::Sunset => Some("linear-gradient(135deg, #fa709a 0%, #fee140 100%)"),
            Self::Magical => {
                Some("linear-gradient(135deg, #667eea 0%, #764ba2 50%, #f093fb 100%)")
            }
            Self::Corporate => Some("linear-gradient(135deg, #2c3e50 0%, #34495e 100%)"),
            Self::Default => None,
        }
    }

    /// The background declaration this theme applies; empty for `Default`.
    pub fn background(self) -> String {
        self.gradient()
            .map(|g| format!("background: {g}"))
            .unwrap_or_default()
    }

    /// The first theme whose gradient appears in `background`, or `Default`.
    pub fn detect(background: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.gradient().is_some_and(|g| background.contains(g)))
            .unwrap_or_default()
    }
}
