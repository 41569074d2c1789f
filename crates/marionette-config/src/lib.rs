//! # marionette-config
//!
//! TOML deployment configuration: which capability variant is exposed, how
//! many audit entries are retained, and how commands are interpreted.
//!
//! ```rust,ignore
//! use marionette_config::MarionetteConfig;
//!
//! let config = MarionetteConfig::from_file(Path::new("config/marionette.toml"))?;
//! ```

pub mod loader;
pub mod settings;

pub use settings::{AssistantMode, AssistantSettings, AuditSettings, MarionetteConfig, Variant};

// ── Tests ─────────────────────────────────────────────────────────────────────
