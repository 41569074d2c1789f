//! Loading and validating `MarionetteConfig` documents.

use std::path::Path;

use tracing::{debug, warn};

use marionette_contracts::error::{MarionetteError, MarionetteResult};

use crate::settings::MarionetteConfig;

impl MarionetteConfig {
    /// Parse `s` as TOML and validate the result.
    ///
    /// Returns `MarionetteError::ConfigError` if the TOML is malformed, does
    /// not match the expected schema, or holds an out-of-range value.
    pub fn from_toml_str(s: &str) -> MarionetteResult<Self> {
        let config: MarionetteConfig = toml::from_str(s).map_err(|e| MarionetteError::ConfigError {
            reason: format!("failed to parse configuration TOML: {}", e),
        })?;
        config.validate()?;
        debug!(
            variant = config.variant.as_str(),
            audit_capacity = config.audit.capacity,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Read the file at `path` and parse it as a configuration document.
    pub fn from_file(path: &Path) -> MarionetteResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| MarionetteError::ConfigError {
            reason: format!("failed to read configuration file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Check value ranges that the TOML schema cannot express.
    pub fn validate(&self) -> MarionetteResult<()> {
        let mut problems = Vec::new();

        if self.audit.capacity == 0 {
            problems.push("audit.capacity must be at least 1".to_string());
        }
        let temperature = self.assistant.temperature;
        if !(0.0..=2.0).contains(&temperature) {
            problems.push(format!(
                "assistant.temperature must be between 0 and 2, got {temperature}"
            ));
        }
        if self.assistant.session_limit == 0 {
            problems.push("assistant.session_limit must be at least 1".to_string());
        }
        if self.assistant.model.trim().is_empty() {
            problems.push("assistant.model must not be empty".to_string());
        }
        if self.assistant.timeout_secs == 0 {
            problems.push("assistant.timeout_secs must be at least 1".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            warn!(problems = %problems.join("; "), "configuration rejected");
            Err(MarionetteError::ConfigError {
                reason: problems.join("; "),
            })
        }
    }
}
