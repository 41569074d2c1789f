//! `JsonSchemaCheck`: the structural argument check backed by `jsonschema`.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use marionette_contracts::capability::CapabilityDescriptor;
use marionette_core::traits::ArgumentCheck;

use crate::definition::structural_schema_for;

/// Validates normalized arguments against the structural schema of the
/// capability being invoked.
///
/// Every violation is collected, so the caller sees the full set in one
/// message.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSchemaCheck;

impl JsonSchemaCheck {
    pub fn new() -> Self {
        Self
    }
}

impl ArgumentCheck for JsonSchemaCheck {
    fn check(&self, descriptor: &CapabilityDescriptor, args: &Map<String, Value>) -> Result<(), String> {
        let schema = structural_schema_for(descriptor);
        let validator = jsonschema::validator_for(&schema).map_err(|e| {
            warn!(capability = descriptor.name, error = %e, "schema compilation failure");
            format!("invalid argument schema: {e}")
        })?;

        let instance = Value::Object(args.clone());
        let violations: Vec<String> = validator
            .iter_errors(&instance)
            .map(|error| {
                let path = error.instance_path.to_string();
                if path.is_empty() {
                    error.to_string()
                } else {
                    format!("{path}: {error}")
                }
            })
            .collect();

        if violations.is_empty() {
            debug!(capability = descriptor.name, "arguments passed structural check");
            Ok(())
        } else {
            debug!(
                capability = descriptor.name,
                violations = violations.len(),
                "arguments failed structural check"
            );
            Err(violations.join("; "))
        }
    }
}
