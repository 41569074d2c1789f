//! Argument normalization and typed access.
//!
//! Callers may supply arguments positionally (in descriptor parameter order)
//! or by name. `ArgumentMap::normalize` turns both into one named map with
//! `null` values dropped, so "absent" and "explicitly null" mean the same
//! thing to every capability.

use serde_json::{Map, Value};

use marionette_contracts::{
    capability::{Arguments, CapabilityDescriptor},
    error::{MarionetteError, MarionetteResult},
};

/// Normalized, named arguments for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentMap {
    capability: &'static str,
    values: Map<String, Value>,
}

impl ArgumentMap {
    /// Build a map directly from named values.
    pub fn new(capability: &'static str, values: Map<String, Value>) -> Self {
        let values = values.into_iter().filter(|(_, v)| !v.is_null()).collect();
        Self { capability, values }
    }

    /// Map supplied arguments onto the descriptor's parameters.
    ///
    /// Positional arguments beyond the declared parameter count are rejected.
    /// Named arguments are taken as-is; unknown names are left for the
    /// structural check to report.
    pub fn normalize(descriptor: &CapabilityDescriptor, args: &Arguments) -> MarionetteResult<Self> {
        match args {
            Arguments::Named(map) => Ok(Self::new(descriptor.name, map.clone())),
            Arguments::Positional(values) => {
                if values.len() > descriptor.params.len() {
                    return Err(MarionetteError::validation(
                        descriptor.name,
                        format!(
                            "expected at most {} arguments, got {}",
                            descriptor.params.len(),
                            values.len()
                        ),
                    ));
                }
                let named = descriptor
                    .params
                    .iter()
                    .zip(values.iter())
                    .map(|(param, value)| (param.name.to_string(), value.clone()))
                    .collect();
                Ok(Self::new(descriptor.name, named))
            }
        }
    }

    pub fn capability(&self) -> &'static str {
        self.capability
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// The normalized arguments as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// A validation error attributed to this invocation's capability.
    pub fn invalid(&self, reason: impl Into<String>) -> MarionetteError {
        MarionetteError::validation(self.capability, reason)
    }

    pub fn required_str(&self, name: &str) -> MarionetteResult<&str> {
        self.optional_str(name)?
            .ok_or_else(|| self.invalid(format!("'{name}' is required")))
    }

    pub fn optional_str(&self, name: &str) -> MarionetteResult<Option<&str>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(self.invalid(format!("'{name}' must be a string, got {other}"))),
        }
    }

    pub fn optional_number(&self, name: &str) -> MarionetteResult<Option<f64>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.invalid(format!("'{name}' is not a finite number"))),
            Some(other) => Err(self.invalid(format!("'{name}' must be a number, got {other}"))),
        }
    }

    pub fn optional_bool(&self, name: &str) -> MarionetteResult<Option<bool>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(self.invalid(format!("'{name}' must be a boolean, got {other}"))),
        }
    }

    /// A non-negative integer, such as a result limit.
    pub fn optional_count(&self, name: &str) -> MarionetteResult<Option<usize>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| {
                    self.invalid(format!("'{name}' must be a non-negative integer, got {value}"))
                }),
        }
    }

    pub fn optional_object(&self, name: &str) -> MarionetteResult<Option<&Map<String, Value>>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(other) => Err(self.invalid(format!("'{name}' must be an object, got {other}"))),
        }
    }

    /// An identifier: a non-empty string, or a non-negative integral number
    /// rendered in decimal. `42` and `"42"` name the same record.
    pub fn optional_id(&self, name: &str) -> MarionetteResult<Option<String>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(Some(s.trim().to_string())),
            Some(Value::Number(n)) => {
                if let Some(int) = n.as_u64() {
                    return Ok(Some(int.to_string()));
                }
                match n.as_f64() {
                    Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
                        Ok(Some((f as u64).to_string()))
                    }
                    _ => Err(self.invalid(format!(
                        "'{name}' must be a non-negative integer or a string, got {n}"
                    ))),
                }
            }
            Some(other) => Err(self.invalid(format!(
                "'{name}' must be a non-negative integer or a non-empty string, got {other}"
            ))),
        }
    }
}

/// Length of `s` in characters, the unit every length rule is stated in.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}
