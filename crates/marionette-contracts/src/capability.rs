//! Capability descriptors, parameter schemas, arguments and results.
//!
//! A capability is a single named operation an external (AI-driven) caller may
//! invoke. Its descriptor is the complete contract: the parameter list drives
//! positional-argument mapping, structural checks, and the function
//! definitions handed to an LLM.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::audit::AuditEntry;

/// The JSON type a parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    /// An element identifier: a string or a non-negative integer.
    Id,
}

/// A constraint attached to a parameter.
///
/// `Suggested` is advisory only: it is published to the LLM as examples but
/// never rejects a value. Capabilities that fall back on unknown values use it
/// instead of `OneOf`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Constraint {
    MinLength { value: usize },
    MaxLength { value: usize },
    OneOf { values: Vec<&'static str> },
    Suggested { values: Vec<&'static str> },
    ExclusiveMinimum { value: f64 },
    Minimum { value: f64 },
    Maximum { value: f64 },
    Properties { fields: Vec<ParamSpec> },
}

/// One entry of a capability's ordered parameter list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub param_type: ParamType,
    pub required: bool,
    pub constraints: Vec<Constraint>,
}

impl ParamSpec {
    /// A parameter the caller must supply.
    pub fn required(name: &'static str, param_type: ParamType, description: &'static str) -> Self {
        Self {
            name,
            description,
            param_type,
            required: true,
            constraints: Vec::new(),
        }
    }

    /// A parameter the capability defaults when absent.
    pub fn optional(name: &'static str, param_type: ParamType, description: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }

    /// Attach a constraint.
    pub fn with(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Bound a string parameter's length in characters.
    pub fn length(self, min: usize, max: usize) -> Self {
        self.with(Constraint::MinLength { value: min })
            .with(Constraint::MaxLength { value: max })
    }

    /// Restrict a string parameter to a fixed set.
    pub fn one_of(self, values: &[&'static str]) -> Self {
        self.with(Constraint::OneOf { values: values.to_vec() })
    }
}

/// The full contract of one capability.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    /// Read-only capabilities never mutate state and degrade to a safe
    /// default instead of failing.
    pub read_only: bool,
    pub params: Vec<ParamSpec>,
}

impl CapabilityDescriptor {
    pub fn command(name: &'static str, description: &'static str, params: Vec<ParamSpec>) -> Self {
        Self {
            name,
            description,
            read_only: false,
            params,
        }
    }

    pub fn query(name: &'static str, description: &'static str, params: Vec<ParamSpec>) -> Self {
        Self {
            name,
            description,
            read_only: true,
            params,
        }
    }

    /// Look up a parameter by name.
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// Arguments as supplied by the caller.
///
/// LLM function calls arrive as a JSON object; scripted callers may pass a
/// positional array matching the descriptor's parameter order. Both are
/// normalized to named arguments before validation, but the audit log keeps
/// them exactly as supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Arguments {
    Positional(Vec<Value>),
    Named(Map<String, Value>),
}

impl Arguments {
    /// No arguments at all.
    pub fn none() -> Self {
        Self::Named(Map::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Positional(values) => values.is_empty(),
            Self::Named(map) => map.is_empty(),
        }
    }

    /// The arguments as a JSON value, in the shape they were supplied.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Positional(values) => Value::Array(values.clone()),
            Self::Named(map) => Value::Object(map.clone()),
        }
    }
}

impl Default for Arguments {
    fn default() -> Self {
        Self::none()
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(values: Vec<Value>) -> Self {
        Self::Positional(values)
    }
}

impl From<Map<String, Value>> for Arguments {
    fn from(map: Map<String, Value>) -> Self {
        Self::Named(map)
    }
}

impl From<Value> for Arguments {
    /// Arrays become positional, objects named, `null` empty; any other
    /// scalar is a single positional argument.
    fn from(value: Value) -> Self {
        match value {
            Value::Array(values) => Self::Positional(values),
            Value::Object(map) => Self::Named(map),
            Value::Null => Self::none(),
            scalar => Self::Positional(vec![scalar]),
        }
    }
}

/// The value a successful invocation hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CapabilityOutput {
    /// Identifier of a created or updated record.
    Id(String),
    /// A numeric value such as a counter.
    Number(f64),
    /// A count of records.
    Count(u64),
    /// A string such as an applied style or theme name.
    Text(String),
    Flag(bool),
    /// Audit log entries, oldest first.
    Entries(Vec<AuditEntry>),
}

impl CapabilityOutput {
    pub fn as_id(&self) -> Option<&str> {
        match self {
            Self::Id(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_count(&self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_entries(&self) -> Option<&[AuditEntry]> {
        match self {
            Self::Entries(entries) => Some(entries),
            _ => None,
        }
    }
}
