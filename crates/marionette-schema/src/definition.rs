//! Capability descriptors rendered as JSON Schema documents.
//!
//! Two renderings exist:
//!
//! - **Published** (`schema_for`): everything an LLM needs to form a call,
//!   including length and numeric bounds and advisory examples.
//! - **Structural** (`structural_schema_for`): types, required parameters,
//!   fixed value sets and unknown-name rejection only. Length and numeric
//!   bounds are left to the capability, which applies them to trimmed and
//!   sanitized values.

use serde_json::{json, Map, Value};

use marionette_contracts::capability::{CapabilityDescriptor, Constraint, ParamSpec, ParamType};

/// Which constraints a rendering carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rendering {
    Published,
    Structural,
}

/// The published parameter schema of `descriptor`.
pub fn schema_for(descriptor: &CapabilityDescriptor) -> Value {
    object_schema(&descriptor.params, Rendering::Published, true)
}

/// The schema the structural argument check validates against.
pub fn structural_schema_for(descriptor: &CapabilityDescriptor) -> Value {
    object_schema(&descriptor.params, Rendering::Structural, true)
}

/// One function definition in the shape LLM function-calling APIs expect:
/// `{ "name", "description", "parameters" }`.
pub fn function_definition(descriptor: &CapabilityDescriptor) -> Value {
    json!({
        "name": descriptor.name,
        "description": descriptor.description,
        "parameters": schema_for(descriptor),
    })
}

/// Function definitions for every descriptor, in the given order.
pub fn function_definitions(descriptors: &[CapabilityDescriptor]) -> Vec<Value> {
    descriptors.iter().map(function_definition).collect()
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn object_schema(params: &[ParamSpec], rendering: Rendering, closed: bool) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in params {
        properties.insert(param.name.to_string(), param_schema(param, rendering));
        if param.required {
            required.push(Value::String(param.name.to_string()));
        }
    }

    let mut schema = Map::new();
    schema.insert("type".into(), json!("object"));
    schema.insert("properties".into(), Value::Object(properties));
    schema.insert("required".into(), Value::Array(required));
    if closed {
        schema.insert("additionalProperties".into(), Value::Bool(false));
    }
    Value::Object(schema)
}

fn param_schema(param: &ParamSpec, rendering: Rendering) -> Value {
    // Nested objects stay open: unknown style keys are dropped by the
    // capability, not rejected.
    let nested = param.constraints.iter().find_map(|c| match c {
        Constraint::Properties { fields } => Some(fields.as_slice()),
        _ => None,
    });

    let mut schema = match (param.param_type, nested) {
        (ParamType::Object, Some(fields)) => match object_schema(fields, rendering, false) {
            Value::Object(map) => map,
            _ => Map::new(),
        },
        (param_type, _) => {
            let mut map = Map::new();
            map.insert("type".into(), type_of(param_type));
            if param_type == ParamType::Id {
                map.insert("minLength".into(), json!(1));
                map.insert("minimum".into(), json!(0));
            }
            map
        }
    };

    if !param.description.is_empty() {
        schema.insert("description".into(), json!(param.description));
    }

    for constraint in &param.constraints {
        match (constraint, rendering) {
            (Constraint::OneOf { values }, _) => {
                schema.insert("enum".into(), json!(values));
            }
            (Constraint::MinLength { value }, Rendering::Published) => {
                schema.insert("minLength".into(), json!(value));
            }
            (Constraint::MaxLength { value }, Rendering::Published) => {
                schema.insert("maxLength".into(), json!(value));
            }
            (Constraint::Suggested { values }, Rendering::Published) => {
                schema.insert("examples".into(), json!(values));
            }
            (Constraint::ExclusiveMinimum { value }, Rendering::Published) => {
                schema.insert("exclusiveMinimum".into(), json!(value));
            }
            (Constraint::Minimum { value }, Rendering::Published) => {
                schema.insert("minimum".into(), json!(value));
            }
            (Constraint::Maximum { value }, Rendering::Published) => {
                schema.insert("maximum".into(), json!(value));
            }
            _ => {}
        }
    }

    Value::Object(schema)
}

fn type_of(param_type: ParamType) -> Value {
    match param_type {
        ParamType::String => json!("string"),
        ParamType::Number => json!("number"),
        ParamType::Integer => json!("integer"),
        ParamType::Boolean => json!("boolean"),
        ParamType::Object => json!("object"),
        ParamType::Id => json!(["string", "integer"]),
    }
}
