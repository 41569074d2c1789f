//! # marionette-schema
//!
//! JSON Schema rendering of capability descriptors.
//!
//! This crate provides:
//!
//! 1. **Function definitions**: the tool list handed to an LLM
//!    function-calling API, derived from each capability's parameter list.
//! 2. **Structural checks**: `JsonSchemaCheck`, an `ArgumentCheck` that
//!    validates normalized arguments with the `jsonschema` crate before the
//!    capability's own validation runs.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use marionette_schema::{function_definitions, JsonSchemaCheck};
//!
//! let tools = function_definitions(&registry.descriptors());
//! let checker = Box::new(JsonSchemaCheck::new());
//! ```

pub mod check;
pub mod definition;

pub use check::JsonSchemaCheck;
pub use definition::{function_definition, function_definitions, schema_for, structural_schema_for};

// ── Tests ─────────────────────────────────────────────────────────────────────
