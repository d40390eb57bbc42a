//! Input validation seam for tools.
//!
//! A [`Schema`] plays the role of `safeParse`: it either returns the parsed
//! input or a [`SchemaError`] describing why the input was rejected. The
//! router never invokes a tool handler with input its schema rejected.

use crate::error::SchemaError;
use serde_json::Value;
use std::sync::Arc;

/// Validates (and may coerce) tool input.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Schema`",
    label = "missing `Schema` implementation",
    note = "Schemas must implement `validate` and return the parsed input."
)]
pub trait Schema: Send + Sync + 'static {
    /// Validate `input`, returning the parsed value on success.
    fn validate(&self, input: &Value) -> Result<Value, SchemaError>;

    /// A JSON-Schema description of the accepted input, for LLM tool listings.
    fn json_schema(&self) -> Value {
        Value::Object(Default::default())
    }
}

impl<S: Schema + ?Sized> Schema for Arc<S> {
    fn validate(&self, input: &Value) -> Result<Value, SchemaError> {
        (**self).validate(input)
    }

    fn json_schema(&self) -> Value {
        (**self).json_schema()
    }
}

/// A shared, type-erased schema.
pub type DynSchema = Arc<dyn Schema>;
