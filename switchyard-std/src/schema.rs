//! Schema adapters.
//!
//! - [`JsonSchema`]: validates tool input against a JSON Schema document
//!   (behind the default `jsonschema` feature).
//! - [`FnSchema`]: wraps a closure, for hand-written validation.
//! - [`AnyInput`]: accepts everything.

use serde_json::{Value, json};
use switchyard_core::{Schema, SchemaError};

// ============================================================================
// JSON Schema
// ============================================================================

/// A [`Schema`] backed by a compiled JSON Schema document.
///
/// ```rust
/// use serde_json::json;
/// use switchyard_core::Schema;
/// use switchyard_std::schema::JsonSchema;
///
/// let schema = JsonSchema::new(json!({
///     "type": "object",
///     "properties": { "q": { "type": "string" } },
///     "required": ["q"]
/// }))
/// .unwrap();
///
/// assert!(schema.validate(&json!({"q": "rust"})).is_ok());
/// assert!(schema.validate(&json!({"q": 123})).is_err());
/// ```
#[cfg(feature = "jsonschema")]
pub struct JsonSchema {
    document: Value,
    validator: jsonschema::Validator,
}

#[cfg(feature = "jsonschema")]
impl JsonSchema {
    /// Compile a schema document.
    pub fn new(document: Value) -> Result<Self, SchemaError> {
        let validator = jsonschema::validator_for(&document)
            .map_err(|err| SchemaError::new(format!("invalid schema: {err}")))?;
        Ok(Self {
            document,
            validator,
        })
    }

    /// The schema document this validator was compiled from.
    pub fn document(&self) -> &Value {
        &self.document
    }
}

#[cfg(feature = "jsonschema")]
impl Schema for JsonSchema {
    fn validate(&self, input: &Value) -> Result<Value, SchemaError> {
        let errors: Vec<String> = self
            .validator
            .iter_errors(input)
            .map(|err| err.to_string())
            .collect();

        if errors.is_empty() {
            Ok(input.clone())
        } else {
            Err(SchemaError::new(errors.join("; ")))
        }
    }

    fn json_schema(&self) -> Value {
        self.document.clone()
    }
}

#[cfg(feature = "jsonschema")]
impl std::fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSchema")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Closure Schema
// ============================================================================

/// A [`Schema`] that delegates to a closure.
///
/// The closure may transform the input; whatever it returns is what the
/// handler sees.
pub struct FnSchema<F> {
    validate: F,
    document: Value,
}

impl<F> FnSchema<F>
where
    F: Fn(&Value) -> Result<Value, SchemaError> + Send + Sync + 'static,
{
    /// Wrap a validation closure. The advertised JSON Schema is `{}`.
    pub fn new(validate: F) -> Self {
        Self {
            validate,
            document: json!({}),
        }
    }

    /// Advertise a JSON Schema document alongside the closure.
    pub fn with_document(mut self, document: Value) -> Self {
        self.document = document;
        self
    }
}

impl<F> Schema for FnSchema<F>
where
    F: Fn(&Value) -> Result<Value, SchemaError> + Send + Sync + 'static,
{
    fn validate(&self, input: &Value) -> Result<Value, SchemaError> {
        (self.validate)(input)
    }

    fn json_schema(&self) -> Value {
        self.document.clone()
    }
}

/// A [`Schema`] that accepts any input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyInput;

impl Schema for AnyInput {
    fn validate(&self, input: &Value) -> Result<Value, SchemaError> {
        Ok(input.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "jsonschema")]
    #[test]
    fn test_json_schema_reports_violation() {
        let schema = JsonSchema::new(json!({
            "type": "object",
            "properties": { "q": { "type": "string" } },
            "required": ["q"]
        }))
        .unwrap();

        let err = schema.validate(&json!({"q": 123})).unwrap_err();
        assert!(err.message().contains("string"), "got: {}", err.message());
        assert_eq!(schema.json_schema()["required"], json!(["q"]));
    }

    #[cfg(feature = "jsonschema")]
    #[test]
    fn test_json_schema_rejects_bad_document() {
        assert!(JsonSchema::new(json!({"type": 42})).is_err());
    }

    #[test]
    fn test_fn_schema_can_transform() {
        let schema = FnSchema::new(|input: &Value| match input.get("n").and_then(Value::as_i64) {
            Some(n) => Ok(json!({"n": n * 2})),
            None => Err(SchemaError::new("n is required")),
        });

        assert_eq!(schema.validate(&json!({"n": 2})).unwrap(), json!({"n": 4}));
        assert_eq!(
            schema.validate(&json!({})).unwrap_err().message(),
            "n is required"
        );
    }
}
