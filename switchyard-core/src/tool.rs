//! # Tool Objects
//!
//! A [`Tool`] is an invocable capability handed to an LLM integration: a
//! description, an input schema and an `execute` function. The router hands
//! them out from `attach_tool` and `agent_as_tool`, and factory-registered
//! tools build them per call.
//!
//! ```rust
//! use serde_json::{Value, json};
//! use switchyard_core::{Tool, ToolCallOptions};
//!
//! # futures::executor::block_on(async {
//! let echo = Tool::new()
//!     .with_description("Echo the input back.")
//!     .with_execute(|input: Value, _opts: ToolCallOptions| async move { Ok(input) });
//!
//! let out = echo.execute(json!({"q": "hi"}), ToolCallOptions::default()).await.unwrap();
//! assert_eq!(out, json!({"q": "hi"}));
//! # });
//! ```

use crate::{
    error::{BoxError, RouterError},
    schema::{DynSchema, Schema},
};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::{fmt, future::Future, sync::Arc};

/// Future returned by a tool's execute function.
pub type ToolFuture = BoxFuture<'static, Result<Value, BoxError>>;

/// A shared, type-erased execute function.
pub type ToolExecuteFn = Arc<dyn Fn(Value, ToolCallOptions) -> ToolFuture + Send + Sync>;

/// Options passed alongside validated input when a tool runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCallOptions {
    /// Identifier of this tool call.
    pub tool_call_id: String,
    /// Conversation history visible to the tool.
    pub messages: Vec<Value>,
}

impl ToolCallOptions {
    /// Options with the given call id and no messages.
    pub fn with_id(tool_call_id: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            messages: Vec::new(),
        }
    }
}

/// An invocable capability: description, input schema and execute function.
#[derive(Clone, Default)]
pub struct Tool {
    name: Option<String>,
    description: Option<String>,
    input_schema: Option<DynSchema>,
    execute: Option<ToolExecuteFn>,
}

impl Tool {
    /// Create an empty tool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name (usually the path it was resolved from).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the description if one is given.
    pub fn with_optional_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Set the input schema.
    pub fn with_input_schema<S: Schema>(mut self, schema: S) -> Self {
        self.input_schema = Some(Arc::new(schema));
        self
    }

    /// Set an already shared input schema.
    pub fn with_shared_schema(mut self, schema: DynSchema) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Set the execute function.
    pub fn with_execute<F, Fut>(mut self, execute: F) -> Self
    where
        F: Fn(Value, ToolCallOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
    {
        self.execute = Some(Arc::new(move |input, options| execute(input, options).boxed()));
        self
    }

    /// The name, if set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The description, if set.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The input schema, if set.
    pub fn input_schema(&self) -> Option<&DynSchema> {
        self.input_schema.as_ref()
    }

    /// Returns `true` if the tool can be executed.
    pub fn has_execute(&self) -> bool {
        self.execute.is_some()
    }

    /// Run the tool.
    ///
    /// Input is passed through unvalidated; callers that need validation run
    /// the input schema first (the router does this for registered tools).
    pub async fn execute(&self, input: Value, options: ToolCallOptions) -> Result<Value, BoxError> {
        match &self.execute {
            Some(execute) => execute(input, options).await,
            None => Err(Box::new(RouterError::MissingToolExecute {
                path: self.name.clone().unwrap_or_default(),
            })),
        }
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("has_input_schema", &self.input_schema.is_some())
            .field("has_execute", &self.execute.is_some())
            .finish()
    }
}
