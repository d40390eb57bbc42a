//! Tool layers.
//!
//! A registered tool becomes a terminal layer whose handler validates the
//! branch params against the tool's schema before anything else runs. Input
//! the schema rejects never reaches the tool.

use crate::{
    context::Context,
    handler::{Handler, Next, ToolFactory, ToolHandler},
};
use serde_json::{Value, json};
use std::sync::Arc;
use switchyard_core::{CallResult, DynSchema, RouterError, Schema, ToolCallOptions};

/// Schema and description of a statically registered tool.
#[derive(Clone)]
pub struct ToolOptions {
    pub(crate) schema: DynSchema,
    pub(crate) description: Option<String>,
}

impl ToolOptions {
    /// Options with the given input schema and no description.
    pub fn new<S: Schema>(schema: S) -> Self {
        Self {
            schema: Arc::new(schema),
            description: None,
        }
    }

    /// Options with an already shared schema.
    pub fn shared(schema: DynSchema) -> Self {
        Self {
            schema,
            description: None,
        }
    }

    /// Set the description shown to models.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl std::fmt::Debug for ToolOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolOptions")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

fn validation_error(ctx: &Context, pattern: &str, detail: String) -> RouterError {
    ctx.logger()
        .error(format_args!("tool call validation failed for path {pattern}: {detail}"));
    RouterError::ToolValidation {
        path: pattern.to_owned(),
        detail,
    }
}

/// Layer handler of a statically registered tool.
pub(crate) struct StaticTool<H> {
    pub(crate) pattern: String,
    pub(crate) schema: DynSchema,
    pub(crate) handler: H,
}

impl<H: ToolHandler> Handler for StaticTool<H> {
    async fn call(&self, ctx: Context, _next: Next) -> CallResult {
        let input = Value::Object(ctx.params());
        let parsed = self
            .schema
            .validate(&input)
            .map_err(|err| validation_error(&ctx, &self.pattern, err.to_string()))?;
        self.handler.call(ctx, parsed).await
    }
}

/// Layer handler of a factory-registered tool.
pub(crate) struct FactoryTool {
    pub(crate) pattern: String,
    pub(crate) factory: Arc<dyn ToolFactory>,
}

impl Handler for FactoryTool {
    async fn call(&self, ctx: Context, _next: Next) -> CallResult {
        let tool = self.factory.build(&ctx);
        if !tool.has_execute() {
            return Err(RouterError::MissingToolExecute {
                path: self.pattern.clone(),
            });
        }

        let Some(schema) = tool.input_schema().cloned() else {
            ctx.logger().warn(format_args!(
                "factory tool at {} has no input schema; executing without params",
                self.pattern
            ));
            return Ok(tool.execute(json!({}), ToolCallOptions::default()).await?);
        };

        let parsed = schema
            .validate(&Value::Object(ctx.params()))
            .map_err(|err| validation_error(&ctx, &self.pattern, err.to_string()))?;

        let options = ToolCallOptions {
            tool_call_id: format!(
                "tool-{}-{}",
                last_segment(&self.pattern),
                ctx.response().generate_id()
            ),
            messages: ctx.messages().to_vec(),
        };
        Ok(tool.execute(parsed, options).await?)
    }
}

fn last_segment(pattern: &str) -> &str {
    pattern
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("direct-call")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("/tools/search"), "search");
        assert_eq!(last_segment("/files/:name"), ":name");
        assert_eq!(last_segment("/"), "direct-call");
    }
}
