#![allow(dead_code)]

use serde_json::{Value, json};
use std::sync::Arc;
use switchyard::{
    CallResult, Context, Next, Params, RequestInit, Router, RouterBuilder, ToolOptions,
    schema::JsonSchema, testing::RecordingSink,
};

// ============================================================================
// Params and Schemas
// ============================================================================

/// Build params from a JSON object literal.
pub fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        other => panic!("params must be a JSON object, got {other}"),
    }
}

/// `{ q: string }`, required.
pub fn query_schema_document() -> Value {
    json!({
        "type": "object",
        "properties": { "q": { "type": "string" } },
        "required": ["q"]
    })
}

pub fn query_tool_options() -> ToolOptions {
    ToolOptions::new(JsonSchema::new(query_schema_document()).unwrap())
        .with_description("Search the index.")
}

// ============================================================================
// Handlers
// ============================================================================

/// An agent that returns its params.
pub fn echo_params(builder: &mut RouterBuilder, pattern: &str) {
    builder
        .agent(pattern, |ctx: Context, _next: Next| async move {
            Ok(Value::Object(ctx.params()))
        })
        .unwrap();
}

// ============================================================================
// Running Requests
// ============================================================================

/// Run a request to completion against a recording sink.
pub async fn run(router: &Router, path: &str, init: RequestInit) -> (CallResult, RecordingSink) {
    let sink = RecordingSink::new();
    let outcome = router
        .handle_with_sink(path, init, Arc::new(sink.clone()))
        .await;
    (outcome, sink)
}
