//! Matching, ordering and path resolution through a built router.

mod common;

use common::{echo_params, params, run};
use regex::Regex;
use serde_json::{Value, json};
use switchyard::{
    RouterError,
    prelude::*,
    testing::{EventLog, RecordingHandler},
};

/// A middleware that records `label` and runs the rest of the chain.
fn tracing_layer(builder: &mut RouterBuilder, pattern: &str, log: &EventLog) {
    let label = pattern.to_owned();
    let log = log.clone();
    builder
        .middleware(pattern, move |_ctx: Context, next: Next| {
            log.record(label.clone());
            next.run()
        })
        .unwrap();
}

#[tokio::test]
async fn test_dynamic_params_extracted() {
    let mut builder = RouterBuilder::new();
    builder
        .tool(
            "/users/:id/posts/:post",
            ToolOptions::new(switchyard::schema::AnyInput),
            |_ctx: Context, input: Value| async move { Ok(input) },
        )
        .unwrap();
    let router = builder.build();

    let (outcome, _) = run(&router, "/users/1/posts/2", RequestInit::new()).await;
    assert_eq!(outcome.unwrap(), json!({ "id": "1", "post": "2" }));
}

#[tokio::test]
async fn test_path_params_override_request_params() {
    let mut builder = RouterBuilder::new();
    builder
        .tool(
            "/users/:id",
            ToolOptions::new(switchyard::schema::AnyInput),
            |_ctx: Context, input: Value| async move { Ok(input) },
        )
        .unwrap();
    let router = builder.build();

    let init = RequestInit::new().with_params(params(json!({ "id": "x", "verbose": true })));
    let (outcome, _) = run(&router, "/users/42", init).await;
    assert_eq!(outcome.unwrap(), json!({ "id": "42", "verbose": true }));
}

#[tokio::test]
async fn test_layers_run_general_to_specific() {
    let log = EventLog::new();
    let mut builder = RouterBuilder::new();

    // Registered out of order on purpose.
    let leaf = log.clone();
    builder
        .agent("/a/b", move |_ctx: Context, _next: Next| {
            let leaf = leaf.clone();
            async move {
                leaf.record("/a/b");
                Ok(Value::Null)
            }
        })
        .unwrap();
    tracing_layer(&mut builder, "/a", &log);
    tracing_layer(&mut builder, "/", &log);
    tracing_layer(&mut builder, "/a/:id", &log);
    let router = builder.build();

    let (outcome, _) = run(&router, "/a/b", RequestInit::new()).await;
    outcome.unwrap();
    assert_eq!(log.entries(), vec!["/", "/a", "/a/b"]);
}

#[tokio::test]
async fn test_internal_calls_match_exactly() {
    let prefix = RecordingHandler::passthrough();
    let wildcard = RecordingHandler::passthrough();
    let target = RecordingHandler::new().with_output(json!("bar"));

    let mut builder = RouterBuilder::new();
    builder
        .middleware_handler("/foo", prefix.clone())
        .unwrap()
        .middleware_handler("*", wildcard.clone())
        .unwrap()
        .agent_handler("/foo/bar", target.clone())
        .unwrap()
        .agent("/caller", |ctx: Context, _next: Next| async move {
            ctx.next().call_agent("@/foo/bar", Params::new()).await
        })
        .unwrap();
    let router = builder.build();

    let (outcome, _) = run(&router, "/caller", RequestInit::new()).await;
    assert_eq!(outcome.unwrap(), json!("bar"));
    assert_eq!(prefix.count(), 0);
    // The wildcard ran once, for the external call to /caller.
    assert_eq!(wildcard.count(), 1);
    assert_eq!(target.count(), 1);

    let (outcome, _) = run(&router, "/foo/bar", RequestInit::new()).await;
    assert_eq!(outcome.unwrap(), json!("bar"));
    assert_eq!(prefix.count(), 1);
    assert_eq!(wildcard.count(), 2);
}

#[tokio::test]
async fn test_middleware_prefix_respects_segments() {
    let recorder = RecordingHandler::passthrough();
    let mut builder = RouterBuilder::new();
    builder.middleware_handler("/foo", recorder.clone()).unwrap();
    echo_params(&mut builder, "/foobar");
    echo_params(&mut builder, "/foo/baz");
    let router = builder.build();

    run(&router, "/foobar", RequestInit::new()).await.0.unwrap();
    assert_eq!(recorder.count(), 0);

    run(&router, "/foo/baz", RequestInit::new()).await.0.unwrap();
    assert_eq!(recorder.count(), 1);
}

#[tokio::test]
async fn test_agent_pattern_params_are_literal() {
    let mut builder = RouterBuilder::new();
    echo_params(&mut builder, "/a/:id");
    let router = builder.build();

    let (outcome, _) = run(&router, "/a/b", RequestInit::new()).await;
    assert!(matches!(
        outcome,
        Err(RouterError::AgentNotFound { ref path }) if path == "/a/b"
    ));

    let (outcome, _) = run(&router, "/a/:id", RequestInit::new()).await;
    assert_eq!(outcome.unwrap(), json!({}));
}

#[tokio::test]
async fn test_agent_not_found() {
    let middleware = RecordingHandler::passthrough();
    let mut builder = RouterBuilder::new();
    builder.middleware_handler("*", middleware.clone()).unwrap();
    let router = builder.build();

    // Middleware alone is a match, so the chain runs and ends with null.
    let (outcome, _) = run(&router, "/nowhere", RequestInit::new()).await;
    assert_eq!(outcome.unwrap(), Value::Null);
    assert_eq!(middleware.count(), 1);

    let empty = RouterBuilder::new().build();
    let (outcome, _) = run(&empty, "/nowhere", RequestInit::new()).await;
    let err = outcome.unwrap_err();
    assert!(err.is_routing());
    assert_eq!(err.to_string(), "agent not found for path: /nowhere");
}

#[tokio::test]
async fn test_regex_patterns() {
    let mut builder = RouterBuilder::new();
    builder
        .agent(
            Regex::new(r"/items/(?P<sku>[a-z]+)").unwrap(),
            |ctx: Context, _next: Next| async move { Ok(json!(ctx.param_str("sku"))) },
        )
        .unwrap()
        .agent("/caller", |ctx: Context, _next: Next| async move {
            ctx.next().call_agent("@/shop/items/abc", Params::new()).await
        })
        .unwrap();
    let router = builder.build();

    // External matching is unanchored.
    let (outcome, _) = run(&router, "/shop/items/abc", RequestInit::new()).await;
    assert_eq!(outcome.unwrap(), json!("abc"));

    // Internal matching is anchored at both ends.
    let (outcome, _) = run(&router, "/caller", RequestInit::new()).await;
    assert!(matches!(outcome, Err(RouterError::AgentNotFound { .. })));
}

#[tokio::test]
async fn test_relative_and_root_paths() {
    let mut greeting = RouterBuilder::new();
    greeting
        .agent("/decide", |ctx: Context, _next: Next| async move {
            let sibling = ctx.next().call_agent("../formal", Params::new()).await?;
            let rooted = ctx.next().call_agent("@/status", Params::new()).await?;
            Ok(json!([sibling, rooted]))
        })
        .unwrap()
        .agent("/formal", |ctx: Context, _next: Next| async move {
            Ok(json!(ctx.path()))
        })
        .unwrap()
        .agent("/child", |ctx: Context, _next: Next| async move {
            ctx.next().call_agent("formal", Params::new()).await
        })
        .unwrap();

    let mut builder = RouterBuilder::new();
    builder
        .agent("/status", |_ctx: Context, _next: Next| async move { Ok(json!("ok")) })
        .unwrap()
        .mount("/greeting", greeting)
        .unwrap();
    let router = builder.build();

    let (outcome, _) = run(&router, "/greeting/decide", RequestInit::new()).await;
    assert_eq!(outcome.unwrap(), json!(["/greeting/formal", "ok"]));

    // A bare relative path resolves below the caller.
    let (outcome, _) = run(&router, "/greeting/child", RequestInit::new()).await;
    assert!(matches!(
        outcome,
        Err(RouterError::AgentNotFound { ref path }) if path == "/greeting/child/formal"
    ));
}

#[tokio::test]
async fn test_mounted_wildcard_scoped_to_prefix() {
    let scoped = RecordingHandler::passthrough();

    let mut admin = RouterBuilder::new();
    admin.middleware_handler("*", scoped.clone()).unwrap();
    echo_params(&mut admin, "/users");

    let mut builder = RouterBuilder::new();
    echo_params(&mut builder, "/public");
    builder.mount("/admin", admin).unwrap();
    let router = builder.build();

    run(&router, "/public", RequestInit::new()).await.0.unwrap();
    assert_eq!(scoped.count(), 0);

    run(&router, "/admin/users", RequestInit::new()).await.0.unwrap();
    assert_eq!(scoped.count(), 1);
    assert_eq!(scoped.calls()[0].path, "/admin/users");
}
