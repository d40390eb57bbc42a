//! Request completion: the stream ends only after every branch finishes.

mod common;

use common::run;
use serde_json::{Value, json};
use std::sync::Arc;
use switchyard::{Chunk, RouterError, prelude::*, testing::EventLog};
use tokio::sync::Notify;

/// `/root` spawns `/slow` and `/fast` without awaiting them.
///
/// The branches are gated so the finish order is fixed: `/fast` waits for
/// `/root` to return and `/slow` waits for `/fast` to finish.
fn fan_out_router(log: &EventLog) -> Router {
    let root_done = Arc::new(Notify::new());
    let fast_done = Arc::new(Notify::new());
    let mut builder = RouterBuilder::new();

    for (path, gate, done) in [
        ("/slow", fast_done.clone(), None),
        ("/fast", root_done.clone(), Some(fast_done)),
    ] {
        let log = log.clone();
        builder
            .agent(path, move |ctx: Context, _next: Next| {
                let log = log.clone();
                let gate = gate.clone();
                let done = done.clone();
                async move {
                    gate.notified().await;
                    ctx.response().write_text(&ctx.path()[1..])?;
                    log.record(ctx.path());
                    if let Some(done) = done {
                        done.notify_one();
                    }
                    Ok(Value::Null)
                }
            })
            .unwrap();
    }

    let root_log = log.clone();
    builder
        .agent("/root", move |ctx: Context, _next: Next| {
            let log = root_log.clone();
            let root_done = root_done.clone();
            async move {
                let _slow = ctx.next().spawn_agent("@/slow", Params::new());
                let _fast = ctx.next().spawn_agent("@/fast", Params::new());
                log.record("/root");
                root_done.notify_one();
                Ok(json!("root done"))
            }
        })
        .unwrap();
    builder.build()
}

#[tokio::test]
async fn test_stream_waits_for_spawned_branches() {
    let log = EventLog::new();
    let router = fan_out_router(&log);

    let text = router
        .handle("/root", RequestInit::new())
        .collect_text()
        .await;
    log.record("stream finished");

    assert_eq!(text, "fastslow");
    assert_eq!(
        log.entries(),
        vec!["/root", "/fast", "/slow", "stream finished"]
    );
}

#[tokio::test]
async fn test_completion_resolves_with_root_outcome() {
    let log = EventLog::new();
    let router = fan_out_router(&log);

    let (outcome, sink) = run(&router, "/root", RequestInit::new()).await;
    assert_eq!(outcome.unwrap(), json!("root done"));
    assert_eq!(log.len(), 3);
    assert_eq!(sink.texts(), vec!["fast", "slow"]);
}

#[tokio::test]
async fn test_stream_closes_after_root_error() {
    let mut builder = RouterBuilder::new();
    builder
        .agent("/broken", |ctx: Context, _next: Next| async move {
            ctx.response().write_text("partial")?;
            Err(RouterError::handler("boom"))
        })
        .unwrap();
    let router = builder.build();

    let text = router
        .handle("/broken", RequestInit::new())
        .collect_text()
        .await;
    assert_eq!(text, "partial");

    let (outcome, sink) = run(&router, "/broken", RequestInit::new()).await;
    assert_eq!(outcome.unwrap_err().to_string(), "boom");
    // Root errors are logged, never streamed.
    assert_eq!(sink.chunks(), vec![Chunk::text("partial")]);
}

#[tokio::test]
async fn test_stream_closes_when_nothing_matches() {
    let router = RouterBuilder::new().build();
    let chunks = router
        .handle("/missing", RequestInit::new())
        .collect_chunks()
        .await;
    assert!(chunks.is_empty());
}

#[tokio::test]
async fn test_spawned_branch_result_is_joinable() {
    let mut builder = RouterBuilder::new();
    builder
        .agent("/answer", |_ctx: Context, _next: Next| async move { Ok(json!(42)) })
        .unwrap()
        .agent("/root", |ctx: Context, _next: Next| async move {
            let branch = ctx.next().spawn_agent("@/answer", Params::new());
            branch.await.map_err(RouterError::handler)?
        })
        .unwrap();
    let router = builder.build();

    let (outcome, _) = run(&router, "/root", RequestInit::new()).await;
    assert_eq!(outcome.unwrap(), json!(42));
}

#[tokio::test]
async fn test_spawned_tool_validates_and_joins() {
    let mut builder = RouterBuilder::new();
    builder
        .tool(
            "/search",
            common::query_tool_options(),
            |ctx: Context, input: Value| async move {
                ctx.response().write_text("searched")?;
                Ok(json!({ "q": input["q"], "depth": ctx.call_depth() }))
            },
        )
        .unwrap()
        .agent("/root", |ctx: Context, _next: Next| async move {
            let valid = ctx
                .next()
                .spawn_tool("@/search", common::params(json!({ "q": "rust" })));
            let invalid = ctx
                .next()
                .spawn_tool("@/search", common::params(json!({ "q": 1 })));
            let rejected = matches!(
                invalid.await.map_err(RouterError::handler)?,
                Err(RouterError::ToolValidation { .. })
            );
            let output = valid.await.map_err(RouterError::handler)??;
            Ok(json!({ "output": output, "rejected": rejected }))
        })
        .unwrap();
    let router = builder.build();

    let (outcome, sink) = run(&router, "/root", RequestInit::new()).await;
    assert_eq!(
        outcome.unwrap(),
        json!({ "output": { "q": "rust", "depth": 0 }, "rejected": true })
    );
    assert_eq!(sink.texts(), vec!["searched"]);
}

#[tokio::test]
async fn test_writer_chunks_reach_stream_in_order() {
    let mut builder = RouterBuilder::new();
    builder
        .id_generator(switchyard::testing::SequentialIds::new("id"))
        .agent("/report", |ctx: Context, _next: Next| async move {
            let response = ctx.response();
            response.write_message_metadata(json!({ "model": "test" }))?;
            response.write_text("Looking that up.")?;
            let call_id = response
                .write_object_as_tool("lookup", json!({ "hits": 3 }), json!({ "q": "rust" }))
                .map_err(RouterError::handler)?;
            Ok(json!(call_id))
        })
        .unwrap();
    let router = builder.build();

    let (outcome, sink) = run(&router, "/report", RequestInit::new()).await;
    // id-1 is the request id.
    assert_eq!(outcome.unwrap(), json!("lookup-id-2"));

    let chunks = sink.chunks();
    assert_eq!(
        chunks,
        vec![
            Chunk::MessageMetadata {
                message_metadata: json!({ "model": "test" }),
            },
            Chunk::text("Looking that up."),
            Chunk::ToolInputStart {
                tool_call_id: "lookup-id-2".into(),
                tool_name: "lookup".into(),
            },
            Chunk::ToolInputAvailable {
                tool_call_id: "lookup-id-2".into(),
                tool_name: "lookup".into(),
                input: json!({ "q": "rust" }),
            },
            Chunk::ToolOutputAvailable {
                tool_call_id: "lookup-id-2".into(),
                output: json!({ "hits": 3 }),
            },
        ]
    );
}
