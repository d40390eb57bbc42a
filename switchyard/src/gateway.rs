//! # Call Gateway
//!
//! [`NextHandler`] is how a handler reaches the rest of the graph: nested
//! agent and tool calls, fire-and-forget branches, and tool objects for LLM
//! integrations.
//!
//! Targets are resolved against the calling branch's path: `formal` from
//! `/greeting` is `/greeting/formal`, `../formal` from `/greeting/decide` is
//! `/greeting/formal`, and `@/search` is `/search` from anywhere.
//!
//! Nested calls are internal: only exact matches run, so a middleware on
//! `/greeting` does not run again for a nested call to `/greeting/formal`.
//!
//! Every call registers with the request's completion barrier, so the
//! response stream stays open until the last branch has finished.

use crate::{
    context::{CallKind, Context},
    dispatcher,
    registry::ToolMeta,
};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use switchyard_core::{
    BoxError, CallResult, MatchMode, Params, RouterError, Tool, ToolCallOptions, normalize_path,
    resolve_path,
};
use tokio::task::JoinHandle;

/// Nested-call gateway of one branch.
#[derive(Debug, Clone)]
pub struct NextHandler {
    ctx: Context,
}

impl NextHandler {
    pub(crate) fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// The configured depth limit for nested agent calls.
    pub fn max_call_depth(&self) -> usize {
        self.ctx.max_call_depth()
    }

    /// Call an agent and wait for its result.
    ///
    /// Fails with [`RouterError::MaxCallDepthExceeded`], without dispatching
    /// anything, when this branch is already at the depth limit.
    pub async fn call_agent(&self, path: &str, params: Params) -> CallResult {
        call(self.ctx.clone(), CallKind::Agent, path.to_owned(), params).await
    }

    /// Call a tool and wait for its result. Tool calls do not add depth.
    pub async fn call_tool(&self, path: &str, params: Params) -> CallResult {
        call(self.ctx.clone(), CallKind::Tool, path.to_owned(), params).await
    }

    /// Start an agent call without waiting for it.
    ///
    /// The branch is registered with the completion barrier before this
    /// returns, so the response stream cannot finish ahead of it. Must be
    /// called from within a Tokio runtime.
    pub fn spawn_agent(&self, path: &str, params: Params) -> JoinHandle<CallResult> {
        self.spawn(CallKind::Agent, path, params)
    }

    /// Start a tool call without waiting for it. See [`spawn_agent`](Self::spawn_agent).
    pub fn spawn_tool(&self, path: &str, params: Params) -> JoinHandle<CallResult> {
        self.spawn(CallKind::Tool, path, params)
    }

    fn spawn(&self, kind: CallKind, path: &str, params: Params) -> JoinHandle<CallResult> {
        let guard = self.ctx.barrier().enter();
        let branch = call(self.ctx.clone(), kind, path.to_owned(), params);
        tokio::spawn(async move {
            let _guard = guard;
            branch.await
        })
    }

    /// Resolve a registered tool into a [`Tool`] object.
    ///
    /// Factory tools are built from this branch's context. Static tools
    /// advertise their registered schema and description and execute through
    /// [`call_tool`](Self::call_tool), so the schema is enforced either way.
    pub fn attach_tool(&self, path: &str) -> Result<Tool, RouterError> {
        let resolved = resolve_path(self.ctx.path(), path);
        self.ctx
            .logger()
            .debug(format_args!("attaching tool {resolved}"));

        let Some(found) = self.ctx.core().registry.find_tool(&resolved) else {
            self.ctx
                .logger()
                .error(format_args!("tool not found at resolved path: {resolved}"));
            return Err(RouterError::ToolNotFound { path: resolved });
        };

        match found.layer.tool() {
            Some(ToolMeta::Factory(factory)) => {
                let tool = factory.build(&self.ctx);
                Ok(match tool.name() {
                    Some(_) => tool,
                    None => tool.with_name(resolved),
                })
            }
            Some(ToolMeta::Static {
                schema,
                description,
            }) => Ok(Tool::new()
                .with_name(resolved)
                .with_optional_description(description.clone())
                .with_shared_schema(schema.clone())
                .with_execute(delegate(self.ctx.clone(), CallKind::Tool, path.to_owned()))),
            None => Err(RouterError::ToolNotFound { path: resolved }),
        }
    }

    /// Expose an agent as a [`Tool`] object.
    ///
    /// Uses `definition` if given, otherwise a definition declared with
    /// `declare_agent_tool`. Declarations are looked up by the literal path
    /// first when it is absolute, then by the resolved path. The tool
    /// executes through [`call_agent`](Self::call_agent).
    pub fn agent_as_tool(&self, path: &str, definition: Option<Tool>) -> Result<Tool, RouterError> {
        let resolved = resolve_path(self.ctx.path(), path);

        let definition = definition.or_else(|| {
            let mut candidates = Vec::with_capacity(2);
            if path.starts_with('/') {
                candidates.push(normalize_path(path));
            }
            candidates.push(resolved.clone());
            candidates
                .iter()
                .find_map(|candidate| self.declared_agent_tool(candidate))
        });

        let Some(definition) = definition else {
            self.ctx.logger().error(format_args!(
                "no tool definition found for agent at resolved path: {resolved}"
            ));
            return Err(RouterError::AgentDefinitionMissing { path: resolved });
        };

        let tool = match definition.name() {
            Some(_) => definition,
            None => definition.with_name(resolved),
        };
        Ok(tool.with_execute(delegate(
            self.ctx.clone(),
            CallKind::Agent,
            path.to_owned(),
        )))
    }

    fn declared_agent_tool(&self, path: &str) -> Option<Tool> {
        self.ctx
            .core()
            .agent_tools
            .iter()
            .find(|(pattern, _)| {
                let mode = if pattern.is_regex() {
                    MatchMode::Prefix
                } else {
                    MatchMode::Exact
                };
                pattern.matches(path, mode).is_some()
            })
            .map(|(_, tool)| tool.clone())
    }
}

/// An execute function that re-enters the graph from the branch of `ctx`.
fn delegate(
    ctx: Context,
    kind: CallKind,
    path: String,
) -> impl Fn(Value, ToolCallOptions) -> BoxFuture<'static, Result<Value, BoxError>> + Send + Sync + 'static
{
    move |input: Value, _options: ToolCallOptions| {
        let ctx = ctx.clone();
        let path = path.clone();
        async move {
            let params = into_params(input, &path)?;
            call(ctx, kind, path, params).await.map_err(BoxError::from)
        }
        .boxed()
    }
}

fn into_params(input: Value, path: &str) -> Result<Params, RouterError> {
    match input {
        Value::Object(params) => Ok(params),
        Value::Null => Ok(Params::new()),
        other => Err(RouterError::ToolValidation {
            path: path.to_owned(),
            detail: format!("expected a JSON object, got {other}"),
        }),
    }
}

/// Resolve, build the sub-context and dispatch one nested call.
///
/// The branch enters the barrier on its first poll and leaves it when the
/// future completes or is dropped.
fn call(ctx: Context, kind: CallKind, path: String, params: Params) -> BoxFuture<'static, CallResult> {
    async move {
        let _guard = ctx.barrier().enter();

        if kind == CallKind::Agent {
            let max_depth = ctx.max_call_depth();
            if ctx.call_depth() >= max_depth {
                let err = RouterError::MaxCallDepthExceeded { max_depth };
                ctx.logger()
                    .error(format_args!("[call_agent] aborting: {err}"));
                return Err(err);
            }
        }

        let resolved = resolve_path(ctx.path(), &path);
        ctx.logger()
            .debug(format_args!("calling {kind:?} at {resolved}"));

        let sub = ctx.sub_context(kind, resolved, params);
        let result = dispatcher::execute(sub, true).await;
        if let Err(err) = &result {
            ctx.logger().error(format_args!("[{kind:?} call] {err}"));
        }
        result
    }
    .boxed()
}
