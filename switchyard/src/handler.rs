//! # Handlers
//!
//! Every layer (middleware, agent or tool) runs a [`Handler`]: an async
//! function of the branch [`Context`] and a [`Next`] continuation.
//!
//! - Middleware usually does some work and returns `next.run().await`.
//! - A terminal handler returns its own value and never runs `next`, which
//!   short-circuits the rest of the chain.
//!
//! The value returned by the first layer of a chain is the result of the
//! dispatch, so a tool's output travels back through its middleware to the
//! caller.
//!
//! # Static vs Dynamic Dispatch
//!
//! [`Handler`] uses a native `async fn` signature for static dispatch. The
//! registry stores handlers as [`DynHandler`] trait objects; every `Handler`
//! is a `DynHandler` through a blanket implementation.

use crate::{context::Context, registry::Layer};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::{future::Future, pin::Pin, sync::Arc};
use switchyard_core::{CallResult, Tool};

/// An async layer handler.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a switchyard `Handler`",
    label = "missing `Handler` implementation",
    note = "Handlers are `async fn(Context, Next) -> CallResult`; closures of that shape implement it automatically."
)]
pub trait Handler: Send + Sync + 'static {
    /// Run this layer.
    fn call(&self, ctx: Context, next: Next) -> impl Future<Output = CallResult> + Send;
}

/// Dynamic object-safe version of [`Handler`].
pub trait DynHandler: Send + Sync + 'static {
    /// Run this layer (dynamic dispatch version).
    fn call_dyn<'a>(
        &'a self,
        ctx: Context,
        next: Next,
    ) -> Pin<Box<dyn Future<Output = CallResult> + Send + 'a>>;
}

// Blanket implementation: Any type implementing Handler implements DynHandler automatically.
impl<T: Handler> DynHandler for T {
    fn call_dyn<'a>(
        &'a self,
        ctx: Context,
        next: Next,
    ) -> Pin<Box<dyn Future<Output = CallResult> + Send + 'a>> {
        Box::pin(self.call(ctx, next))
    }
}

impl<F, Fut> Handler for F
where
    F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CallResult> + Send + 'static,
{
    fn call(&self, ctx: Context, next: Next) -> impl Future<Output = CallResult> + Send {
        (self)(ctx, next)
    }
}

// ============================================================================
// Tool Handlers
// ============================================================================

/// Handler of a statically registered tool: receives the validated input.
pub trait ToolHandler: Send + Sync + 'static {
    /// Run the tool.
    fn call(&self, ctx: Context, input: Value) -> impl Future<Output = CallResult> + Send;
}

impl<F, Fut> ToolHandler for F
where
    F: Fn(Context, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CallResult> + Send + 'static,
{
    fn call(&self, ctx: Context, input: Value) -> impl Future<Output = CallResult> + Send {
        (self)(ctx, input)
    }
}

/// Builds a [`Tool`] from the calling context.
pub trait ToolFactory: Send + Sync + 'static {
    /// Build the tool.
    fn build(&self, ctx: &Context) -> Tool;
}

impl<F> ToolFactory for F
where
    F: Fn(&Context) -> Tool + Send + Sync + 'static,
{
    fn build(&self, ctx: &Context) -> Tool {
        (self)(ctx)
    }
}

// ============================================================================
// Continuation
// ============================================================================

/// Continuation handed to every layer: runs the rest of the chain.
pub struct Next {
    chain: Arc<[Arc<Layer>]>,
    index: usize,
    ctx: Context,
}

impl Next {
    pub(crate) fn new(chain: Arc<[Arc<Layer>]>, index: usize, ctx: Context) -> Self {
        Self { chain, index, ctx }
    }

    /// Run the next layer. At the end of the chain this yields `null`.
    pub fn run(self) -> BoxFuture<'static, CallResult> {
        dispatch_layer(self.chain, self.index, self.ctx)
    }

    /// Returns `true` if no layer follows.
    pub fn is_end(&self) -> bool {
        self.index >= self.chain.len()
    }

    /// Number of layers still to run.
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.index)
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.index)
            .field("len", &self.chain.len())
            .finish()
    }
}

/// Run `chain[index]`, handing it a continuation for `index + 1`.
pub(crate) fn dispatch_layer(
    chain: Arc<[Arc<Layer>]>,
    index: usize,
    ctx: Context,
) -> BoxFuture<'static, CallResult> {
    async move {
        let Some(layer) = chain.get(index).cloned() else {
            return Ok(Value::Null);
        };

        let logger = ctx.logger().clone();
        logger.debug(format_args!("-> running {} {}", layer.kind(), layer.pattern()));

        let next = Next::new(chain, index + 1, ctx.clone());
        let result = layer.handler().call_dyn(ctx, next).await;

        match &result {
            Ok(_) => logger.debug(format_args!("<- finished {} {}", layer.kind(), layer.pattern())),
            Err(err) => logger.error(format_args!(
                "error in {} layer {}: {err}",
                layer.kind(),
                layer.pattern()
            )),
        }
        result
    }
    .boxed()
}
