//! # Router
//!
//! Composition root: [`RouterBuilder`] collects layers at startup and
//! [`RouterBuilder::build`] freezes them into a cheap-to-clone [`Router`].
//!
//! ```rust
//! use serde_json::json;
//! use switchyard::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut greeting = RouterBuilder::new();
//! greeting.agent("/formal", |ctx: Context, _next: Next| async move {
//!     ctx.response().write_text("Good day.")?;
//!     Ok(json!("formal"))
//! })?;
//!
//! let mut builder = RouterBuilder::new();
//! builder
//!     .middleware("*", |ctx: Context, next: Next| async move {
//!         ctx.set_state("seen", json!(true));
//!         next.run().await
//!     })?
//!     .mount("/greeting", greeting)?;
//!
//! let router = builder.build();
//! let text = router.handle("/greeting/formal", RequestInit::new()).collect_text().await;
//! assert_eq!(text, "Good day.");
//! # Ok(())
//! # }
//! ```

use crate::{
    barrier::Barrier,
    context::{Context, RequestInit},
    dispatcher,
    handler::{DynHandler, Handler, Next, ToolFactory, ToolHandler},
    registry::{Layer, LayerKind, Registry, ToolMeta},
    tools::{FactoryTool, StaticTool, ToolOptions},
};
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::{future::Future, sync::Arc};
use switchyard_core::{
    CallResult, IdGenerator, IntoPattern, PathPattern, RegistrationError, ResponseSink,
    RouterError, Tool,
};
use switchyard_std::{
    ids::UuidGenerator,
    stream::{self, ResponseStream},
};

/// Default limit for nested agent calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 10;

/// Router configuration.
///
/// Deserializable so hosts can load it from their own config files; missing
/// fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Maximum nesting of agent calls. A branch at this depth cannot call
    /// another agent.
    pub max_call_depth: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl RouterConfig {
    /// Set the depth limit.
    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }
}

/// Frozen router state shared by every request and context.
pub(crate) struct RouterCore {
    pub(crate) registry: Registry,
    pub(crate) agent_tools: Vec<(PathPattern, Tool)>,
    pub(crate) config: RouterConfig,
    pub(crate) ids: Arc<dyn IdGenerator>,
}

/// Future returned by [`Router::handle_with_sink`].
///
/// Resolves with the root branch's outcome once every branch of the request
/// has finished.
pub type Completion = BoxFuture<'static, CallResult>;

// ============================================================================
// Builder
// ============================================================================

/// Collects layers and configuration.
pub struct RouterBuilder {
    registry: Registry,
    agent_tools: Vec<(PathPattern, Tool)>,
    config: RouterConfig,
    ids: Arc<dyn IdGenerator>,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterBuilder {
    /// Create an empty builder with the default configuration.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            agent_tools: Vec::new(),
            config: RouterConfig::default(),
            ids: Arc::new(UuidGenerator),
        }
    }

    /// Register middleware: runs for the pattern and, on external calls,
    /// everything below it.
    pub fn middleware<P, F, Fut>(&mut self, pattern: P, handler: F) -> Result<&mut Self, RegistrationError>
    where
        P: IntoPattern,
        F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallResult> + Send + 'static,
    {
        self.middleware_handler(pattern, handler)
    }

    /// Register a [`Handler`] value as middleware.
    pub fn middleware_handler<P, H>(&mut self, pattern: P, handler: H) -> Result<&mut Self, RegistrationError>
    where
        P: IntoPattern,
        H: Handler,
    {
        self.push(pattern.into_pattern()?, LayerKind::Middleware, Arc::new(handler), None)
    }

    /// Register an agent: a terminal handler addressed by exact path.
    pub fn agent<P, F, Fut>(&mut self, pattern: P, handler: F) -> Result<&mut Self, RegistrationError>
    where
        P: IntoPattern,
        F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallResult> + Send + 'static,
    {
        self.agent_handler(pattern, handler)
    }

    /// Register a [`Handler`] value as an agent.
    pub fn agent_handler<P, H>(&mut self, pattern: P, handler: H) -> Result<&mut Self, RegistrationError>
    where
        P: IntoPattern,
        H: Handler,
    {
        self.push(pattern.into_pattern()?, LayerKind::Agent, Arc::new(handler), None)
    }

    /// Register a tool. The handler receives the input as validated (and
    /// possibly transformed) by the schema in `options`.
    pub fn tool<P, F, Fut>(
        &mut self,
        pattern: P,
        options: ToolOptions,
        handler: F,
    ) -> Result<&mut Self, RegistrationError>
    where
        P: IntoPattern,
        F: Fn(Context, serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallResult> + Send + 'static,
    {
        self.tool_handler(pattern, options, handler)
    }

    /// Register a [`ToolHandler`] value as a tool.
    pub fn tool_handler<P, H>(
        &mut self,
        pattern: P,
        options: ToolOptions,
        handler: H,
    ) -> Result<&mut Self, RegistrationError>
    where
        P: IntoPattern,
        H: ToolHandler,
    {
        let pattern = pattern.into_pattern()?;
        let layer_handler = StaticTool {
            pattern: pattern.to_string(),
            schema: options.schema.clone(),
            handler,
        };
        let meta = ToolMeta::Static {
            schema: options.schema,
            description: options.description,
        };
        self.push(pattern, LayerKind::Tool, Arc::new(layer_handler), Some(meta))
    }

    /// Register a tool whose [`Tool`] object is built per call from the
    /// calling context.
    pub fn tool_factory<P, F>(&mut self, pattern: P, factory: F) -> Result<&mut Self, RegistrationError>
    where
        P: IntoPattern,
        F: ToolFactory,
    {
        let pattern = pattern.into_pattern()?;
        let factory: Arc<dyn ToolFactory> = Arc::new(factory);
        let layer_handler = FactoryTool {
            pattern: pattern.to_string(),
            factory: factory.clone(),
        };
        self.push(
            pattern,
            LayerKind::Tool,
            Arc::new(layer_handler),
            Some(ToolMeta::Factory(factory)),
        )
    }

    /// Declare the description and schema an agent has when exposed through
    /// `agent_as_tool`.
    pub fn declare_agent_tool<P>(&mut self, pattern: P, definition: Tool) -> Result<&mut Self, RegistrationError>
    where
        P: IntoPattern,
    {
        let pattern = pattern.into_pattern()?;
        tracing::debug!(pattern = %pattern, "declared agent tool");
        self.agent_tools.push((pattern, definition));
        Ok(self)
    }

    /// Mount every layer and agent-tool declaration of `sub` under `prefix`.
    ///
    /// Wildcard middleware of `sub` becomes prefix middleware of the mount
    /// point. Regex patterns are prefixed with the escaped mount path. The
    /// configuration of `sub` is discarded.
    pub fn mount(&mut self, prefix: &str, sub: RouterBuilder) -> Result<&mut Self, RegistrationError> {
        let count = sub.registry.len();
        for layer in sub.registry.iter() {
            self.registry.register(layer.with_prefix(prefix)?)?;
        }
        for (pattern, definition) in sub.agent_tools {
            self.agent_tools
                .push((pattern.with_prefix(prefix)?, definition));
        }
        tracing::debug!(prefix, layers = count, "router mounted");
        Ok(self)
    }

    /// Set the depth limit for nested agent calls.
    pub fn max_call_depth(&mut self, max_call_depth: usize) -> &mut Self {
        self.config.max_call_depth = max_call_depth;
        self
    }

    /// Replace the configuration.
    pub fn config(&mut self, config: RouterConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Use `ids` for request ids and generated tool call ids.
    pub fn id_generator<G: IdGenerator>(&mut self, ids: G) -> &mut Self {
        self.ids = Arc::new(ids);
        self
    }

    /// Number of registered layers.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Returns `true` if no layer is registered.
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Freeze the builder.
    pub fn build(self) -> Router {
        Router {
            core: Arc::new(RouterCore {
                registry: self.registry,
                agent_tools: self.agent_tools,
                config: self.config,
                ids: self.ids,
            }),
        }
    }

    fn push(
        &mut self,
        pattern: PathPattern,
        kind: LayerKind,
        handler: Arc<dyn DynHandler>,
        tool: Option<ToolMeta>,
    ) -> Result<&mut Self, RegistrationError> {
        tracing::debug!(pattern = %pattern, %kind, "layer registered");
        let layer = Layer::new(pattern, kind, handler);
        let layer = match tool {
            Some(meta) => layer.with_tool(meta),
            None => layer,
        };
        self.registry.register(layer)?;
        Ok(self)
    }
}

impl std::fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("layers", &self.registry.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Router
// ============================================================================

/// A frozen, shareable router.
#[derive(Clone)]
pub struct Router {
    core: Arc<RouterCore>,
}

impl Router {
    /// Start composing a router.
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// The active configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.core.config
    }

    /// Registered layers, in registration order.
    pub fn layers(&self) -> impl Iterator<Item = &Arc<Layer>> {
        self.core.registry.iter()
    }

    /// Handle an external request.
    ///
    /// The root branch starts immediately on the Tokio runtime; the returned
    /// stream yields chunks as branches write them and ends once every branch
    /// of the request, awaited or not, has finished. Errors of the root branch
    /// are logged and do not prevent the stream from closing.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn handle(&self, path: &str, init: RequestInit) -> ResponseStream {
        let (sink, stream) = stream::channel();
        let completion = self.handle_with_sink(path, init, Arc::new(sink.clone()));
        tokio::spawn(async move {
            // Root errors were already logged in the branch.
            let _ = completion.await;
            sink.finish();
        });
        stream
    }

    /// Handle an external request, writing into a caller-owned sink.
    ///
    /// The root branch is spawned before this returns. The returned future
    /// resolves with the root outcome once the completion barrier reaches
    /// zero; dropping it does not cancel the request.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn handle_with_sink(&self, path: &str, init: RequestInit, sink: Arc<dyn ResponseSink>) -> Completion {
        let barrier = Barrier::new();
        let ctx = Context::root(self.core.clone(), path, init, sink, barrier.clone());
        ctx.logger().info("handling request");

        let guard = barrier.enter();
        let root = tokio::spawn(async move {
            let _guard = guard;
            let result = dispatcher::execute(ctx.clone(), false).await;
            if let Err(err) = &result {
                ctx.logger()
                    .error(format_args!("unhandled error in main execution chain: {err}"));
            }
            result
        });

        async move {
            let outcome = match root.await {
                Ok(result) => result,
                Err(join_err) => Err(RouterError::handler(join_err)),
            };
            barrier.wait().await;
            outcome
        }
        .boxed()
    }

    pub(crate) fn core(&self) -> &Arc<RouterCore> {
        &self.core
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("layers", &self.core.registry.len())
            .field("config", &self.core.config)
            .finish_non_exhaustive()
    }
}
