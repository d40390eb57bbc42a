//! Logging middleware - Observability for requests.

use crate::{
    context::Context,
    handler::{Handler, Next},
};
use std::time::Instant;
use switchyard_core::CallResult;

/// A middleware that logs each request it sees and its outcome.
///
/// # Example
///
/// ```rust
/// use switchyard::{RouterBuilder, middleware::Logging};
///
/// let mut builder = RouterBuilder::new();
/// builder.middleware_handler("*", Logging::named("api")).unwrap();
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Logging {
    name: &'static str,
}

impl Logging {
    /// Create a new `Logging` middleware with a default name.
    pub fn new() -> Self {
        Self { name: "request" }
    }

    /// Create a new `Logging` middleware with a custom name.
    pub fn named(name: &'static str) -> Self {
        Self { name }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for Logging {
    async fn call(&self, ctx: Context, next: Next) -> CallResult {
        let started = Instant::now();
        ctx.logger().info(format_args!(
            "{}: started (depth {}, {} messages)",
            self.name,
            ctx.call_depth(),
            ctx.messages().len()
        ));

        let result = next.run().await;

        let elapsed = started.elapsed();
        match &result {
            Ok(_) => ctx
                .logger()
                .info(format_args!("{}: completed in {elapsed:?}", self.name)),
            Err(err) => ctx
                .logger()
                .warn(format_args!("{}: failed after {elapsed:?}: {err}", self.name)),
        }
        result
    }
}
