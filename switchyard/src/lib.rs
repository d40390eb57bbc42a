//! # switchyard - Hierarchical Agent/Tool Router
//!
//! `switchyard` routes requests to independently registered handlers
//! ("agents" and "tools") that can also call one another through a
//! depth-limited call graph, while every branch of one request streams output
//! to a single consumer.
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use switchyard::prelude::*;
//! use switchyard::schema::JsonSchema;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut builder = RouterBuilder::new();
//! builder
//!     .tool(
//!         "/weather/:city",
//!         ToolOptions::new(JsonSchema::new(json!({
//!             "type": "object",
//!             "properties": { "city": { "type": "string" } },
//!             "required": ["city"]
//!         }))?)
//!         .with_description("Current weather for a city."),
//!         |_ctx: Context, input| async move { Ok(json!({ "city": input["city"], "sky": "clear" })) },
//!     )?
//!     .agent("/assistant", |ctx: Context, _next: Next| async move {
//!         let report = ctx.next().call_tool("@/weather/paris", Params::new()).await?;
//!         ctx.response().write_text(format!("The sky is {}.", report["sky"].as_str().unwrap_or("?")))?;
//!         Ok(report)
//!     })?;
//!
//! let router = builder.build();
//! let text = router.handle("/assistant", RequestInit::new()).collect_text().await;
//! assert_eq!(text, "The sky is clear.");
//! # Ok(())
//! # }
//! ```
//!
//! ## Layers
//!
//! - **Middleware** runs for its path and, on external calls, every path below it.
//! - **Agents** are terminal handlers addressed by exact path.
//! - **Tools** are terminal handlers whose input is validated by a [`Schema`].
//!
//! Matched layers run from the most general to the most specific; see
//! [`registry`] for the matching and ranking rules.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod barrier;
mod context;
mod dispatcher;
mod gateway;
mod handler;
mod logger;
mod router;
mod tools;

pub mod middleware;
pub mod registry;
pub mod testing;

pub use barrier::{Barrier, BarrierGuard};
pub use context::{CallKind, Context, RequestInit, State};
pub use gateway::NextHandler;
pub use handler::{DynHandler, Handler, Next, ToolFactory, ToolHandler};
pub use logger::Logger;
pub use router::{Completion, DEFAULT_MAX_CALL_DEPTH, Router, RouterBuilder, RouterConfig};
pub use tools::ToolOptions;

pub use switchyard_core::{
    BoxError, CallResult, Chunk, DynSchema, IdGenerator, IntoPattern, MatchMode, Params,
    PathPattern, PatternError, ROOT_ESCAPE, RegistrationError, ResponseSink, RouterError, Schema,
    SchemaError, SinkError, Tool, ToolCallOptions, WILDCARD, extract_params, normalize_path,
    parse_pattern, resolve_path,
};

/// Schema adapters.
pub mod schema {
    #![allow(clippy::wildcard_imports)]
    pub use switchyard_std::schema::*;
}

/// Channel-backed response streams.
pub mod stream {
    #![allow(clippy::wildcard_imports)]
    pub use switchyard_std::stream::*;
}

/// Stream writer helpers.
pub mod writer {
    #![allow(clippy::wildcard_imports)]
    pub use switchyard_std::writer::*;
}

/// Conversation message helpers.
pub mod messages {
    #![allow(clippy::wildcard_imports)]
    pub use switchyard_std::messages::*;
}

/// Identifier generators.
pub mod ids {
    #![allow(clippy::wildcard_imports)]
    pub use switchyard_std::ids::*;
}

/// Prelude module - common imports for switchyard.
///
/// # Usage
///
/// ```rust
/// use switchyard::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        CallResult, Context, Handler, Next, NextHandler, Params, RequestInit, Router,
        RouterBuilder, RouterConfig, RouterError, Schema, Tool, ToolCallOptions, ToolOptions,
    };
}
