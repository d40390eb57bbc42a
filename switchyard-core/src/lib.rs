//! # switchyard-core
//!
//! Core types for the switchyard agent router.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! schema adapters, transports and test doubles that don't need the router
//! itself.
//!
//! # Contents
//!
//! - **Path patterns**: [`PathPattern`], [`parse_pattern`], [`extract_params`],
//!   [`normalize_path`], [`resolve_path`]
//! - **Output**: [`Chunk`] and the [`ResponseSink`] seam
//! - **Tools**: [`Tool`], [`ToolCallOptions`] and the [`Schema`] seam
//! - **Identifiers**: the [`IdGenerator`] seam
//!
//! # Error Types
//!
//! - [`RouterError`] - Dispatch failures (the typed taxonomy callers inspect)
//! - [`RegistrationError`] - Composition failures
//! - [`PatternError`], [`SchemaError`], [`SinkError`] - Collaborator failures

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod chunk;
mod error;
mod id;
mod pattern;
mod schema;
mod sink;
mod tool;

// Re-exports
pub use chunk::Chunk;
pub use error::{BoxError, PatternError, RegistrationError, RouterError, SchemaError, SinkError};
pub use id::IdGenerator;
pub use pattern::{
    IntoPattern, MatchMode, Params, ParsedPattern, PathPattern, ROOT_ESCAPE, WILDCARD,
    extract_params, join_paths, normalize_path, parse_pattern, resolve_path,
};
pub use schema::{DynSchema, Schema};
pub use sink::{NullSink, ResponseSink};
pub use tool::{Tool, ToolCallOptions, ToolExecuteFn, ToolFuture};

/// Result of a call into the layer graph: the terminal value or a typed failure.
pub type CallResult = Result<serde_json::Value, RouterError>;
