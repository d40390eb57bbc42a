//! Error types for switchyard.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`RouterError`] - Failures of a dispatch, returned by every call into the graph
//! - [`RegistrationError`] - Failures while composing a router
//! - [`PatternError`] - Malformed path patterns
//! - [`SchemaError`] - Input rejected by a [`Schema`](crate::Schema)
//! - [`SinkError`] - Writes to a closed response sink

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while dispatching a request through the layer graph.
///
/// Handler-originated failures are carried in [`RouterError::Handler`]; every
/// other variant is raised by the router itself.
#[derive(Error, Debug)]
pub enum RouterError {
    /// No layer matched the resolved path at dispatch time.
    #[error("agent not found for path: {path}")]
    AgentNotFound {
        /// The normalized path that was dispatched.
        path: String,
    },

    /// `attach_tool` resolved no registered tool.
    #[error("tool not found at path: {path}")]
    ToolNotFound {
        /// The resolved tool path.
        path: String,
    },

    /// A tool's input failed schema validation.
    #[error("tool call validation failed for path: {path}: {detail}")]
    ToolValidation {
        /// The tool pattern that rejected the input.
        path: String,
        /// Validator error detail.
        detail: String,
    },

    /// A nested agent call would exceed the configured depth limit.
    #[error("agent call depth limit ({max_depth}) exceeded")]
    MaxCallDepthExceeded {
        /// The configured limit.
        max_depth: usize,
    },

    /// `agent_as_tool` found neither an explicit nor a declared definition.
    #[error(
        "no tool definition found for agent \"{path}\"; declare one with `declare_agent_tool` or pass it explicitly"
    )]
    AgentDefinitionMissing {
        /// The resolved agent path.
        path: String,
    },

    /// A tool object produced by a factory cannot be executed.
    #[error("tool at path {path} has no execute function")]
    MissingToolExecute {
        /// The tool pattern.
        path: String,
    },

    /// An error raised by a handler.
    #[error(transparent)]
    Handler(BoxError),
}

impl RouterError {
    /// Wrap an arbitrary handler error.
    pub fn handler<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        RouterError::Handler(err.into())
    }

    /// Returns `true` if this error was raised by the router rather than a handler.
    pub fn is_routing(&self) -> bool {
        !matches!(self, RouterError::Handler(_))
    }
}

impl From<BoxError> for RouterError {
    fn from(err: BoxError) -> Self {
        // A RouterError that travelled through a tool's `execute` comes back boxed.
        match err.downcast::<RouterError>() {
            Ok(inner) => *inner,
            Err(other) => RouterError::Handler(other),
        }
    }
}

impl From<serde_json::Error> for RouterError {
    fn from(err: serde_json::Error) -> Self {
        RouterError::Handler(Box::new(err))
    }
}

impl From<SinkError> for RouterError {
    fn from(err: SinkError) -> Self {
        RouterError::Handler(Box::new(err))
    }
}

/// Errors that can occur while composing a router.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// A tool is already registered for this pattern.
    #[error("a tool is already registered for path: {0}")]
    DuplicateTool(String),

    /// The pattern could not be parsed.
    #[error(transparent)]
    InvalidPattern(#[from] PatternError),
}

/// Errors raised while parsing a path pattern.
#[derive(Error, Debug)]
pub enum PatternError {
    /// A `:` segment without a name, e.g. `/users/:`.
    #[error("empty parameter name in pattern: {0}")]
    EmptyParamName(String),

    /// The same parameter name appears twice.
    #[error("duplicate parameter `{name}` in pattern: {pattern}")]
    DuplicateParam {
        /// The offending pattern.
        pattern: String,
        /// The repeated name.
        name: String,
    },

    /// The generated or supplied regular expression is invalid.
    #[error("invalid regex in pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// Input rejected by a schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SchemaError {
    message: String,
}

impl SchemaError {
    /// Create a new schema error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors returned by a [`ResponseSink`](crate::ResponseSink).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    /// The stream has already been finalized.
    #[error("response stream is closed")]
    Closed,
}
