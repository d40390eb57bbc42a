//! Per-branch logger.
//!
//! Every branch gets a `branch` span carrying the request id, path and call
//! depth, and a human-readable prefix of the form `[request_id]  [path]`
//! (two spaces of indent per level of depth).

use std::fmt::Display;
use tracing::Span;

/// Logger bound to one branch of a request.
#[derive(Debug, Clone)]
pub struct Logger {
    prefix: String,
    span: Span,
}

impl Logger {
    /// Create a logger for the branch at `path`, `depth` levels deep.
    pub fn new(request_id: &str, path: &str, depth: usize) -> Self {
        let indent = "  ".repeat(depth);
        Self {
            prefix: format!("[{request_id}]{indent}[{path}]"),
            span: tracing::info_span!("branch", request_id = %request_id, path = %path, depth),
        }
    }

    /// The branch span. Dispatch futures are instrumented with it.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// The message prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Log at debug level.
    pub fn debug(&self, message: impl Display) {
        let _entered = self.span.enter();
        tracing::debug!("{} {}", self.prefix, message);
    }

    /// Log at info level.
    pub fn info(&self, message: impl Display) {
        let _entered = self.span.enter();
        tracing::info!("{} {}", self.prefix, message);
    }

    /// Log at warn level.
    pub fn warn(&self, message: impl Display) {
        let _entered = self.span.enter();
        tracing::warn!("{} {}", self.prefix, message);
    }

    /// Log at error level.
    pub fn error(&self, message: impl Display) {
        let _entered = self.span.enter();
        tracing::error!("{} {}", self.prefix, message);
    }
}
