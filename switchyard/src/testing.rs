//! Testing utilities.
//!
//! Re-exports the doubles of `switchyard_std::testing` and adds
//! [`RecordingHandler`], a layer that records every branch it runs in.

use crate::{
    context::Context,
    handler::{Handler, Next},
};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use switchyard_core::{CallResult, Params};

pub use switchyard_std::testing::{EventLog, RecordingSink, SequentialIds};

/// What a [`RecordingHandler`] saw on one call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Request id of the branch.
    pub request_id: String,
    /// Branch path.
    pub path: String,
    /// Params at the time the layer ran.
    pub params: Params,
    /// Call depth of the branch.
    pub call_depth: usize,
}

/// A handler that records every call it receives.
///
/// By default it is terminal and returns `null`; [`passthrough`](Self::passthrough)
/// makes it run the rest of the chain instead.
///
/// # Example
///
/// ```rust
/// use switchyard::{RouterBuilder, testing::RecordingHandler};
///
/// let recorder = RecordingHandler::new();
/// let mut builder = RouterBuilder::new();
/// builder.agent_handler("/probe", recorder.clone()).unwrap();
/// assert_eq!(recorder.count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct RecordingHandler {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    output: Value,
    passthrough: bool,
}

impl RecordingHandler {
    /// A terminal recorder that returns `null`.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            output: Value::Null,
            passthrough: false,
        }
    }

    /// A recorder that runs the rest of the chain.
    pub fn passthrough() -> Self {
        Self {
            passthrough: true,
            ..Self::new()
        }
    }

    /// Return `output` instead of `null`.
    pub fn with_output(mut self, output: Value) -> Self {
        self.output = output;
        self
    }

    /// Get a clone of the recorded calls.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Get the number of recorded calls.
    pub fn count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for RecordingHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for RecordingHandler {
    async fn call(&self, ctx: Context, next: Next) -> CallResult {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                request_id: ctx.request_id().to_owned(),
                path: ctx.path().to_owned(),
                params: ctx.params(),
                call_depth: ctx.call_depth(),
            });

        if self.passthrough {
            next.run().await
        } else {
            Ok(self.output.clone())
        }
    }
}
