//! Timeout middleware for time-limited chains.

use crate::{
    context::Context,
    handler::{Handler, Next},
};
use std::time::Duration;
use switchyard_core::{CallResult, RouterError};
use thiserror::Error;
use tokio::time::timeout;

/// Error returned when the rest of a chain does not finish in time.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("chain execution timed out after {0:?}")]
pub struct TimeoutError(pub Duration);

/// A middleware that bounds how long the rest of the chain may run.
///
/// The chain future is dropped on timeout. Branches it spawned keep running
/// and still hold the response stream open.
#[derive(Debug, Clone, Copy)]
pub struct Timeout {
    duration: Duration,
}

impl Timeout {
    /// Create a new timeout middleware.
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Handler for Timeout {
    async fn call(&self, ctx: Context, next: Next) -> CallResult {
        match timeout(self.duration, next.run()).await {
            Ok(result) => result,
            Err(_) => {
                ctx.logger()
                    .warn(format_args!("chain timed out after {:?}", self.duration));
                Err(RouterError::handler(TimeoutError(self.duration)))
            }
        }
    }
}
