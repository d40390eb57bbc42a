//! Output seam: the caller-visible response sink.

use crate::{chunk::Chunk, error::SinkError};
use std::sync::Arc;

/// Append-only output channel shared by every branch of one request.
///
/// Every branch of the call tree writes to the same sink; chunks are never
/// rewritten once written.
pub trait ResponseSink: Send + Sync + 'static {
    /// Write one chunk.
    fn write(&self, chunk: Chunk) -> Result<(), SinkError>;

    /// Returns `true` once the stream has been finalized.
    fn is_closed(&self) -> bool {
        false
    }
}

impl<S: ResponseSink + ?Sized> ResponseSink for Arc<S> {
    fn write(&self, chunk: Chunk) -> Result<(), SinkError> {
        (**self).write(chunk)
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ResponseSink for NullSink {
    fn write(&self, _chunk: Chunk) -> Result<(), SinkError> {
        Ok(())
    }
}
