//! Testing utilities for switchyard.
//!
//! # Features
//!
//! - [`RecordingSink`]: A sink that keeps every chunk written to it
//! - [`EventLog`]: A shared, ordered log for asserting execution order
//! - [`SequentialIds`]: Deterministic identifiers

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use switchyard_core::{Chunk, IdGenerator, ResponseSink, SinkError};

// ============================================================================
// Recording Sink
// ============================================================================

/// A sink that records every chunk it receives.
///
/// Clones share the same buffer.
///
/// # Example
///
/// ```rust
/// use switchyard_core::{Chunk, ResponseSink};
/// use switchyard_std::testing::RecordingSink;
///
/// let sink = RecordingSink::new();
/// sink.write(Chunk::text("hello")).unwrap();
/// assert_eq!(sink.text(), "hello");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    chunks: Arc<Mutex<Vec<Chunk>>>,
    closed: Arc<AtomicBool>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a clone of the recorded chunks.
    pub fn chunks(&self) -> Vec<Chunk> {
        self.chunks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The text chunks, in order.
    pub fn texts(&self) -> Vec<String> {
        self.chunks()
            .into_iter()
            .filter_map(|chunk| chunk.as_text().map(str::to_owned))
            .collect()
    }

    /// All text chunks concatenated.
    pub fn text(&self) -> String {
        self.texts().concat()
    }

    /// Reject further writes.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl ResponseSink for RecordingSink {
    fn write(&self, chunk: Chunk) -> Result<(), SinkError> {
        if self.is_closed() {
            return Err(SinkError::Closed);
        }
        self.chunks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(chunk);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

// ============================================================================
// Event Log
// ============================================================================

/// A shared, ordered log of labels.
///
/// Handlers push a label when they run; tests assert on the order.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a label.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.into());
    }

    /// Get a clone of the entries.
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of entries recorded.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `entry` was recorded.
    pub fn contains(&self, entry: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|e| e == entry)
    }
}

// ============================================================================
// Sequential Ids
// ============================================================================

/// Deterministic identifiers: `<prefix>-1`, `<prefix>-2`, ...
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicUsize,
}

impl SequentialIds {
    /// Start a sequence with the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicUsize::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn generate_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{n}", self.prefix)
    }
}
