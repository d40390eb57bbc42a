//! # Channel-Backed Response Stream
//!
//! [`channel`] creates the pair a router writes into and a host reads from:
//!
//! - [`ChannelSink`] implements [`ResponseSink`] and is shared by every branch
//!   of a request.
//! - [`ResponseStream`] implements [`futures::Stream`] and yields chunks in
//!   write order until the sink is finished.
//!
//! Writes after [`ChannelSink::finish`] fail with [`SinkError::Closed`].

use futures::Stream;
use std::{
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    task::{Context, Poll},
};
use switchyard_core::{Chunk, ResponseSink, SinkError};
use tokio::sync::mpsc;

enum Frame {
    Chunk(Chunk),
    Finish,
}

/// Create a connected sink/stream pair.
pub fn channel() -> (ChannelSink, ResponseStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sink = ChannelSink {
        tx,
        closed: Arc::new(AtomicBool::new(false)),
    };
    let stream = ResponseStream { rx, done: false };
    (sink, stream)
}

/// Writing half of a response channel.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Frame>,
    closed: Arc<AtomicBool>,
}

impl ChannelSink {
    /// Finalize the stream. Idempotent.
    pub fn finish(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            // The reader may already be gone; nothing to do then.
            let _ = self.tx.send(Frame::Finish);
        }
    }
}

impl ResponseSink for ChannelSink {
    fn write(&self, chunk: Chunk) -> Result<(), SinkError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SinkError::Closed);
        }
        self.tx
            .send(Frame::Chunk(chunk))
            .map_err(|_| SinkError::Closed)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.tx.is_closed()
    }
}

impl std::fmt::Debug for ChannelSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelSink")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Reading half of a response channel.
pub struct ResponseStream {
    rx: mpsc::UnboundedReceiver<Frame>,
    done: bool,
}

impl ResponseStream {
    /// Drain the stream into a vector.
    pub async fn collect_chunks(self) -> Vec<Chunk> {
        futures::StreamExt::collect(self).await
    }

    /// Drain the stream and concatenate every text chunk.
    pub async fn collect_text(self) -> String {
        self.collect_chunks()
            .await
            .iter()
            .filter_map(Chunk::as_text)
            .collect()
    }
}

impl Stream for ResponseStream {
    type Item = Chunk;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(Frame::Chunk(chunk))) => Poll::Ready(Some(chunk)),
            Poll::Ready(Some(Frame::Finish)) | Poll::Ready(None) => {
                self.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl std::fmt::Debug for ResponseStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseStream")
            .field("done", &self.done)
            .finish()
    }
}
