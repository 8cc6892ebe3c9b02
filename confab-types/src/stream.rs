//! Decoded turn events and the cancellable stream handle.

use std::pin::Pin;

use futures::Stream;
use futures::stream::AbortHandle;

use crate::types::GenerationMetrics;

/// An event decoded from one line of a chat-turn response stream.
///
/// Events arrive in strict line order. Malformed lines never produce an
/// event — the decoder discards them.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// A partial piece of assistant text, to be appended to the in-progress
    /// message.
    Chunk(String),
    /// A metrics-only update. Merged into the in-progress message
    /// last-write-wins, without touching its content.
    Metrics(GenerationMetrics),
    /// The terminal record. Its content is authoritative and supersedes the
    /// concatenation of previous chunks.
    Final {
        /// Full assistant content for the turn.
        content: String,
        /// Final generation statistics.
        metrics: Option<GenerationMetrics>,
        /// Model that generated the turn.
        model: Option<String>,
    },
    /// The transport failed mid-stream. Always the last event.
    Error(String),
}

/// Handle to an in-flight turn response.
///
/// The event sequence is lazy and not replayable: once a stream ends it
/// cannot be restarted, a fresh send creates a fresh stream. [`cancel`] ends
/// the stream early and drops the underlying HTTP body.
///
/// [`cancel`]: TurnStream::cancel
pub struct TurnStream {
    /// The decoded events. Consume with `StreamExt::next()`.
    pub events: Pin<Box<dyn Stream<Item = TurnEvent> + Send>>,
    abort: AbortHandle,
}

impl TurnStream {
    /// Wrap an event stream in a handle with an abort control.
    #[must_use]
    pub fn new(events: impl Stream<Item = TurnEvent> + Send + 'static) -> Self {
        let (events, abort) = futures::stream::abortable(events);
        Self {
            events: Box::pin(events),
            abort,
        }
    }

    /// Stop the stream. Pending and future events are dropped; the event
    /// stream simply ends.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    /// A clonable handle for cancelling the stream from elsewhere.
    #[must_use]
    pub fn cancel_handle(&self) -> AbortHandle {
        self.abort.clone()
    }
}

impl std::fmt::Debug for TurnStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnStream")
            .field("cancelled", &self.abort.is_aborted())
            .finish_non_exhaustive()
    }
}
