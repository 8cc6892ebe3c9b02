//! Error taxonomy for the chat client.

use thiserror::Error;

/// Errors from the HTTP transport.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection-level failure before any response arrived.
    #[error("network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// Response status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// The response body could not be parsed.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The backend answered `success: false` with a reason.
    #[error("{0}")]
    Rejected(String),

    /// The response stream broke mid-turn.
    #[error("stream interrupted: {0}")]
    Stream(String),
}

impl TransportError {
    /// Whether retrying this request might succeed.
    ///
    /// Nothing in this client retries automatically; retries are always
    /// caller-initiated.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Network(_) | TransportError::Timeout | TransportError::Stream(_) => {
                true
            }
            TransportError::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

/// Synchronous rejections of a send request. None of these issue a network
/// request or change session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    /// The message text is blank and no image is attached.
    #[error("message is empty")]
    EmptyTurn,

    /// No model has been selected.
    #[error("no model selected")]
    NoModelSelected,

    /// A previous turn has not yet settled.
    #[error("a turn is already in flight")]
    TurnInFlight,
}

/// Errors from the model-preference store.
#[derive(Debug, Error)]
pub enum PreferenceError {
    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
