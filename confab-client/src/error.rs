//! Internal helpers for mapping HTTP/reqwest failures to [`TransportError`].

use confab_types::TransportError;

/// Map a [`reqwest::Error`] to a [`TransportError`].
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(Box::new(err))
    }
}

/// Map a non-success HTTP status to a [`TransportError`].
pub(crate) fn http_error(status: reqwest::StatusCode, body: String) -> TransportError {
    TransportError::Http {
        status: status.as_u16(),
        body,
    }
}
