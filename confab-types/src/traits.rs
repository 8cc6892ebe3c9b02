//! The transport seam between a session and the HTTP client.

use std::future::Future;

use crate::error::TransportError;
use crate::stream::TurnStream;
use crate::types::{Message, TurnRecord};

/// Transport for chat turns and their persistence.
///
/// Uses RPITIT (return-position `impl Trait` in traits) and is intentionally
/// NOT object-safe — sessions compose over `<T: ChatTransport>` generics.
/// The HTTP client implements this against the real backend; tests implement
/// it with scripted streams.
pub trait ChatTransport: Send + Sync {
    /// Send one conversation turn and get back the decoded response stream.
    ///
    /// `history` is the full ordered message list, ending with the user's
    /// new message. Fails before producing any event when the connection
    /// cannot be made or the response status is not success.
    fn send_turn(
        &self,
        model: &str,
        history: &[Message],
        conversation_id: Option<&str>,
    ) -> impl Future<Output = Result<TurnStream, TransportError>> + Send;

    /// Persist a settled assistant turn. Best-effort: callers log failures
    /// and move on.
    fn save_turn(
        &self,
        record: &TurnRecord,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
