//! The conversation session state machine.
//!
//! One session owns one visible conversation and drives it through discrete
//! turns: `Idle → Sending → Streaming → Settling → Idle`. All work is
//! cooperative and single-threaded — suspension points are exactly the
//! network awaits, and between them state mutation and rendering run to
//! completion.

use confab_types::{
    ChatTransport, Conversation, Message, PreferenceError, Role, SendError, TransportError,
    TurnEvent, TurnRecord,
};
use futures::StreamExt;

use crate::prefs::PreferenceStore;
use crate::render::Renderer;

/// Where a session is within one conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// No turn in flight; sends are accepted.
    Idle,
    /// The turn request has been dispatched; no stream yet.
    Sending,
    /// The placeholder assistant message is being filled from the stream.
    Streaming,
    /// The turn is complete; persistence is in flight.
    Settling,
}

/// A chat session over a transport, a renderer, and a preference store.
///
/// The renderer is re-invoked with the full message list after every
/// mutation; the in-progress assistant message is exclusive to the session
/// while a stream is active, and a new send is refused until the previous
/// turn returns to [`TurnPhase::Idle`].
pub struct ChatSession<T, R, P> {
    transport: T,
    renderer: R,
    prefs: P,
    conversation: Conversation,
    model: Option<String>,
    phase: TurnPhase,
}

impl<T, R, P> ChatSession<T, R, P>
where
    T: ChatTransport,
    R: Renderer,
    P: PreferenceStore,
{
    /// Create a session with an empty, not-yet-persisted conversation.
    #[must_use]
    pub fn new(transport: T, renderer: R, prefs: P) -> Self {
        Self {
            transport,
            renderer,
            prefs,
            conversation: Conversation::new("New conversation"),
            model: None,
            phase: TurnPhase::Idle,
        }
    }

    /// Adopt an existing conversation (e.g. one loaded from the backend).
    #[must_use]
    pub fn with_conversation(mut self, conversation: Conversation) -> Self {
        self.conversation = conversation;
        self.render();
        self
    }

    /// The currently selected model, if any.
    #[must_use]
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// The session's position within the current turn.
    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// The visible conversation.
    #[must_use]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// The visible ordered message history.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.conversation.messages
    }

    /// The renderer, for consumers that need to read the produced view.
    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Replace the visible conversation and re-render.
    pub fn set_conversation(&mut self, conversation: Conversation) {
        self.conversation = conversation;
        self.render();
    }

    /// Restore the last-used model from the preference store.
    ///
    /// Returns the restored name, or `None` when nothing was stored.
    pub async fn restore_model(&mut self) -> Result<Option<String>, PreferenceError> {
        let stored = self.prefs.load_model().await?;
        if let Some(name) = &stored {
            self.model = Some(name.clone());
        }
        Ok(stored)
    }

    /// Select a model and remember it.
    ///
    /// Switching models starts a fresh exchange: the visible history is
    /// cleared, matching the original client behavior.
    pub async fn select_model(&mut self, name: impl Into<String>) -> Result<(), PreferenceError> {
        let name = name.into();
        tracing::debug!(model = %name, "model selected");
        self.model = Some(name.clone());
        self.conversation.messages.clear();
        self.render();
        self.prefs.store_model(&name).await
    }

    /// Note that a model was deleted from the backend.
    ///
    /// When it is the selected model, the selection is cleared, the visible
    /// conversation is emptied, and the stored preference is removed.
    pub async fn model_deleted(&mut self, name: &str) -> Result<(), PreferenceError> {
        if self.model.as_deref() != Some(name) {
            return Ok(());
        }
        tracing::debug!(model = %name, "selected model was deleted");
        self.model = None;
        self.conversation.messages.clear();
        self.render();
        self.prefs.clear_model().await
    }

    /// Send one conversation turn and drive it to completion.
    ///
    /// Returns `Err` only for the synchronous rejections — empty input, no
    /// model selected, or a turn already in flight — none of which issue a
    /// network request or change state. Transport failures resolve to
    /// `Ok(())` with an assistant-role error message rendered into the
    /// conversation, mirroring how the visible chat view is the error
    /// surface. Nothing is retried automatically.
    ///
    /// Dropping the returned future mid-turn aborts the in-flight request;
    /// the session then refuses further sends until the phase is reset with
    /// [`abandon_turn`].
    ///
    /// [`abandon_turn`]: ChatSession::abandon_turn
    pub async fn send_turn(
        &mut self,
        text: &str,
        images: Vec<String>,
    ) -> Result<(), SendError> {
        if self.phase != TurnPhase::Idle {
            return Err(SendError::TurnInFlight);
        }
        let trimmed = text.trim();
        if trimmed.is_empty() && images.is_empty() {
            return Err(SendError::EmptyTurn);
        }
        let Some(model) = self.model.clone() else {
            return Err(SendError::NoModelSelected);
        };

        self.conversation
            .messages
            .push(Message::user_with_images(trimmed, images));
        self.render();

        self.phase = TurnPhase::Sending;
        tracing::debug!(model = %model, "dispatching chat turn");
        let mut stream = match self
            .transport
            .send_turn(
                &model,
                &self.conversation.messages,
                self.conversation.id.as_deref(),
            )
            .await
        {
            Ok(stream) => stream,
            Err(err) => {
                self.fail_turn(&err);
                return Ok(());
            }
        };

        // The placeholder gives the view a "responding" affordance before
        // the first chunk arrives.
        self.conversation.messages.push(Message::assistant(""));
        self.phase = TurnPhase::Streaming;
        self.render();

        let mut interrupted = None;
        while let Some(event) = stream.events.next().await {
            match event {
                TurnEvent::Chunk(chunk) => {
                    if let Some(current) = self.in_progress_mut() {
                        current.content.push_str(&chunk);
                    }
                    self.render();
                }
                TurnEvent::Metrics(metrics) => {
                    if let Some(current) = self.in_progress_mut() {
                        current.metrics = Some(metrics);
                    }
                }
                TurnEvent::Final {
                    content,
                    metrics,
                    model: model_used,
                } => {
                    if let Some(current) = self.in_progress_mut() {
                        current.content = content;
                        if metrics.is_some() {
                            current.metrics = metrics;
                        }
                    }
                    if let Some(model_used) = model_used {
                        self.conversation.model_used = model_used;
                    }
                    self.phase = TurnPhase::Settling;
                    self.render();
                }
                TurnEvent::Error(reason) => {
                    interrupted = Some(TransportError::Stream(reason));
                    break;
                }
            }
        }

        if let Some(err) = interrupted {
            self.fail_turn(&err);
            return Ok(());
        }

        // A stream may end without a terminal record; the accumulated chunk
        // text then settles as-is.
        self.phase = TurnPhase::Settling;
        self.settle(&model).await;
        self.phase = TurnPhase::Idle;
        Ok(())
    }

    /// Reset the turn phase after an abandoned send.
    ///
    /// Only needed when a `send_turn` future was dropped mid-turn; the
    /// half-finished assistant message stays visible as-is.
    pub fn abandon_turn(&mut self) {
        if self.phase != TurnPhase::Idle {
            tracing::debug!(phase = ?self.phase, "abandoning in-flight turn");
            self.phase = TurnPhase::Idle;
        }
    }

    /// The mutable in-progress assistant message, while one exists.
    fn in_progress_mut(&mut self) -> Option<&mut Message> {
        self.conversation
            .messages
            .last_mut()
            .filter(|m| m.role == Role::Assistant)
    }

    /// Surface a transport failure in the conversation view and return to
    /// idle. No persistence call is made for a failed turn.
    fn fail_turn(&mut self, err: &TransportError) {
        tracing::warn!(error = %err, "chat turn failed");
        let text = format!("Error: {err}");
        if self.phase == TurnPhase::Streaming {
            if let Some(placeholder) = self.in_progress_mut() {
                placeholder.content = text;
            }
        } else {
            self.conversation.messages.push(Message::assistant(text));
        }
        self.phase = TurnPhase::Idle;
        self.render();
    }

    /// Best-effort persistence of the settled turn. Failures are logged and
    /// never affect the visible conversation.
    async fn settle(&self, model: &str) {
        let Some(conversation_id) = self.conversation.id.clone() else {
            tracing::debug!("conversation has no id; skipping persistence");
            return;
        };
        let Some(turn) = self
            .conversation
            .messages
            .last()
            .filter(|m| m.role == Role::Assistant)
        else {
            return;
        };
        let record = TurnRecord {
            conversation_id,
            content: turn.content.clone(),
            metrics: turn.metrics.clone(),
            model: if self.conversation.model_used.is_empty() {
                model.to_string()
            } else {
                self.conversation.model_used.clone()
            },
        };
        if let Err(err) = self.transport.save_turn(&record).await {
            tracing::warn!(error = %err, "failed to persist assistant turn");
        }
    }

    fn render(&mut self) {
        self.renderer.render(&self.conversation.messages);
    }
}
