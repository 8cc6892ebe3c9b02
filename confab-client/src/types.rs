//! Wire envelopes for the backend's JSON API.
//!
//! Non-streaming endpoints answer with a `{success, message, data?}`
//! envelope; `success: false` is surfaced to callers as
//! [`confab_types::TransportError::Rejected`].

use confab_types::{Conversation, Message, ModelInfo, Role};
use serde::{Deserialize, Serialize};

/// `POST /api/chat-turn` request body.
#[derive(Debug, Serialize)]
pub(crate) struct ChatTurnRequest {
    /// Model to generate with.
    pub model: String,
    /// Full ordered message history, ending with the user's new message.
    pub messages: Vec<WireMessage>,
    /// Conversation the turn belongs to, when one exists server-side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// A message in the chat-turn wire format.
///
/// Local metadata (generation metrics) stays client-side; only role,
/// content, and images go over the wire.
#[derive(Debug, Serialize)]
pub(crate) struct WireMessage {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
            images: message.images.clone(),
        }
    }
}

/// Generic `{success, message}` response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// `GET /api/models` response.
#[derive(Debug, Deserialize)]
pub(crate) struct ModelsEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub models: Vec<ModelInfo>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `GET /api/conversations` response.
#[derive(Debug, Deserialize)]
pub(crate) struct ConversationsEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub conversations: Vec<Conversation>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Single-conversation response (create / fetch).
#[derive(Debug, Deserialize)]
pub(crate) struct ConversationEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub conversation: Option<Conversation>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /api/conversations` request body.
#[derive(Debug, Serialize)]
pub(crate) struct CreateConversationRequest {
    pub title: String,
    pub model: String,
}

/// Request body naming a model (pull / delete).
#[derive(Debug, Serialize)]
pub(crate) struct ModelActionRequest {
    pub model: String,
}
