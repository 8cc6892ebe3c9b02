//! Core conversation and envelope types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A human user.
    User,
    /// The model's reply.
    Assistant,
}

/// A single message in a conversation.
///
/// Messages are immutable once a turn settles; the one exception is the
/// in-progress assistant message that a [`crate::stream::TurnStream`] fills
/// chunk by chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message author.
    pub role: Role,
    /// Message text content.
    pub content: String,
    /// Attached images as base64 blobs, in conversation order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    /// Generation statistics, present on completed assistant messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<GenerationMetrics>,
}

impl Message {
    /// Create a user message with plain text content.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            images: None,
            metrics: None,
        }
    }

    /// Create a user message with attached images.
    #[must_use]
    pub fn user_with_images(content: impl Into<String>, images: Vec<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            images: if images.is_empty() { None } else { Some(images) },
            metrics: None,
        }
    }

    /// Create an assistant message.
    ///
    /// An empty content string is the placeholder a session appends when a
    /// stream opens.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            images: None,
            metrics: None,
        }
    }
}

/// Generation performance statistics from a completed turn.
///
/// Durations are in nanoseconds, as the backend reports them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetrics {
    /// Total time spent on the turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u64>,
    /// Time spent loading the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_duration: Option<u64>,
    /// Number of tokens in the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Time spent evaluating the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_duration: Option<u64>,
    /// Number of tokens generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
    /// Time spent generating the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_duration: Option<u64>,
}

impl GenerationMetrics {
    /// Generation speed in tokens per second, when both counts are known.
    #[must_use]
    pub fn tokens_per_second(&self) -> Option<f64> {
        let count = self.eval_count?;
        let duration = self.eval_duration?;
        if duration == 0 {
            return None;
        }
        Some(count as f64 / (duration as f64 / 1_000_000_000.0))
    }
}

/// One conversation: ordered messages plus identity metadata.
///
/// The persisted copy is owned by the backend; a session holds a cached,
/// possibly-stale view that is authoritative for the current page lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Backend-assigned identifier. `None` until the conversation is created
    /// server-side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human-readable title.
    pub title: String,
    /// Model that produced the assistant messages.
    #[serde(default)]
    pub model_used: String,
    /// Ordered message history.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Creation timestamp.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new, not-yet-persisted conversation.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            model_used: String::new(),
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// An installed model as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model name (e.g. "llama3.2:1b").
    pub name: String,
    /// On-disk size in bytes, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// The authenticated user, as reported by the auth check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Login name.
    pub username: String,
    /// Whether the user has admin rights.
    #[serde(default)]
    pub is_admin: bool,
}

/// Result of an auth check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether a session is currently authenticated.
    pub authenticated: bool,
    /// The authenticated user, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

/// Result of a backend health probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Whether the backend can reach its model server.
    pub connected: bool,
    /// Optional human-readable detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The persistence payload for a settled assistant turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Conversation the turn belongs to.
    pub conversation_id: String,
    /// Final assistant content.
    pub content: String,
    /// Generation statistics, when the stream reported them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<GenerationMetrics>,
    /// Model that generated the content.
    pub model: String,
}
