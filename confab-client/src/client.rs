//! Chat backend API client struct and builder.

use std::time::Duration;

use confab_types::{
    AuthStatus, ChatTransport, Conversation, HealthStatus, Message, ModelInfo, TransportError,
    TurnRecord, TurnStream,
};

use crate::error::{http_error, map_reqwest_error};
use crate::streaming::stream_turn;
use crate::types::{
    ChatTurnRequest, ConversationEnvelope, ConversationsEnvelope, CreateConversationRequest,
    Envelope, ModelActionRequest, ModelsEnvelope, WireMessage,
};

/// Default backend base URL.
const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Environment variable consulted by [`ChatApi::from_env`].
const BASE_URL_ENV: &str = "CONFAB_BASE_URL";

/// Default timeout for the non-streaming management RPCs. Chat-turn
/// streaming requests are not bounded by it.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the chat backend's JSON API.
///
/// Implements [`ChatTransport`] for the streaming chat-turn protocol and
/// exposes the management RPCs (models, health, auth, conversations,
/// persistence) as plain request/response calls.
///
/// # Example
///
/// ```no_run
/// use confab_client::ChatApi;
///
/// let api = ChatApi::new().base_url("http://localhost:5000");
/// ```
pub struct ChatApi {
    /// Backend base URL (override for tests or remote deployments).
    pub(crate) base_url: String,
    /// Timeout applied to management RPCs.
    pub(crate) timeout: Duration,
    /// Shared HTTP client.
    pub(crate) http: reqwest::Client,
}

impl ChatApi {
    /// Create a new client with sensible defaults.
    ///
    /// Default base URL: `http://localhost:5000`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: DEFAULT_TIMEOUT,
            http: reqwest::Client::new(),
        }
    }

    /// Create a client configured from the environment.
    ///
    /// Reads `CONFAB_BASE_URL`; falls back to the default base URL when the
    /// variable is unset or empty.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.is_empty() => Self::new().base_url(url),
            _ => Self::new(),
        }
    }

    /// Override the backend base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Override the timeout applied to the non-streaming RPCs.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a URL under the `/api` prefix.
    pub(crate) fn api_url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    /// Fetch the installed model list.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, TransportError> {
        let url = self.api_url("models");
        tracing::debug!(url = %url, "fetching model list");
        let response = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let envelope: ModelsEnvelope = parse_body(response).await?;
        if !envelope.success {
            return Err(TransportError::Rejected(
                envelope.message.unwrap_or_default(),
            ));
        }
        Ok(envelope.models)
    }

    /// Ask the backend to download a model. Returns the backend's
    /// confirmation message.
    ///
    /// Downloads can take a long time; this call is not bounded by the
    /// client timeout.
    pub async fn pull_model(&self, name: &str) -> Result<String, TransportError> {
        let url = self.api_url("models/pull");
        tracing::debug!(url = %url, model = %name, "pulling model");
        let response = self
            .http
            .post(&url)
            .json(&ModelActionRequest { model: name.into() })
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let envelope: Envelope = parse_body(response).await?;
        if !envelope.success {
            return Err(TransportError::Rejected(
                envelope.message.unwrap_or_default(),
            ));
        }
        Ok(envelope.message.unwrap_or_default())
    }

    /// Ask the backend to delete an installed model.
    pub async fn delete_model(&self, name: &str) -> Result<(), TransportError> {
        let url = self.api_url("models/delete");
        tracing::debug!(url = %url, model = %name, "deleting model");
        let response = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(&ModelActionRequest { model: name.into() })
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let envelope: Envelope = parse_body(response).await?;
        if !envelope.success {
            return Err(TransportError::Rejected(
                envelope.message.unwrap_or_default(),
            ));
        }
        Ok(())
    }

    /// Probe whether the backend can reach its model server.
    pub async fn health(&self) -> Result<HealthStatus, TransportError> {
        let url = self.api_url("health");
        tracing::debug!(url = %url, "checking backend health");
        let response = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        parse_body(response).await
    }

    /// Check whether the current HTTP session is authenticated.
    pub async fn check_auth(&self) -> Result<AuthStatus, TransportError> {
        let url = self.api_url("auth/check");
        tracing::debug!(url = %url, "checking auth state");
        let response = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        parse_body(response).await
    }

    /// End the current authenticated session.
    pub async fn logout(&self) -> Result<(), TransportError> {
        let url = self.api_url("auth/logout");
        tracing::debug!(url = %url, "logging out");
        let response = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let envelope: Envelope = parse_body(response).await?;
        if !envelope.success {
            return Err(TransportError::Rejected(
                envelope.message.unwrap_or_default(),
            ));
        }
        Ok(())
    }

    /// List stored conversations.
    pub async fn list_conversations(&self) -> Result<Vec<Conversation>, TransportError> {
        let url = self.api_url("conversations");
        tracing::debug!(url = %url, "listing conversations");
        let response = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let envelope: ConversationsEnvelope = parse_body(response).await?;
        if !envelope.success {
            return Err(TransportError::Rejected(
                envelope.message.unwrap_or_default(),
            ));
        }
        Ok(envelope.conversations)
    }

    /// Create a conversation server-side and return the stored copy
    /// (including its assigned id).
    pub async fn create_conversation(
        &self,
        title: &str,
        model: &str,
    ) -> Result<Conversation, TransportError> {
        let url = self.api_url("conversations");
        tracing::debug!(url = %url, title, "creating conversation");
        let response = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(&CreateConversationRequest {
                title: title.into(),
                model: model.into(),
            })
            .send()
            .await
            .map_err(map_reqwest_error)?;
        unwrap_conversation(parse_body(response).await?)
    }

    /// Fetch one stored conversation with its messages.
    pub async fn get_conversation(&self, id: &str) -> Result<Conversation, TransportError> {
        let url = self.api_url(&format!("conversations/{id}"));
        tracing::debug!(url = %url, "fetching conversation");
        let response = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        unwrap_conversation(parse_body(response).await?)
    }

    /// Delete a stored conversation.
    pub async fn delete_conversation(&self, id: &str) -> Result<(), TransportError> {
        let url = self.api_url(&format!("conversations/{id}"));
        tracing::debug!(url = %url, "deleting conversation");
        let response = self
            .http
            .delete(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let envelope: Envelope = parse_body(response).await?;
        if !envelope.success {
            return Err(TransportError::Rejected(
                envelope.message.unwrap_or_default(),
            ));
        }
        Ok(())
    }
}

impl Default for ChatApi {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatTransport for ChatApi {
    /// Send one conversation turn to `POST /api/chat-turn`.
    ///
    /// The response body is NDJSON; a non-success status fails the call
    /// before any event is produced. The streaming read is not bounded by
    /// the client timeout.
    async fn send_turn(
        &self,
        model: &str,
        history: &[Message],
        conversation_id: Option<&str>,
    ) -> Result<TurnStream, TransportError> {
        let url = self.api_url("chat-turn");
        let body = ChatTurnRequest {
            model: model.into(),
            messages: history.iter().map(WireMessage::from).collect(),
            conversation_id: conversation_id.map(str::to_string),
        };
        tracing::debug!(url = %url, model, turns = history.len(), "sending chat turn");

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.map_err(map_reqwest_error)?;
            return Err(http_error(status, body_text));
        }

        Ok(stream_turn(response))
    }

    /// Persist a settled assistant turn via `POST /api/save-message`.
    async fn save_turn(&self, record: &TurnRecord) -> Result<(), TransportError> {
        let url = self.api_url("save-message");
        tracing::debug!(url = %url, conversation = %record.conversation_id, "persisting assistant turn");
        let response = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(record)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let envelope: Envelope = parse_body(response).await?;
        if !envelope.success {
            return Err(TransportError::Rejected(
                envelope.message.unwrap_or_default(),
            ));
        }
        Ok(())
    }
}

/// Check the response status and deserialize its JSON body.
async fn parse_body<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, TransportError> {
    let status = response.status();
    let text = response.text().await.map_err(map_reqwest_error)?;
    if !status.is_success() {
        return Err(http_error(status, text));
    }
    serde_json::from_str(&text)
        .map_err(|e| TransportError::InvalidResponse(format!("invalid JSON response: {e}")))
}

fn unwrap_conversation(envelope: ConversationEnvelope) -> Result<Conversation, TransportError> {
    if !envelope.success {
        return Err(TransportError::Rejected(
            envelope.message.unwrap_or_default(),
        ));
    }
    envelope
        .conversation
        .ok_or_else(|| TransportError::InvalidResponse("missing conversation in response".into()))
}
