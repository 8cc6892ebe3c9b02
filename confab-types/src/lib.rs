#![deny(missing_docs)]
//! Shared types for the confab chat client.
//!
//! This crate is the lingua franca between the HTTP transport
//! (`confab-client`) and the conversation session (`confab-session`):
//! the conversation data model, the decoded stream event union, the error
//! taxonomy, and the [`ChatTransport`] trait seam.

pub mod error;
pub mod stream;
pub mod traits;
pub mod types;

pub use error::{PreferenceError, SendError, TransportError};
pub use stream::{TurnEvent, TurnStream};
pub use traits::ChatTransport;
pub use types::{
    AuthStatus, Conversation, GenerationMetrics, HealthStatus, Message, ModelInfo, Role,
    TurnRecord, UserInfo,
};
