#![deny(missing_docs)]
//! HTTP transport for the confab chat backend.
//!
//! [`ChatApi`] implements [`confab_types::ChatTransport`] for the streaming
//! chat-turn protocol (newline-delimited JSON over HTTP) and exposes the
//! backend's management RPCs: model inventory/pull/delete, health, auth
//! check/logout, conversation CRUD, and turn persistence.

mod client;
mod error;
mod streaming;
mod types;

pub use client::ChatApi;
