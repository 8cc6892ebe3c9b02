#![deny(missing_docs)]
//! Conversation session management for the confab chat client.
//!
//! [`ChatSession`] drives one conversation turn at a time through a small
//! state machine, applying decoded stream events to the in-progress
//! assistant message and re-rendering after every mutation. The view is a
//! boundary ([`Renderer`]), as is the client-local last-used-model state
//! ([`PreferenceStore`]).

pub mod prefs;
pub mod render;
pub mod session;

pub use prefs::{FilePreferences, MemoryPreferences, PreferenceStore};
pub use render::{Renderer, TranscriptRenderer};
pub use session::{ChatSession, TurnPhase};
