//! The view boundary: full-state rendering of a message list.

use confab_types::{Message, Role};

/// Consumer of session state changes.
///
/// Implementations must be able to produce a complete visual state from the
/// full ordered message list alone, and must be idempotent: rendering an
/// unchanged list again yields an identical visual state with no duplicated
/// elements. User and assistant messages must be distinguishable, and
/// attached images must appear in conversation order.
pub trait Renderer {
    /// Rebuild the visual state from the full message list.
    fn render(&mut self, messages: &[Message]);
}

/// Reference renderer producing a plain-text transcript.
///
/// Rebuilds the whole transcript from scratch on every call, which makes
/// idempotence structural rather than something to maintain.
#[derive(Debug, Default)]
pub struct TranscriptRenderer {
    transcript: String,
}

impl TranscriptRenderer {
    /// Create an empty renderer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The transcript produced by the last render.
    #[must_use]
    pub fn transcript(&self) -> &str {
        &self.transcript
    }
}

impl Renderer for TranscriptRenderer {
    fn render(&mut self, messages: &[Message]) {
        self.transcript.clear();
        for message in messages {
            let label = match message.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            self.transcript.push_str(label);
            self.transcript.push_str(": ");
            self.transcript.push_str(&message.content);
            if let Some(images) = &message.images {
                for _ in images {
                    self.transcript.push_str(" [image]");
                }
            }
            self.transcript.push('\n');
        }
    }
}
