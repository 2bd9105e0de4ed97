//! UI-agnostic conversation state
//!
//! The conversation is an ordered, append-only log. Only the last message may
//! change after it has been appended, which is how streamed replies grow.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier assigned to every message when it is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Empty assistant message that stream chunks are appended to
    pub fn assistant_placeholder() -> Self {
        Self {
            id: MessageId::new(),
            role: ChatRole::Assistant,
            content: String::new(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

/// Where a submission came from. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionSource {
    Typed,
    Example,
    Voice,
}

impl SubmissionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionSource::Typed => "typed",
            SubmissionSource::Example => "example",
            SubmissionSource::Voice => "voice",
        }
    }
}

/// Ordered message log owned by a single chat session
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Apply `mutator` to the content of the last message.
    ///
    /// Returns `false` when the conversation is empty.
    pub fn update_last<F>(&mut self, mutator: F) -> bool
    where
        F: FnOnce(&mut String),
    {
        match self.messages.last_mut() {
            Some(last) => {
                mutator(&mut last.content);
                true
            }
            None => false,
        }
    }

    /// Overwrite the content of the last message
    pub fn replace_last(&mut self, text: &str) -> bool {
        self.update_last(|content| {
            content.clear();
            content.push_str(text);
        })
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn get(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Most recent assistant message, used by the speak shortcut
    pub fn last_assistant(&self) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::Assistant)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
