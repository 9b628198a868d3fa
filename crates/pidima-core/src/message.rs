//! Chat message types for the conversation log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Author, MessageId, MessageStatus};

/// A message in the conversation log.
///
/// `id`, `author`, `text` and `created_at` never change after creation;
/// only `status` moves, and only forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,

    /// Who wrote the message.
    pub author: Author,

    /// Original, unescaped content.
    pub text: String,

    /// When the message was created.
    #[serde(alias = "time")]
    pub created_at: DateTime<Utc>,

    /// Delivery status. Only meaningful for user messages.
    pub status: MessageStatus,
}

impl Message {
    /// Materialize a partial message, assigning id, timestamp and default status.
    pub fn create(partial: NewMessage) -> Self {
        let status = partial
            .status
            .unwrap_or_else(|| MessageStatus::initial_for(partial.author));
        Self {
            id: MessageId::generate(),
            author: partial.author,
            text: partial.text,
            created_at: Utc::now(),
            status,
        }
    }

    /// Returns true if the message was written by the user.
    pub fn is_from_user(&self) -> bool {
        self.author == Author::User
    }
}

/// The caller-supplied part of a message; the store fills in the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub author: Author,
    pub text: String,
    pub status: Option<MessageStatus>,
}

impl NewMessage {
    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            author: Author::User,
            text: text.into(),
            status: None,
        }
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            author: Author::Assistant,
            text: text.into(),
            status: None,
        }
    }

    /// Builder method to set an explicit status.
    pub fn with_status(mut self, status: MessageStatus) -> Self {
        self.status = Some(status);
        self
    }
}
