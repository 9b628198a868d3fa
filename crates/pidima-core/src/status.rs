//! Author and delivery status enums.

use serde::{Deserialize, Serialize};

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    /// The person typing into the widget.
    #[serde(alias = "me")]
    User,
    /// The simulated assistant.
    #[serde(alias = "bot")]
    Assistant,
}

/// Delivery status of an outgoing message.
///
/// Variants are declared in lifecycle order so the derived `Ord` matches
/// sent < delivered < read.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Accepted into the log.
    #[default]
    Sent,
    /// Reached the assistant.
    Delivered,
    /// Seen by the assistant.
    Read,
}

impl MessageStatus {
    /// Default status for a freshly created message by `author`.
    ///
    /// Assistant messages have no further transitions, so they start as read.
    pub fn initial_for(author: Author) -> Self {
        match author {
            Author::User => Self::Sent,
            Author::Assistant => Self::Read,
        }
    }

    /// Returns true if moving to `next` is a strict step forward.
    pub fn can_advance_to(&self, next: MessageStatus) -> bool {
        next > *self
    }

    /// Lowercase name as stored on disk.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ordering() {
        assert!(MessageStatus::Sent < MessageStatus::Delivered);
        assert!(MessageStatus::Delivered < MessageStatus::Read);
    }

    #[test]
    fn test_can_advance_only_forward() {
        assert!(MessageStatus::Sent.can_advance_to(MessageStatus::Delivered));
        assert!(MessageStatus::Sent.can_advance_to(MessageStatus::Read));
        assert!(!MessageStatus::Read.can_advance_to(MessageStatus::Delivered));
        assert!(!MessageStatus::Delivered.can_advance_to(MessageStatus::Delivered));
    }

    #[test]
    fn test_initial_status() {
        assert_eq!(MessageStatus::initial_for(Author::User), MessageStatus::Sent);
        assert_eq!(
            MessageStatus::initial_for(Author::Assistant),
            MessageStatus::Read
        );
    }

    #[test]
    fn test_legacy_author_names() {
        let me: Author = serde_json::from_str("\"me\"").unwrap();
        let bot: Author = serde_json::from_str("\"bot\"").unwrap();
        assert_eq!(me, Author::User);
        assert_eq!(bot, Author::Assistant);
        assert_eq!(serde_json::to_string(&Author::User).unwrap(), "\"user\"");
    }
}
