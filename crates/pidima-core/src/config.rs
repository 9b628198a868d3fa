//! Conversation configuration.

use std::time::Duration;

use crate::ChatError;

/// Storage key holding the serialized message log.
pub const HISTORY_KEY: &str = "pidima-chat-history";

/// Storage key holding the theme preference.
pub const THEME_KEY: &str = "pidima-theme";

/// Assistant message seeded into an empty log.
pub const WELCOME_MESSAGE: &str = "Hi! I'm the Pidima Assistant. Ask me about your docs or say hello 👋";

/// Timing of a simulated reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTiming {
    /// Fixed part of the reply delay.
    pub base_delay: Duration,

    /// Typing time added per reply character.
    pub per_char_delay: Duration,

    /// Lower bound on the typing part of the delay.
    pub min_typing: Duration,

    /// Upper bound on the typing part of the delay.
    pub max_typing: Duration,

    /// Offset at which the user message becomes delivered.
    pub delivered_after: Duration,

    /// Offset at which the user message becomes read.
    pub read_after: Duration,
}

impl Default for ReplyTiming {
    fn default() -> Self {
        Self::from_base_delay(Duration::from_millis(600))
    }
}

impl ReplyTiming {
    /// Derive the status offsets from a base delay the way the widget always has.
    pub fn from_base_delay(base_delay: Duration) -> Self {
        Self {
            base_delay,
            per_char_delay: Duration::from_millis(6),
            min_typing: Duration::from_millis(400),
            max_typing: Duration::from_millis(1400),
            delivered_after: base_delay.min(Duration::from_millis(900)),
            read_after: (base_delay + Duration::from_millis(300)).min(Duration::from_millis(1400)),
        }
    }

    /// Total time from send to reply for a reply of `reply_chars` characters.
    pub fn reply_delay(&self, reply_chars: usize) -> Duration {
        let chars = u32::try_from(reply_chars).unwrap_or(u32::MAX);
        let typing = self
            .per_char_delay
            .saturating_mul(chars)
            .max(self.min_typing)
            .min(self.max_typing);
        self.base_delay + typing
    }

    /// Check that every transition lands strictly before the next one.
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.min_typing > self.max_typing {
            return Err(ChatError::InvalidConfig(format!(
                "min_typing ({:?}) exceeds max_typing ({:?})",
                self.min_typing, self.max_typing
            )));
        }
        if self.delivered_after.is_zero() {
            return Err(ChatError::InvalidConfig(
                "delivered_after must be greater than zero".to_string(),
            ));
        }
        if self.delivered_after >= self.read_after {
            return Err(ChatError::InvalidConfig(format!(
                "delivered_after ({:?}) must be before read_after ({:?})",
                self.delivered_after, self.read_after
            )));
        }
        let earliest_reply = self.base_delay + self.min_typing;
        if self.read_after >= earliest_reply {
            return Err(ChatError::InvalidConfig(format!(
                "read_after ({:?}) must be before the earliest reply ({:?})",
                self.read_after, earliest_reply
            )));
        }
        Ok(())
    }
}

/// Conversation configuration.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Storage key for the message log.
    pub history_key: String,

    /// Storage key for the theme preference.
    pub theme_key: String,

    /// Text of the assistant message seeded into an empty log.
    pub welcome_message: String,

    /// Reply timing.
    pub timing: ReplyTiming,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_key: HISTORY_KEY.to_string(),
            theme_key: THEME_KEY.to_string(),
            welcome_message: WELCOME_MESSAGE.to_string(),
            timing: ReplyTiming::default(),
        }
    }
}
