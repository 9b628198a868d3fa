//! Callbacks from the conversation engine to the view layer.

use crate::{Message, MessageId, MessageStatus};

/// Receives conversation changes so a view can render them.
///
/// Callbacks run synchronously on the thread that mutated the conversation,
/// after the change has been persisted. Implementations must not call back
/// into the [`Conversation`](crate::Conversation) from a callback.
pub trait ConversationObserver: Send + Sync {
    /// A message was added to the end of the log.
    fn on_message_appended(&self, _message: &Message) {}

    /// The status indicator of one message changed.
    fn on_status_updated(&self, _id: &MessageId, _status: MessageStatus) {}

    /// The assistant started or stopped typing.
    fn on_typing_changed(&self, _typing: bool) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ConversationObserver for NoopObserver {}
