//! Conversation Controller - the entry point driven by the UI.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::store::lock_store;
use crate::{
    ChatConfig, ChatError, ConversationObserver, IntentClassifier, KeyValueStore, Message,
    MessageStore, NewMessage, ReplyScheduler, SharedStore, Theme, ThemePreference,
};

/// One conversation: message log, reply scheduler and theme preference.
pub struct Conversation {
    store: SharedStore,
    scheduler: ReplyScheduler,
    theme: ThemePreference,
    welcome_message: String,
}

impl Conversation {
    /// Create a conversation with the built-in intent rules.
    ///
    /// The persisted log is read on first access; call
    /// [`load_or_seed`](Self::load_or_seed) to also seed an empty one.
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        observer: Arc<dyn ConversationObserver>,
        config: ChatConfig,
    ) -> Result<Self, ChatError> {
        Self::with_classifier(storage, observer, config, IntentClassifier::new())
    }

    /// Create a conversation with a custom classifier.
    pub fn with_classifier(
        storage: Arc<dyn KeyValueStore>,
        observer: Arc<dyn ConversationObserver>,
        config: ChatConfig,
        classifier: IntentClassifier,
    ) -> Result<Self, ChatError> {
        config.timing.validate()?;

        let store =
            MessageStore::new(storage.clone(), observer.clone(), config.history_key).into_shared();
        let scheduler = ReplyScheduler::new(
            store.clone(),
            observer,
            Arc::new(classifier),
            config.timing,
        );

        Ok(Self {
            store,
            scheduler,
            theme: ThemePreference::new(storage, config.theme_key),
            welcome_message: config.welcome_message,
        })
    }

    /// Hydrate the log from storage, seeding the welcome message if empty.
    pub fn load_or_seed(&self) -> Vec<Message> {
        lock_store(&self.store).load_or_seed(&self.welcome_message)
    }

    /// Send a user message and arm the simulated reply.
    ///
    /// Blank input is ignored and returns `None`. Otherwise the trimmed text
    /// is appended with status sent and returned; the reply arrives later.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn send_user_message(&self, text: &str) -> Option<Message> {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring blank message");
            return None;
        }

        // Invalidate the old reply before the new message becomes the last
        // user message, so none of its status updates can land on it.
        self.scheduler.invalidate_pending();

        let message = lock_store(&self.store).append(NewMessage::user(text));
        self.scheduler.simulate_reply(text);
        Some(message)
    }

    /// Snapshot of the log.
    pub fn messages(&self) -> Vec<Message> {
        let mut store = lock_store(&self.store);
        store.ensure_loaded();
        store.messages().to_vec()
    }

    /// Returns true if a reply is still on its way.
    pub fn is_reply_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Subscribe to the typing indicator.
    pub fn typing(&self) -> watch::Receiver<bool> {
        self.scheduler.typing()
    }

    /// Wait until the pending reply, if any, has been delivered.
    pub async fn wait_idle(&self) {
        self.scheduler.wait_idle().await
    }

    /// Drop the pending reply without delivering it.
    pub fn cancel_reply(&self) -> bool {
        self.scheduler.cancel()
    }

    /// Current theme.
    pub fn theme(&self) -> Theme {
        self.theme.load()
    }

    /// Flip and persist the theme.
    pub fn toggle_theme(&self) -> Theme {
        self.theme.toggle()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{Author, Intent, MemoryStorage, MessageStatus, NoopObserver, ReplyTiming};

    fn conversation(storage: Arc<MemoryStorage>) -> Conversation {
        Conversation::new(storage, Arc::new(NoopObserver), ChatConfig::default()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_log_seeds_welcome() {
        let conv = conversation(Arc::new(MemoryStorage::new()));
        let log = conv.load_or_seed();

        assert_eq!(log.len(), 1);
        assert_eq!(log[0].author, Author::Assistant);
        assert_eq!(log[0].text, crate::config::WELCOME_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_greeting_scenario() {
        let conv = conversation(Arc::new(MemoryStorage::new()));
        conv.load_or_seed();

        let sent = conv.send_user_message("Hi there").unwrap();
        assert_eq!(sent.status, MessageStatus::Sent);
        assert!(conv.is_reply_pending());

        conv.wait_idle().await;

        let log = conv.messages();
        assert_eq!(log.len(), 3);
        assert_eq!(log[1].text, "Hi there");
        assert_eq!(log[1].status, MessageStatus::Read);
        assert_eq!(log[2].author, Author::Assistant);
        assert_eq!(log[2].text, IntentClassifier::new().classify("Hi there"));
        assert_eq!(
            IntentClassifier::new().detect("Hi there"),
            Intent::Greeting
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_input_is_ignored() {
        let conv = conversation(Arc::new(MemoryStorage::new()));
        conv.load_or_seed();

        assert!(conv.send_user_message("").is_none());
        assert!(conv.send_user_message("   \n\t ").is_none());
        assert_eq!(conv.messages().len(), 1);
        assert!(!conv.is_reply_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_is_trimmed() {
        let conv = conversation(Arc::new(MemoryStorage::new()));
        let sent = conv.send_user_message("  thanks a lot \n").unwrap();
        assert_eq!(sent.text, "thanks a lot");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_sends_yield_one_reply() {
        let conv = conversation(Arc::new(MemoryStorage::new()));
        conv.load_or_seed();

        conv.send_user_message("a");
        conv.send_user_message("b");
        conv.wait_idle().await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        let log = conv.messages();
        assert_eq!(log.len(), 4);
        assert_eq!(log[1].status, MessageStatus::Sent);
        assert_eq!(log[2].status, MessageStatus::Read);
        assert_eq!(log[3].text, IntentClassifier::new().classify("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_log_survives_restart() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let conv = conversation(storage.clone());
            conv.load_or_seed();
            conv.send_user_message("who are you");
            conv.wait_idle().await;
        }

        let conv = conversation(storage);
        let log = conv.load_or_seed();
        assert_eq!(log.len(), 3);
        assert_eq!(log[1].text, "who are you");
        assert_eq!(log[1].status, MessageStatus::Read);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_before_load_keeps_saved_log() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let conv = conversation(storage.clone());
            conv.load_or_seed();
            conv.send_user_message("who are you");
            conv.wait_idle().await;
        }

        // Restarted session sends without calling load_or_seed
        let conv = conversation(storage.clone());
        conv.send_user_message("thanks");
        conv.wait_idle().await;

        let saved = conversation(storage).messages();
        let texts: Vec<_> = saved.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(saved.len(), 5);
        assert_eq!(texts[1], "who are you");
        assert_eq!(texts[3], "thanks");
        assert_eq!(saved[3].status, MessageStatus::Read);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_reply_survives_without_ui() {
        // Nothing cancels the reply except a newer one or an explicit cancel
        let conv = conversation(Arc::new(MemoryStorage::new()));
        conv.send_user_message("bye");
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(conv.messages().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_reply() {
        let conv = conversation(Arc::new(MemoryStorage::new()));
        conv.send_user_message("bye");
        assert!(conv.cancel_reply());
        conv.wait_idle().await;
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(conv.messages().len(), 1);
    }

    #[test]
    fn test_invalid_timing_is_rejected() {
        let config = ChatConfig {
            timing: ReplyTiming {
                read_after: Duration::ZERO,
                ..ReplyTiming::default()
            },
            ..ChatConfig::default()
        };
        let result = Conversation::new(Arc::new(MemoryStorage::new()), Arc::new(NoopObserver), config);
        assert!(matches!(result, Err(ChatError::InvalidConfig(_))));
    }

    #[test]
    fn test_theme_roundtrip() {
        let storage = Arc::new(MemoryStorage::new());
        let conv = conversation(storage.clone());
        assert_eq!(conv.theme(), Theme::Dark);
        assert_eq!(conv.toggle_theme(), Theme::Light);
        assert_eq!(conversation(storage).theme(), Theme::Light);
    }
}
