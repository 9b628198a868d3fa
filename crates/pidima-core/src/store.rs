//! Message Store - the append-only, persisted conversation log.
//!
//! The store is the only writer of the log. Every mutation rewrites the
//! whole log under one storage key and then notifies the observer, so a
//! view never sees state that is not already persisted.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::{ConversationObserver, KeyValueStore, Message, MessageStatus, NewMessage};

/// Message store shared between the controller and pending reply tasks.
pub type SharedStore = Arc<Mutex<MessageStore>>;

/// Lock a shared store, recovering the guard if a previous holder panicked.
pub fn lock_store(store: &SharedStore) -> MutexGuard<'_, MessageStore> {
    store.lock().unwrap_or_else(|e| e.into_inner())
}

/// Append-only message log backed by a key-value store.
pub struct MessageStore {
    storage: Arc<dyn KeyValueStore>,
    observer: Arc<dyn ConversationObserver>,
    key: String,
    messages: Vec<Message>,
    /// Whether the persisted log has been read into `messages`.
    loaded: bool,
}

impl MessageStore {
    /// Create a store. The persisted log is read on first access.
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        observer: Arc<dyn ConversationObserver>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            observer,
            key: key.into(),
            messages: Vec::new(),
            loaded: false,
        }
    }

    /// Wrap the store for sharing with reply tasks.
    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    /// Read the persisted log.
    ///
    /// Missing or corrupt data yields an empty log; corruption is logged
    /// and never reported to the caller.
    pub fn load(&self) -> Vec<Message> {
        let Some(raw) = self.storage.get(&self.key) else {
            return Vec::new();
        };

        match serde_json::from_str::<Vec<Message>>(&raw) {
            Ok(messages) => messages,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding corrupt message log");
                Vec::new()
            }
        }
    }

    /// Replace the in-memory log with the persisted one.
    pub fn hydrate(&mut self) -> &[Message] {
        self.messages = self.load();
        self.loaded = true;
        debug!(count = self.messages.len(), "Hydrated message log");
        &self.messages
    }

    /// Hydrate unless the persisted log was already read.
    ///
    /// Every write replaces the whole persisted log, so a write must never
    /// start from an unhydrated buffer.
    pub fn ensure_loaded(&mut self) {
        if !self.loaded {
            self.hydrate();
        }
    }

    /// Hydrate, seeding a single assistant welcome message if the log is empty.
    pub fn load_or_seed(&mut self, welcome: &str) -> Vec<Message> {
        self.ensure_loaded();
        if self.messages.is_empty() {
            info!("No message log found, seeding welcome message");
            self.append(NewMessage::assistant(welcome));
        }
        self.messages.clone()
    }

    /// Append a message, persist the log and notify the observer.
    pub fn append(&mut self, partial: NewMessage) -> Message {
        self.ensure_loaded();
        let message = Message::create(partial);
        self.messages.push(message.clone());
        self.persist();

        debug!(
            message_id = %message.id,
            author = ?message.author,
            status = ?message.status,
            "Appended message"
        );
        self.observer.on_message_appended(&message);
        message
    }

    /// Move the most recent user message to `status`.
    ///
    /// Returns false, without touching anything, when there is no user
    /// message yet or when `status` would not be a step forward.
    pub fn update_last_user_status(&mut self, status: MessageStatus) -> bool {
        self.ensure_loaded();
        let Some(message) = self
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.is_from_user())
        else {
            debug!(status = ?status, "No user message to update");
            return false;
        };

        if !message.status.can_advance_to(status) {
            debug!(
                message_id = %message.id,
                current = ?message.status,
                requested = ?status,
                "Ignoring status regression"
            );
            return false;
        }

        message.status = status;
        let id = message.id.clone();
        self.persist();

        debug!(message_id = %id, status = ?status, "Updated message status");
        self.observer.on_status_updated(&id, status);
        true
    }

    /// All messages in log order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages in the log.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if the log has no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Write the whole log under the storage key.
    fn persist(&self) {
        let raw = match serde_json::to_string(&self.messages) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to encode message log");
                return;
            }
        };

        if let Err(e) = self.storage.set(&self.key, &raw) {
            warn!(key = %self.key, error = %e, "Failed to persist message log");
        }
    }
}
