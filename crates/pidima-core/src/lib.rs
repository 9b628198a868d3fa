//! Pidima Conversation Engine
//!
//! This crate contains the state engine behind the Pidima chat widget:
//! - The persisted, append-only message log
//! - The sent → delivered → read status lifecycle of outgoing messages
//! - Simulated, cancellable reply delivery on a timer
//! - Intent-based reply selection
//!
//! Rendering is not done here. The surrounding UI implements
//! [`ConversationObserver`] and drives a [`Conversation`].

pub mod config;
pub mod controller;
pub mod error;
pub mod ids;
pub mod intent;
pub mod message;
pub mod observer;
pub mod scheduler;
pub mod status;
pub mod storage;
pub mod store;
pub mod theme;

// Re-export commonly used types
pub use config::{ChatConfig, ReplyTiming};
pub use controller::Conversation;
pub use error::ChatError;
pub use ids::MessageId;
pub use intent::{Intent, IntentClassifier};
pub use message::{Message, NewMessage};
pub use observer::{ConversationObserver, NoopObserver};
pub use scheduler::{ReplyPlan, ReplyScheduler};
pub use status::{Author, MessageStatus};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage};
pub use store::{MessageStore, SharedStore};
pub use theme::{Theme, ThemePreference};
