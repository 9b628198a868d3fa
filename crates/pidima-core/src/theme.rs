//! Theme preference, persisted beside the message log.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::KeyValueStore;

/// Color theme of the widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    /// Stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    /// Parse a stored value. Only `light` selects the light theme.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("light") => Self::Light,
            _ => Self::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads and writes the theme under its own storage key.
pub struct ThemePreference {
    storage: Arc<dyn KeyValueStore>,
    key: String,
}

impl ThemePreference {
    pub fn new(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Current theme; absent or unknown values mean dark.
    pub fn load(&self) -> Theme {
        Theme::from_stored(self.storage.get(&self.key).as_deref())
    }

    /// Persist `theme`. Failures are logged and otherwise ignored.
    pub fn save(&self, theme: Theme) {
        if let Err(e) = self.storage.set(&self.key, theme.as_str()) {
            warn!(key = %self.key, error = %e, "Failed to persist theme");
        }
    }

    /// Flip the theme, persist it and return the new one.
    pub fn toggle(&self) -> Theme {
        let next = self.load().toggled();
        self.save(next);
        next
    }
}
