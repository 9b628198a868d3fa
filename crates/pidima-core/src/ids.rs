//! Message identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of a message in the log.
///
/// Freshly generated ids are hyphenless UUIDs. Ids read back from storage
/// are kept verbatim, whatever shape the writer used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generate a fresh id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_and_hyphenless() {
        let a = MessageId::generate();
        let b = MessageId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert!(!a.as_str().contains('-'));
    }

    #[test]
    fn test_stored_id_is_kept_verbatim() {
        let id: MessageId = serde_json::from_str("\"1712345678901-ab3xz\"").unwrap();
        assert_eq!(id.to_string(), "1712345678901-ab3xz");
        assert_eq!(id, MessageId::from("1712345678901-ab3xz"));
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"1712345678901-ab3xz\"");
    }
}
