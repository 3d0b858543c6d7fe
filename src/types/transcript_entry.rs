use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::MessageRole;

/// One entry of the user-visible transcript.
///
/// The `id` never changes once the entry is created, so observers can replace
/// an in-progress assistant entry in place while its content grows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranscriptEntry {
    /// Stable identifier.
    pub id: Uuid,

    /// Who the entry belongs to.
    pub role: MessageRole,

    /// Current text of the entry.
    pub content: String,
}

impl TranscriptEntry {
    /// Create an entry with a freshly generated id.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
        }
    }

    /// Create a user entry.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant entry.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Create the empty assistant entry that a streamed reply grows into.
    pub fn placeholder() -> Self {
        Self::assistant(String::new())
    }
}
