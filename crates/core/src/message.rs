//! Message domain types.
//!
//! A conversation is an ordered `Vec<Message>` owned by the caller. The
//! assembler only ever reads it; the one message it synthesizes (the
//! summary) is a fresh `Role::System` value.

use crate::error::InputError;
use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions or a synthesized summary
    System,
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

impl Role {
    /// Lowercase wire name (`"user"`), as used in token accounting.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Uppercase label (`"USER"`), as rendered in the chat block.
    pub fn label(&self) -> &'static str {
        match self {
            Role::System => "SYSTEM",
            Role::User => "USER",
            Role::Assistant => "ASSISTANT",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation.
///
/// Deserialization tolerates a missing `role` (kept as `None`) or a missing
/// `content` (defaults to empty), but rejects a record lacking both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MessageRecord")]
pub struct Message {
    /// Who sent this message, `None` when the caller did not say
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// The text content
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role: Some(role),
            content: content.into(),
        }
    }

    /// A message whose sender is unknown.
    pub fn unattributed(content: impl Into<String>) -> Self {
        Self {
            role: None,
            content: content.into(),
        }
    }

    /// Lowercase role name for token accounting, empty when unknown.
    pub fn role_name(&self) -> &'static str {
        self.role.as_ref().map_or("", Role::as_str)
    }

    /// Uppercase role label for rendering, `UNKNOWN` when unknown.
    pub fn role_label(&self) -> &'static str {
        self.role.as_ref().map_or("UNKNOWN", Role::label)
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// Wire shape of a message before validation.
#[derive(Debug, Deserialize)]
struct MessageRecord {
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    content: Option<String>,
}

impl TryFrom<MessageRecord> for Message {
    type Error = InputError;

    fn try_from(record: MessageRecord) -> Result<Self, Self::Error> {
        match (record.role, record.content) {
            (None, None) => Err(InputError::EmptyMessage),
            (role, content) => Ok(Self {
                role,
                content: content.unwrap_or_default(),
            }),
        }
    }
}
