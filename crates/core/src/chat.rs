use serde::{Deserialize, Serialize};

/// Content the UI shows while a response is pending.
///
/// Messages carrying it are UI state only and must never reach the model.
pub const PENDING_PLACEHOLDER: &str = "...thinking...";

/// Role of a chat message as the UI names it.
///
/// Deserialization rejects anything other than `user` and `assistant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Role of a turn as the model API names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelRole {
    User,
    Model,
}

impl From<ChatRole> for ModelRole {
    fn from(role: ChatRole) -> Self {
        match role {
            ChatRole::User => ModelRole::User,
            ChatRole::Assistant => ModelRole::Model,
        }
    }
}

impl From<ModelRole> for ChatRole {
    fn from(role: ModelRole) -> Self {
        match role {
            ModelRole::User => ChatRole::User,
            ModelRole::Model => ChatRole::Assistant,
        }
    }
}

/// One entry of the conversation history, in turn order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }

    /// True for the "response pending" placeholder.
    pub fn is_pending(&self) -> bool {
        self.content.trim() == PENDING_PLACEHOLDER
    }

    /// True when the message carries something the model can use.
    pub fn is_forwardable(&self) -> bool {
        !self.is_pending() && !self.content.trim().is_empty()
    }
}
