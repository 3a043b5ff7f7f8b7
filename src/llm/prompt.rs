//! Chat prompt construction.

use serde::{Deserialize, Serialize};

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a chat prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Builder for chat prompts, anchored on a system message.
///
/// ```
/// use research_stream::llm::PromptBuilder;
///
/// let messages = PromptBuilder::system("You are a researcher.")
///     .user("Topic: fungal networks")
///     .build();
/// assert_eq!(messages.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    messages: Vec<ChatMessage>,
}

impl PromptBuilder {
    /// Start a prompt with a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::new(Role::System, content)],
        }
    }

    /// Append a user message
    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::new(Role::User, content));
        self
    }

    /// Append an assistant message
    pub fn assistant(mut self, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::new(Role::Assistant, content));
        self
    }

    /// Finish the prompt
    pub fn build(self) -> Vec<ChatMessage> {
        self.messages
    }
}
