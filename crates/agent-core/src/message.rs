//! Conversation Messages
//!
//! Message format shared by the orchestrator, providers and the route layer,
//! plus the per-session conversation log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tool::ToolCallRequest;

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Tool result answering an assistant tool call
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

/// A single message in a conversation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Text content (may be empty for assistant tool-call messages)
    pub content: String,

    /// Tool calls requested by an assistant message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,

    /// Id of the tool call a `tool` message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create an assistant message carrying tool-call requests
    pub fn assistant_tool_calls(
        content: impl Into<String>,
        tool_calls: Vec<ToolCallRequest>,
    ) -> Self {
        let mut msg = Self::new(Role::Assistant, content);
        msg.tool_calls = tool_calls;
        msg
    }

    /// Create a tool result message
    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Tool, content);
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }

    /// Whether this is an assistant message requesting tools
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Ordered message log for one session
///
/// Always starts with exactly one system message. That message survives
/// [`Conversation::reset`] and is never part of [`Conversation::history`].
#[derive(Clone, Debug)]
pub struct Conversation {
    messages: Vec<Message>,
}

#[allow(clippy::len_without_is_empty)]
impl Conversation {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Add a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All messages, system prompt included (what providers receive)
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages after the system prompt, in order
    pub fn history(&self) -> &[Message] {
        &self.messages[1..]
    }

    /// Get the last message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Drop everything but the system prompt
    pub fn reset(&mut self) {
        self.messages.truncate(1);
    }

    /// Roll back to an earlier length; the system prompt is always kept
    pub(crate) fn truncate(&mut self, len: usize) {
        self.messages.truncate(len.max(1));
    }

    /// Number of messages, system prompt included
    pub fn len(&self) -> usize {
        self.messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert!(!msg.has_tool_calls());
    }

    #[test]
    fn test_tool_message_carries_call_id() {
        let msg = Message::tool("{}", "call_1");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_conversation_history_hides_system_prompt() {
        let mut conv = Conversation::new("You are helpful.");
        conv.push(Message::user("Hi"));
        conv.push(Message::assistant("Hello!"));

        assert_eq!(conv.len(), 3);
        assert_eq!(conv.history().len(), 2);
        assert_eq!(conv.history()[0].role, Role::User);
        assert_eq!(conv.last().unwrap().role, Role::Assistant);
    }

    #[test]
    fn test_appended_user_message_is_last_in_history() {
        let mut conv = Conversation::new("sys");
        conv.push(Message::user("first"));
        conv.push(Message::assistant("reply"));
        conv.push(Message::user("second"));

        let last = conv.history().last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, "second");
    }

    #[test]
    fn test_reset_keeps_only_system_prompt() {
        let mut conv = Conversation::new("sys");
        conv.push(Message::user("Hi"));
        conv.push(Message::assistant("Hello!"));
        conv.reset();

        assert_eq!(conv.len(), 1);
        assert!(conv.history().is_empty());
        assert_eq!(conv.messages()[0].role, Role::System);
    }

    #[test]
    fn test_truncate_never_drops_system_prompt() {
        let mut conv = Conversation::new("sys");
        conv.push(Message::user("Hi"));
        conv.truncate(0);
        assert_eq!(conv.len(), 1);
    }

    #[test]
    fn test_serialization_omits_empty_tool_fields() {
        let json = serde_json::to_value(Message::assistant("ok")).unwrap();
        assert!(json.get("tool_calls").is_none());
        assert!(json.get("tool_call_id").is_none());
        assert_eq!(json["role"], "assistant");
    }
}
