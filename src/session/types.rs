//! Session types for Scriba
//!
//! This module defines the core types for conversation state: messages,
//! roles, and tool calls. A conversation is an ordered sequence of messages;
//! tool results are messages with `Role::Tool` correlated to their
//! originating call by `tool_call_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A conversation session: the ordered message history for one agent.
///
/// The session is created once per agent, mutated only by appends during a
/// run, and reset only by an explicit [`Session::clear`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Ordered list of messages in this conversation
    pub messages: Vec<Message>,
    /// When this session was created
    pub created_at: DateTime<Utc>,
    /// When this session was last modified
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new empty session.
    ///
    /// # Example
    /// ```
    /// use scriba::session::Session;
    ///
    /// let session = Session::new();
    /// assert!(session.is_empty());
    /// ```
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message to this session.
    ///
    /// # Example
    /// ```
    /// use scriba::session::{Session, Message};
    ///
    /// let mut session = Session::new();
    /// session.add_message(Message::user("Hello!"));
    /// assert_eq!(session.message_count(), 1);
    /// ```
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// Clear all messages from this session.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.updated_at = Utc::now();
    }

    /// Get the number of messages in this session.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Check if this session is empty (no messages).
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get the last message in this session, if any.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// A single message in a conversation.
///
/// Messages can be from users, the assistant, system prompts, or tool
/// results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender
    pub role: Role,
    /// The text content of the message
    pub content: String,
    /// Tool calls made by the assistant (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// ID of the tool call this message is responding to (for tool results)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Whether this tool result reports a failure
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Message {
    /// Create a new user message.
    ///
    /// # Example
    /// ```
    /// use scriba::session::{Message, Role};
    ///
    /// let msg = Message::user("Hello, assistant!");
    /// assert_eq!(msg.role, Role::User);
    /// ```
    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            tool_calls: None,
            tool_call_id: None,
            is_error: false,
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
            tool_calls: None,
            tool_call_id: None,
            is_error: false,
        }
    }

    /// Create a new system message.
    pub fn system(content: &str) -> Self {
        Self {
            role: Role::System,
            content: content.to_string(),
            tool_calls: None,
            tool_call_id: None,
            is_error: false,
        }
    }

    /// Create a new tool result message.
    ///
    /// # Example
    /// ```
    /// use scriba::session::{Message, Role};
    ///
    /// let msg = Message::tool_result("call_123", "done", false);
    /// assert_eq!(msg.role, Role::Tool);
    /// assert_eq!(msg.tool_call_id.as_deref(), Some("call_123"));
    /// ```
    pub fn tool_result(tool_call_id: &str, content: &str, is_error: bool) -> Self {
        Self {
            role: Role::Tool,
            content: content.to_string(),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.to_string()),
            is_error,
        }
    }

    /// Create an assistant message carrying tool calls.
    ///
    /// # Example
    /// ```
    /// use scriba::session::{Message, ToolCall};
    ///
    /// let call = ToolCall::new("call_1", "calculator", r#"{"expression": "2+2"}"#);
    /// let msg = Message::assistant_with_tools("Let me compute that.", vec![call]);
    /// assert!(msg.has_tool_calls());
    /// ```
    pub fn assistant_with_tools(content: &str, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
            tool_calls: Some(tool_calls),
            tool_call_id: None,
            is_error: false,
        }
    }

    /// Check if this message has tool calls.
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls
            .as_ref()
            .map(|tc| !tc.is_empty())
            .unwrap_or(false)
    }

    /// Check if this is a tool result message.
    pub fn is_tool_result(&self) -> bool {
        self.role == Role::Tool && self.tool_call_id.is_some()
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompts and instructions
    System,
    /// Messages from the user
    User,
    /// Messages from the AI assistant
    Assistant,
    /// Results from tool executions
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A tool call made by the assistant.
///
/// The `id` is opaque and correlates the call with its result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,
    /// Name of the tool to call
    pub name: String,
    /// JSON-encoded arguments for the tool
    pub arguments: String,
}

impl ToolCall {
    /// Create a new tool call.
    ///
    /// # Example
    /// ```
    /// use scriba::session::ToolCall;
    ///
    /// let call = ToolCall::new("call_123", "get_weather", r#"{"city": "Roma"}"#);
    /// assert_eq!(call.name, "get_weather");
    /// ```
    pub fn new(id: &str, name: &str, arguments: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    /// Parse the arguments as a specific type.
    pub fn parse_arguments<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_new() {
        let session = Session::new();
        assert!(session.messages.is_empty());
        assert!(session.created_at <= session.updated_at);
    }

    #[test]
    fn test_session_add_message() {
        let mut session = Session::new();
        let initial_updated = session.updated_at;

        session.add_message(Message::user("Hello"));
        assert_eq!(session.messages.len(), 1);
        assert!(session.updated_at >= initial_updated);
    }

    #[test]
    fn test_session_clear() {
        let mut session = Session::new();
        session.add_message(Message::user("Hello"));
        session.clear();
        assert!(session.is_empty());
    }

    #[test]
    fn test_session_helpers() {
        let mut session = Session::new();
        assert!(session.is_empty());
        assert!(session.last_message().is_none());

        session.add_message(Message::user("Hello"));
        session.add_message(Message::assistant("Hi!"));

        assert_eq!(session.message_count(), 2);
        assert_eq!(session.last_message().unwrap().role, Role::Assistant);
    }

    #[test]
    fn test_message_constructors() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert!(msg.tool_calls.is_none());

        let msg = Message::assistant("Hi there");
        assert_eq!(msg.role, Role::Assistant);

        let msg = Message::system("You are helpful");
        assert_eq!(msg.role, Role::System);
    }

    #[test]
    fn test_message_tool_result() {
        let msg = Message::tool_result("call_123", "ok", false);
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id, Some("call_123".to_string()));
        assert!(!msg.is_error);
        assert!(msg.is_tool_result());

        let msg = Message::tool_result("call_456", "boom", true);
        assert!(msg.is_error);
    }

    #[test]
    fn test_message_with_tool_calls() {
        let call = ToolCall::new("call_1", "calculator", r#"{"expression": "2+2"}"#);
        let msg = Message::assistant_with_tools("Computing...", vec![call]);

        assert!(msg.has_tool_calls());
        let calls = msg.tool_calls.unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "calculator");
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::System.to_string(), "system");
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!(Role::Tool.to_string(), "tool");
    }

    #[test]
    fn test_role_serialize() {
        let json = serde_json::to_string(&Role::User).unwrap();
        assert_eq!(json, r#""user""#);

        let parsed: Role = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Role::User);
    }

    #[test]
    fn test_tool_call_parse_arguments() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct CalcArgs {
            expression: String,
        }

        let call = ToolCall::new("call_1", "calculator", r#"{"expression": "1250 * 0.15"}"#);
        let args: CalcArgs = call.parse_arguments().unwrap();
        assert_eq!(args.expression, "1250 * 0.15");
    }

    #[test]
    fn test_message_serialization_skips_defaults() {
        let msg = Message::user("Hello");
        let json = serde_json::to_string(&msg).unwrap();

        assert!(!json.contains("tool_calls"));
        assert!(!json.contains("tool_call_id"));
        assert!(!json.contains("is_error"));
    }

    #[test]
    fn test_session_serialization() {
        let mut session = Session::new();
        session.add_message(Message::user("Hello"));
        session.add_message(Message::assistant("Hi!"));

        let json = serde_json::to_string(&session).unwrap();
        let parsed: Session = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.messages.len(), 2);
        assert_eq!(parsed.messages[0].role, Role::User);
        assert_eq!(parsed.messages[1].role, Role::Assistant);
    }
}
