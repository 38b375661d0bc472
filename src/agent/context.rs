//! Context builder for agent conversations
//!
//! Constructs the system prompt and full message sequence handed to the
//! completion provider on every round. The system message is prepended
//! fresh each time and is never part of the caller-visible history.

use crate::session::Message;

/// Default system prompt.
const DEFAULT_SYSTEM_PROMPT: &str = "\
You are Scriba, a helpful conversational assistant.

You have access to tools you can use to help the user:
- calculator: arithmetic and percentages
- get_weather: current weather for a city
- read_webpage: read and extract the content of a web page
- get_datetime: current date and time
- manage_notes: save and recall persistent notes

Use tools when appropriate, and answer in the user's language.
Be concise but complete.";

/// Builds the message sequence for provider calls.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    system_prompt: String,
}

impl ContextBuilder {
    /// Create a context builder with the default system prompt.
    pub fn new() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Override the system prompt.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// Build the system message.
    pub fn build_system_message(&self) -> Message {
        Message::system(&self.system_prompt)
    }

    /// Build the full provider message sequence: system prompt followed by
    /// the conversation history.
    pub fn build_messages(&self, history: &[Message]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(self.build_system_message());
        messages.extend(history.iter().cloned());
        messages
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
