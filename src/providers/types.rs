//! Provider types for Scriba
//!
//! This module defines the core types and traits for the completion-API
//! boundary: the `LLMProvider` trait, chat options, response types, and the
//! incremental stream events.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScribaError};
use crate::session::Message;

/// Definition of a tool that can be called by the model.
///
/// Serialized verbatim into the completion request's tool declarations, in
/// registration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The name of the tool (must be unique)
    pub name: String,
    /// Description the model uses to decide applicability
    pub description: String,
    /// JSON Schema describing the tool's parameters
    pub input_schema: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new tool definition.
    ///
    /// # Example
    /// ```
    /// use scriba::providers::ToolDefinition;
    /// use serde_json::json;
    ///
    /// let tool = ToolDefinition::new(
    ///     "calculator",
    ///     "Evaluate an arithmetic expression",
    ///     json!({
    ///         "type": "object",
    ///         "properties": {
    ///             "expression": { "type": "string" }
    ///         },
    ///         "required": ["expression"]
    ///     }),
    /// );
    /// assert_eq!(tool.name, "calculator");
    /// ```
    pub fn new(name: &str, description: &str, input_schema: serde_json::Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// Trait for completion providers.
///
/// The provider translates between Scriba's message format and the hosted
/// API's wire format. Implementations must be cheap to share behind an
/// `Arc` and safe to call from multiple tasks.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send a chat completion request and wait for the full response.
    ///
    /// # Arguments
    /// * `messages` - The conversation history, system prompt included
    /// * `tools` - Tool declarations the model may call this turn
    /// * `model` - Optional model override (uses the default if None)
    /// * `options` - Sampling options (max_tokens, temperature, ...)
    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        model: Option<&str>,
        options: ChatOptions,
    ) -> Result<LLMResponse>;

    /// Send a chat completion request and receive the response incrementally.
    ///
    /// The returned channel yields [`StreamEvent::Delta`] text fragments as
    /// they arrive, any tool calls once fully assembled, and a terminal
    /// [`StreamEvent::Done`] carrying the complete content. Tool-call
    /// structure is only known at `Done`; consumers must drain the channel
    /// before acting on the response.
    ///
    /// The default implementation adapts [`LLMProvider::chat`]: one delta
    /// with the whole text, then the terminal events. Providers with native
    /// streaming support should override it.
    async fn chat_stream(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        model: Option<&str>,
        options: ChatOptions,
    ) -> Result<tokio::sync::mpsc::Receiver<StreamEvent>> {
        let response = self.chat(messages, tools, model, options).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        if !response.content.is_empty() {
            let _ = tx.send(StreamEvent::Delta(response.content.clone())).await;
        }
        if response.has_tool_calls() {
            let _ = tx
                .send(StreamEvent::ToolCalls(response.tool_calls.clone()))
                .await;
        }
        let _ = tx
            .send(StreamEvent::Done {
                content: response.content,
                usage: response.usage,
            })
            .await;
        Ok(rx)
    }

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;

    /// Get the provider name (e.g., "claude").
    fn name(&self) -> &str;
}

/// Options for chat completion requests.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature for sampling
    pub temperature: Option<f32>,
    /// Nucleus sampling parameter
    pub top_p: Option<f32>,
    /// Stop sequences that halt generation
    pub stop: Option<Vec<String>>,
}

impl ChatOptions {
    /// Create new default chat options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the top_p (nucleus sampling) parameter.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set stop sequences that will halt generation.
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }
}

/// Response from a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
    /// Text content of the response
    pub content: String,
    /// Tool calls made by the model (if any)
    pub tool_calls: Vec<LLMToolCall>,
    /// Token usage information (if available)
    pub usage: Option<Usage>,
}

impl LLMResponse {
    /// Create a simple text response with no tool calls.
    ///
    /// # Example
    /// ```
    /// use scriba::providers::LLMResponse;
    ///
    /// let response = LLMResponse::text("Ciao!");
    /// assert!(!response.has_tool_calls());
    /// ```
    pub fn text(content: &str) -> Self {
        Self {
            content: content.to_string(),
            tool_calls: vec![],
            usage: None,
        }
    }

    /// Create a response with tool calls.
    pub fn with_tools(content: &str, tool_calls: Vec<LLMToolCall>) -> Self {
        Self {
            content: content.to_string(),
            tool_calls,
            usage: None,
        }
    }

    /// Check if this response contains any tool calls.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Set usage information for this response.
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// A tool call made by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMToolCall {
    /// Unique identifier for this tool call
    pub id: String,
    /// Name of the tool to execute
    pub name: String,
    /// JSON-encoded arguments for the tool
    pub arguments: String,
}

impl LLMToolCall {
    /// Create a new tool call.
    pub fn new(id: &str, name: &str, arguments: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }
}

/// An event on a streaming completion channel.
///
/// A stream is a finite, non-restartable sequence of `Delta` fragments,
/// optionally a `ToolCalls` batch, terminated by exactly one `Done` or
/// `Error`.
#[derive(Debug)]
pub enum StreamEvent {
    /// A text fragment, in emission order
    Delta(String),
    /// The fully assembled tool calls of this response
    ToolCalls(Vec<LLMToolCall>),
    /// Terminal event: the complete text content and usage
    Done {
        content: String,
        usage: Option<Usage>,
    },
    /// Terminal event: the stream failed
    Error(ScribaError),
}

/// Token usage information from a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,
    /// Number of tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used (prompt + completion)
    pub total_tokens: u32,
}

impl Usage {
    /// Create new usage information.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}
