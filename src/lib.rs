//! Scriba - conversational AI assistant with an agentic tool-use loop
//!
//! Scriba mediates between a human operator and Anthropic's messages API,
//! extending the model with a small set of tools (arithmetic, weather,
//! webpage reading, date/time, persistent notes). The model requests tool
//! calls, the agent executes them and feeds the results back, and the loop
//! repeats until a final natural-language answer is produced.

pub mod agent;
pub mod config;
pub mod error;
pub mod providers;
pub mod session;
pub mod tools;

pub use agent::{Agent, AgentEvent, ContextBuilder};
pub use config::Config;
pub use error::{ProviderError, Result, ScribaError};
pub use providers::{
    ChatOptions, ClaudeProvider, LLMProvider, LLMResponse, LLMToolCall, RetryProvider,
    StreamEvent, ToolDefinition, Usage,
};
pub use session::{Message, Role, Session, ToolCall};
pub use tools::{Tool, ToolRegistry, ToolResult};
