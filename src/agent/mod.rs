//! Agent module - the agentic tool-use loop
//!
//! This module provides the core loop that mediates between the user and
//! the completion provider:
//!
//! - Building conversation context with the system prompt and history
//! - Calling the provider for responses (buffered or streaming)
//! - Dispatching tool calls and feeding results back to the model
//! - Enforcing the round ceiling and preserving conversation state

mod context;
mod r#loop;

pub use context::ContextBuilder;
pub use r#loop::{Agent, AgentEvent};
