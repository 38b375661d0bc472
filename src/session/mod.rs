//! Session module - conversation state for the agent loop
//!
//! A [`Session`] is the ordered sequence of turns forming the model's
//! context: user messages, assistant messages (optionally carrying tool
//! calls), and tool results correlated by call id. It lives for the
//! lifetime of its owning agent and is only reset by an explicit clear.

pub mod types;

pub use types::{Message, Role, Session, ToolCall};
