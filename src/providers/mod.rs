//! Providers module - the completion-API boundary
//!
//! This module defines the `LLMProvider` trait and common types for talking
//! to a hosted completion service. The production implementation is
//! [`ClaudeProvider`]; [`RetryProvider`] decorates any provider with
//! exponential-backoff retries for transient failures.
//!
//! # Example
//!
//! ```rust,ignore
//! use scriba::providers::{ChatOptions, ClaudeProvider, LLMProvider};
//! use scriba::session::Message;
//!
//! async fn example() {
//!     let provider = ClaudeProvider::new("your-api-key");
//!     let messages = vec![Message::user("Ciao!")];
//!
//!     let response = provider
//!         .chat(messages, vec![], None, ChatOptions::new().with_max_tokens(1000))
//!         .await
//!         .unwrap();
//!     println!("{}", response.content);
//! }
//! ```

pub mod claude;
pub mod retry;
mod types;

use crate::error::ProviderError;

pub use claude::ClaudeProvider;
pub use retry::RetryProvider;
pub use types::{
    ChatOptions, LLMProvider, LLMResponse, LLMToolCall, StreamEvent, ToolDefinition, Usage,
};

/// Parse an HTTP status code and response body into a structured [`ProviderError`].
///
/// This centralizes the mapping from HTTP status codes to error
/// classifications so every provider produces consistent typed errors.
pub fn parse_provider_error(status: u16, body: &str) -> ProviderError {
    match status {
        401 | 403 => ProviderError::Auth(body.to_string()),
        404 => ProviderError::ModelNotFound(body.to_string()),
        429 => ProviderError::RateLimit(body.to_string()),
        400 => ProviderError::InvalidRequest(body.to_string()),
        503 => ProviderError::Overloaded(body.to_string()),
        500..=599 => ProviderError::ServerError(body.to_string()),
        _ => ProviderError::Unknown(format!("HTTP {}: {}", status, body)),
    }
}
