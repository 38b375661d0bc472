//! Error types for Scriba
//!
//! This module defines all error types used throughout the crate.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use std::fmt;
use thiserror::Error;

// ============================================================================
// Provider Error Classification
// ============================================================================

/// Structured provider error classification.
///
/// Provides fine-grained categorization of completion-API HTTP errors,
/// enabling retry decisions without string matching and letting callers
/// distinguish credential problems from transient failures.
#[derive(Debug)]
pub enum ProviderError {
    /// 401 — Invalid API key or authentication failure
    Auth(String),
    /// 429 — Rate limit or quota exceeded
    RateLimit(String),
    /// 500/502/504 — Server-side errors
    ServerError(String),
    /// 400 — Bad request, invalid JSON, malformed parameters
    InvalidRequest(String),
    /// 404 — Model not found or endpoint not available
    ModelNotFound(String),
    /// Connection or read timeout
    Timeout(String),
    /// 503 or Anthropic `overloaded_error` — retry with backoff
    Overloaded(String),
    /// Response body that does not parse as the documented shape
    MalformedResponse(String),
    /// Catch-all for unrecognized errors
    Unknown(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Auth(msg) => write!(f, "Authentication error: {}", msg),
            ProviderError::RateLimit(msg) => write!(f, "Rate limit error: {}", msg),
            ProviderError::ServerError(msg) => write!(f, "Server error: {}", msg),
            ProviderError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ProviderError::ModelNotFound(msg) => write!(f, "Model not found: {}", msg),
            ProviderError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            ProviderError::Overloaded(msg) => write!(f, "Overloaded error: {}", msg),
            ProviderError::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
            ProviderError::Unknown(msg) => write!(f, "Unknown provider error: {}", msg),
        }
    }
}

impl ProviderError {
    /// Returns `true` if this error is transient and the request should be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimit(_)
                | ProviderError::ServerError(_)
                | ProviderError::Timeout(_)
                | ProviderError::Overloaded(_)
        )
    }

    /// Returns the HTTP status code associated with this error, if applicable.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProviderError::Auth(_) => Some(401),
            ProviderError::RateLimit(_) => Some(429),
            ProviderError::ServerError(_) => Some(500),
            ProviderError::InvalidRequest(_) => Some(400),
            ProviderError::ModelNotFound(_) => Some(404),
            ProviderError::Overloaded(_) => Some(503),
            ProviderError::Timeout(_) => None,
            ProviderError::MalformedResponse(_) => None,
            ProviderError::Unknown(_) => None,
        }
    }
}

impl From<ProviderError> for ScribaError {
    fn from(err: ProviderError) -> Self {
        ScribaError::Provider(err)
    }
}

// ============================================================================
// Primary Error Type
// ============================================================================

/// The primary error type for Scriba operations.
///
/// Tool-level failures (bad arguments, unknown tool names, failed side
/// effects) never surface here — the registry converts them into
/// error-flagged tool results so the model can react. This type covers the
/// request-level failures that abort the current user request.
#[derive(Error, Debug)]
pub enum ScribaError {
    /// Configuration-related errors (invalid config, missing API key, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Completion-API failure with classification for retry decisions
    #[error("Provider error: {0}")]
    Provider(ProviderError),

    /// Tool infrastructure errors (invalid schema at registration, etc.)
    #[error("Tool error: {0}")]
    Tool(String),

    /// Attempt to register a second tool under an existing name
    #[error("Duplicate tool: {0}")]
    DuplicateTool(String),

    /// The tool loop exceeded the configured round ceiling
    #[error("Tool loop exceeded the maximum of {rounds} rounds")]
    MaxRoundsExceeded { rounds: usize },

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A specialized `Result` type for Scriba operations.
pub type Result<T> = std::result::Result<T, ScribaError>;
