//! Retry provider - decorator that adds automatic retry with exponential backoff.
//!
//! Wraps any [`LLMProvider`] to transparently retry transient errors such as
//! rate limits, server errors, and overload conditions. Non-transient errors
//! (authentication, invalid requests) are returned immediately.
//!
//! # Example
//!
//! ```rust,ignore
//! use scriba::providers::{ClaudeProvider, RetryProvider};
//!
//! let inner = ClaudeProvider::new("api-key");
//! let provider = RetryProvider::new(Box::new(inner))
//!     .with_max_retries(5)
//!     .with_base_delay_ms(500);
//! ```

use async_trait::async_trait;
use tracing::warn;

use crate::error::{Result, ScribaError};
use crate::session::Message;

use super::{ChatOptions, LLMProvider, LLMResponse, StreamEvent, ToolDefinition};

/// A decorator provider that retries transient errors with exponential backoff.
///
/// `chat()` retries the whole request; `chat_stream()` retries establishing
/// the stream. Once a stream is connected its events pass through untouched
/// (a stream that dies mid-response is not replayed, since fragments were
/// already surfaced to the caller).
pub struct RetryProvider {
    /// The wrapped provider that performs actual requests.
    inner: Box<dyn LLMProvider>,
    /// Maximum number of retry attempts before giving up.
    max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    base_delay_ms: u64,
    /// Maximum delay cap in milliseconds.
    max_delay_ms: u64,
}

impl std::fmt::Debug for RetryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryProvider")
            .field("inner", &self.inner.name())
            .field("max_retries", &self.max_retries)
            .field("base_delay_ms", &self.base_delay_ms)
            .field("max_delay_ms", &self.max_delay_ms)
            .finish()
    }
}

impl RetryProvider {
    /// Create a new `RetryProvider` wrapping the given inner provider.
    ///
    /// Defaults: 3 retries, 1 s base delay, 30 s cap.
    pub fn new(inner: Box<dyn LLMProvider>) -> Self {
        Self {
            inner,
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }

    /// Set the maximum number of retry attempts.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base delay in milliseconds for exponential backoff.
    ///
    /// The delay for attempt `n` is `min(base_delay_ms * 2^n + jitter, max_delay_ms)`.
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set the maximum delay cap in milliseconds.
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }
}

/// Check whether an error represents a transient failure worth retrying.
pub fn is_retryable(err: &ScribaError) -> bool {
    match err {
        ScribaError::Provider(pe) => pe.is_retryable(),
        ScribaError::Http(e) => e.is_timeout() || e.is_connect(),
        _ => false,
    }
}

/// Compute the backoff delay for a given attempt (without sleeping).
pub fn compute_delay(attempt: u32, base_delay_ms: u64, max_delay_ms: u64, jitter_ms: u64) -> u64 {
    let exponential = base_delay_ms.saturating_mul(1u64 << attempt.min(16));
    exponential.saturating_add(jitter_ms).min(max_delay_ms)
}

/// Sleep for the backoff delay of a given retry attempt.
///
/// Jitter is derived from the nanosecond component of the system clock,
/// which decorrelates concurrent retries without pulling in `rand`.
async fn delay_with_jitter(attempt: u32, base_delay_ms: u64, max_delay_ms: u64) {
    let jitter_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64 % base_delay_ms.max(1))
        .unwrap_or(0);

    let delay = compute_delay(attempt, base_delay_ms, max_delay_ms, jitter_ms);
    tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
}

#[async_trait]
impl LLMProvider for RetryProvider {
    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        model: Option<&str>,
        options: ChatOptions,
    ) -> Result<LLMResponse> {
        let mut attempt = 0;
        loop {
            match self
                .inner
                .chat(messages.clone(), tools.clone(), model, options.clone())
                .await
            {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        error = %e,
                        "Transient provider error, retrying"
                    );
                    delay_with_jitter(attempt, self.base_delay_ms, self.max_delay_ms).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn chat_stream(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        model: Option<&str>,
        options: ChatOptions,
    ) -> Result<tokio::sync::mpsc::Receiver<StreamEvent>> {
        let mut attempt = 0;
        loop {
            match self
                .inner
                .chat_stream(messages.clone(), tools.clone(), model, options.clone())
                .await
            {
                Ok(rx) => return Ok(rx),
                Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        error = %e,
                        "Transient provider error opening stream, retrying"
                    );
                    delay_with_jitter(attempt, self.base_delay_ms, self.max_delay_ms).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn default_model(&self) -> &str {
        self.inner.default_model()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Fails with the given error kind `failures` times, then succeeds.
    struct FlakyProvider {
        calls: Arc<AtomicU32>,
        failures: u32,
        retryable: bool,
    }

    #[async_trait]
    impl LLMProvider for FlakyProvider {
        async fn chat(
            &self,
            _messages: Vec<Message>,
            _tools: Vec<ToolDefinition>,
            _model: Option<&str>,
            _options: ChatOptions,
        ) -> Result<LLMResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                let err = if self.retryable {
                    ProviderError::Overloaded("busy".into())
                } else {
                    ProviderError::Auth("bad key".into())
                };
                Err(ScribaError::Provider(err))
            } else {
                Ok(LLMResponse::text("recovered"))
            }
        }

        fn default_model(&self) -> &str {
            "test-model"
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn flaky(failures: u32, retryable: bool) -> (RetryProvider, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let provider = RetryProvider::new(Box::new(FlakyProvider {
            calls: calls.clone(),
            failures,
            retryable,
        }))
        .with_base_delay_ms(1)
        .with_max_delay_ms(5);
        (provider, calls)
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let (provider, calls) = flaky(2, true);
        let response = provider
            .chat(vec![], vec![], None, ChatOptions::default())
            .await
            .unwrap();

        assert_eq!(response.content, "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let (provider, calls) = flaky(10, true);
        let provider = provider.with_max_retries(2);

        let result = provider
            .chat(vec![], vec![], None, ChatOptions::default())
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3); // initial + 2 retries
    }

    #[tokio::test]
    async fn test_does_not_retry_auth_errors() {
        let (provider, calls) = flaky(1, false);
        let result = provider
            .chat(vec![], vec![], None, ChatOptions::default())
            .await;

        assert!(matches!(
            result,
            Err(ScribaError::Provider(ProviderError::Auth(_)))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_passthrough_metadata() {
        let (provider, _) = flaky(0, true);
        assert_eq!(provider.name(), "flaky");
        assert_eq!(provider.default_model(), "test-model");
    }

    #[test]
    fn test_is_retryable() {
        assert!(is_retryable(&ScribaError::Provider(
            ProviderError::RateLimit("429".into())
        )));
        assert!(is_retryable(&ScribaError::Provider(
            ProviderError::ServerError("500".into())
        )));
        assert!(!is_retryable(&ScribaError::Provider(ProviderError::Auth(
            "401".into()
        ))));
        assert!(!is_retryable(&ScribaError::Config("x".into())));
        assert!(!is_retryable(&ScribaError::MaxRoundsExceeded {
            rounds: 10
        }));
    }

    #[test]
    fn test_compute_delay() {
        assert_eq!(compute_delay(0, 1000, 30_000, 0), 1000);
        assert_eq!(compute_delay(1, 1000, 30_000, 0), 2000);
        assert_eq!(compute_delay(2, 1000, 30_000, 0), 4000);
        assert_eq!(compute_delay(3, 1000, 30_000, 500), 8500);
        // Capped at max
        assert_eq!(compute_delay(10, 1000, 30_000, 0), 30_000);
        // Shift guard for absurd attempts
        assert_eq!(compute_delay(64, 1000, 30_000, 0), 30_000);
    }
}
