//! Model invocation with retry and exponential backoff.
//!
//! Every backend failure (network, rate limit, malformed response) is
//! retried under the configured [`RetryPolicy`]. Backoff suspends only the
//! calling task. Once attempts run out the caller gets a well-formed
//! "exhausted" outcome instead of an error.

use std::sync::Arc;
use std::time::Instant;

use crate::error::{ExtractionError, Result};
use crate::pipeline::parser::parse_response;
use crate::pipeline::prompts::format_request;
use crate::traits::backend::Backend;
use crate::types::config::{PipelineConfig, RetryPolicy};
use crate::types::draft::DraftGroup;

/// Outcome of one logical backend call (possibly several attempts).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// The backend answered.
    Completed { response: String, attempts: u32 },

    /// Every attempt failed.
    Exhausted { attempts: u32, last_error: String },
}

impl Invocation {
    /// Number of attempts made.
    pub fn attempts(&self) -> u32 {
        match self {
            Invocation::Completed { attempts, .. } | Invocation::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }

    /// The response text, or `RetriesExhausted`.
    pub fn into_result(self) -> Result<String> {
        match self {
            Invocation::Completed { response, .. } => Ok(response),
            Invocation::Exhausted {
                attempts,
                last_error,
            } => Err(ExtractionError::RetriesExhausted {
                attempts,
                last_error,
            }),
        }
    }
}

/// Wraps a [`Backend`] with the model id, token limit and retry policy.
pub struct ModelInvoker<B> {
    backend: Arc<B>,
    model: String,
    retry: RetryPolicy,
}

impl<B> Clone for ModelInvoker<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            model: self.model.clone(),
            retry: self.retry,
        }
    }
}

impl<B: Backend> ModelInvoker<B> {
    /// Create an invoker using the model and retry policy from `config`.
    pub fn new(backend: B, config: &PipelineConfig) -> Self {
        Self::from_shared(Arc::new(backend), config)
    }

    /// Create an invoker over a backend shared with other components.
    pub fn from_shared(backend: Arc<B>, config: &PipelineConfig) -> Self {
        Self {
            backend,
            model: config.model.clone(),
            retry: config.retry,
        }
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Send `prompt + text` to the backend, retrying with backoff.
    pub async fn complete(&self, text: &str, prompt: &str, max_tokens: u32) -> Invocation {
        let request = format_request(prompt, text);
        let max_attempts = self.retry.max_attempts.max(1);
        let text_length = text.chars().count();
        let mut last_error = String::new();

        for attempt in 0..max_attempts {
            tracing::info!(
                attempt = attempt + 1,
                max_attempts = max_attempts,
                model = %self.model,
                "Sending request to backend"
            );
            tracing::debug!(
                text_length,
                prompt_preview = %preview(prompt, 100),
                "Request details"
            );

            let started = Instant::now();
            match self.backend.complete(&self.model, max_tokens, &request).await {
                Ok(response) => {
                    tracing::info!(
                        attempt = attempt + 1,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        response_length = response.len(),
                        "Received response from backend"
                    );
                    tracing::debug!(response_preview = %preview(&response, 200), "Raw response");

                    return Invocation::Completed {
                        response,
                        attempts: attempt + 1,
                    };
                }
                Err(e) => {
                    last_error = e.to_string();

                    if self.retry.has_next(attempt) {
                        let delay = self.retry.delay_for(attempt);
                        tracing::warn!(
                            attempt = attempt + 1,
                            error = %e,
                            delay_ms = delay.as_millis() as u64,
                            "Backend call failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        tracing::error!(
                            attempts = max_attempts,
                            error = %e,
                            "All retry attempts failed"
                        );
                    }
                }
            }
        }

        Invocation::Exhausted {
            attempts: max_attempts,
            last_error,
        }
    }

    /// Call the backend and parse its answer into a draft mapping.
    ///
    /// Exhausted retries yield [`DraftGroup::fallback`], which callers treat
    /// like a successful but empty response.
    pub async fn invoke(&self, text: &str, prompt: &str, max_tokens: u32) -> DraftGroup {
        match self.complete(text, prompt, max_tokens).await {
            Invocation::Completed { response, .. } => parse_response(&response),
            Invocation::Exhausted { .. } => {
                tracing::warn!("Creating fallback response");
                DraftGroup::fallback()
            }
        }
    }
}

/// First `max_chars` characters of `text`.
fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::testing::MockBackend;
    use std::time::Duration;

    fn config(max_attempts: u32, base_delay: Duration) -> PipelineConfig {
        PipelineConfig::new().with_retry(RetryPolicy::new(max_attempts, base_delay))
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let backend = MockBackend::new().with_response(r#"{"variants": []}"#);
        let invoker = ModelInvoker::new(backend, &config(3, Duration::ZERO));

        let outcome = invoker.complete("text", "prompt", 100).await;

        assert_eq!(outcome.attempts(), 1);
        assert_eq!(outcome.into_result().unwrap(), r#"{"variants": []}"#);

        let calls = invoker.backend().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].prompt, "prompt\n\nText to analyze:\ntext");
        assert_eq!(calls[0].max_tokens, 100);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_request_log_counts_characters() {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let invoker = ModelInvoker::new(MockBackend::new(), &config(1, Duration::ZERO));
        // 11 characters, 13 bytes
        invoker.complete("héllo wörld", "prompt", 100).await;

        let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("text_length=11"), "{logs}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_with_exponential_backoff() {
        let backend = MockBackend::new()
            .with_failure(BackendError::RateLimited)
            .with_failure(BackendError::Network("reset".into()))
            .with_response("recovered");
        let invoker = ModelInvoker::new(backend, &config(3, Duration::from_secs(1)));

        let started = tokio::time::Instant::now();
        let outcome = invoker.complete("text", "prompt", 100).await;

        assert_eq!(
            outcome,
            Invocation::Completed {
                response: "recovered".to_string(),
                attempts: 3
            }
        );
        // 1s after the first failure, 2s after the second
        assert_eq!(started.elapsed(), Duration::from_secs(3));

        let calls = invoker.backend().calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[1].at - calls[0].at >= Duration::from_secs(1));
        assert!(calls[2].at - calls[1].at >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_sleep_after_final_attempt() {
        let backend = MockBackend::new().with_default_failure();
        let invoker = ModelInvoker::new(backend, &config(3, Duration::from_secs(1)));

        let started = tokio::time::Instant::now();
        let outcome = invoker.complete("text", "prompt", 100).await;

        assert_eq!(outcome.attempts(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
        assert!(matches!(
            outcome.into_result(),
            Err(ExtractionError::RetriesExhausted { attempts: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_invoke_returns_fallback_mapping_when_exhausted() {
        let backend = MockBackend::new().with_default_failure();
        let invoker = ModelInvoker::new(backend, &config(2, Duration::ZERO));

        let group = invoker.invoke("text", "prompt", 100).await;

        assert_eq!(group, DraftGroup::fallback());
        assert_eq!(invoker.backend().call_count(), 2);
    }

    #[tokio::test]
    async fn test_invoke_parses_response() {
        let backend = MockBackend::new()
            .with_response(r#"```json
{"variants": [{"name": "BRAF V600E"}]}
```"#);
        let invoker = ModelInvoker::new(backend, &config(1, Duration::ZERO));

        let group = invoker.invoke("text", "prompt", 100).await;

        assert_eq!(group.variants.len(), 1);
        assert!(!group.is_fallback());
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("αβγδ", 2), "αβ");
        assert_eq!(preview("ab", 10), "ab");
    }
}
