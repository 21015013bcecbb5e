//! Configuration types for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "claude-3-opus-20240229";

/// Configuration for the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Model identifier passed to the backend.
    pub model: String,

    /// Upper bound on tokens the backend may generate per call.
    ///
    /// Default: 4000.
    pub max_output_tokens: u32,

    /// Retry behavior for backend calls.
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Keep the input text on the extraction result.
    ///
    /// Default: true.
    pub include_raw_text: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_output_tokens: 4000,
            retry: RetryPolicy::default(),
            include_raw_text: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the per-call output token limit.
    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = max;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Keep or drop the input text on results.
    pub fn with_raw_text(mut self, include: bool) -> Self {
        self.include_raw_text = include;
        self
    }
}

/// Exponential backoff policy for backend calls.
///
/// Attempt `n` (0-based) that fails is followed by a wait of
/// `base_delay * 2^n`, except after the last attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Minimum 1.
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms: base_delay.as_millis() as u64,
        }
    }

    /// A policy that never waits; useful in tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Backoff after the given 0-based attempt failed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }

    /// Whether another attempt follows the given 0-based attempt.
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts.max(1)
    }
}
