//! Testing utilities including a mock backend.
//!
//! These are useful for testing applications that use the extraction library
//! without making real model or network calls.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use tokio::time::Instant;

use crate::error::{BackendError, BackendResult};
use crate::traits::backend::Backend;

/// A mock backend for testing.
///
/// Answers are resolved in this order:
///
/// 1. The first prompt rule whose needle occurs in the prompt
/// 2. The next scripted answer, consumed in FIFO order
/// 3. The default answer (`"{}"` unless overridden)
#[derive(Clone)]
pub struct MockBackend {
    /// Answers keyed by a substring of the prompt
    rules: Arc<RwLock<Vec<(String, BackendResult<String>)>>>,

    /// One-shot answers
    script: Arc<RwLock<VecDeque<BackendResult<String>>>>,

    /// Answer once rules and script are exhausted
    default: Arc<RwLock<BackendResult<String>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockBackendCall>>>,
}

/// Record of a call made to the mock backend.
#[derive(Debug, Clone)]
pub struct MockBackendCall {
    pub model: String,
    pub max_tokens: u32,
    pub prompt: String,

    /// When the call arrived (tokio clock, so paused tests see virtual time)
    pub at: Instant,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a mock that answers `{}` to everything.
    pub fn new() -> Self {
        Self {
            rules: Arc::default(),
            script: Arc::default(),
            default: Arc::new(RwLock::new(Ok("{}".to_string()))),
            calls: Arc::default(),
        }
    }

    /// Queue a successful answer.
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.script.write().unwrap().push_back(Ok(response.into()));
        self
    }

    /// Queue a failed answer.
    pub fn with_failure(self, error: BackendError) -> Self {
        self.script.write().unwrap().push_back(Err(error));
        self
    }

    /// Answer any prompt containing `needle` with `response`.
    pub fn with_response_for(self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules
            .write()
            .unwrap()
            .push((needle.into(), Ok(response.into())));
        self
    }

    /// Fail any prompt containing `needle`.
    pub fn with_failure_for(self, needle: impl Into<String>, error: BackendError) -> Self {
        self.rules.write().unwrap().push((needle.into(), Err(error)));
        self
    }

    /// Replace the default answer.
    pub fn with_default_response(self, response: impl Into<String>) -> Self {
        *self.default.write().unwrap() = Ok(response.into());
        self
    }

    /// Fail every call that no rule or script entry answers.
    pub fn with_default_error(self, error: BackendError) -> Self {
        *self.default.write().unwrap() = Err(error);
        self
    }

    /// Shorthand for a network failure on every unanswered call.
    pub fn with_default_failure(self) -> Self {
        self.with_default_error(BackendError::Network("mock backend unavailable".to_string()))
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockBackendCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    fn answer(&self, prompt: &str) -> BackendResult<String> {
        let rule = self
            .rules
            .read()
            .unwrap()
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, answer)| answer.clone());
        if let Some(answer) = rule {
            return answer;
        }

        if let Some(answer) = self.script.write().unwrap().pop_front() {
            return answer;
        }

        self.default.read().unwrap().clone()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn complete(&self, model: &str, max_tokens: u32, prompt: &str) -> BackendResult<String> {
        self.calls.write().unwrap().push(MockBackendCall {
            model: model.to_string(),
            max_tokens,
            prompt: prompt.to_string(),
            at: Instant::now(),
        });

        self.answer(prompt)
    }
}
