//! Backend trait for text generation.
//!
//! The pipeline needs exactly one capability from a model provider: turn a
//! prompt into text. Everything else (retries, parsing, scoring) lives in
//! the library, so a backend stays a thin transport.

use async_trait::async_trait;

use crate::error::BackendResult;

/// A generative text backend.
///
/// Implementations wrap a specific provider (Anthropic, a local model, a
/// mock) and may fail or return ill-formed content at any time; callers
/// must not assume the output is JSON.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Complete a single prompt.
    ///
    /// `prompt` already contains both the instructions and the text to
    /// analyze. Returns the raw response text.
    async fn complete(&self, model: &str, max_tokens: u32, prompt: &str) -> BackendResult<String>;
}

#[async_trait]
impl<B: Backend + ?Sized> Backend for std::sync::Arc<B> {
    async fn complete(&self, model: &str, max_tokens: u32, prompt: &str) -> BackendResult<String> {
        (**self).complete(model, max_tokens, prompt).await
    }
}
