//! Typed errors for the extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. None of these escape the
//! pipeline: the invoker retries backend errors, the extractor turns
//! everything else into a failed outcome, and the validators turn their
//! own failures into a negative `ValidationResult`.

use thiserror::Error;

/// Errors that can occur during extraction operations.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Every attempt against the backend failed
    #[error("backend failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// The invoker gave up and returned its fallback mapping
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Nothing to analyze
    #[error("input text is empty")]
    EmptyInput,

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Errors returned by a text-generation backend.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Configuration error (missing API key, invalid settings)
    #[error("configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response other than a rate limit
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// HTTP 429
    #[error("rate limited")]
    RateLimited,

    /// Response carried no text content
    #[error("empty response from backend")]
    EmptyResponse,

    /// Response body could not be decoded
    #[error("parse error: {0}")]
    Parse(String),
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for backend calls.
pub type BackendResult<T> = std::result::Result<T, BackendError>;
