//! Anthropic Messages API implementation of the Backend trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use civic_extraction::backend::AnthropicBackend;
//!
//! let backend = AnthropicBackend::from_env()?;
//! let extractor = Extractor::new(backend, PipelineConfig::default());
//! ```

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BackendError, BackendResult};
use crate::security::credentials::BackendCredentials;
use crate::traits::backend::Backend;

/// Backend that talks to `{base_url}/v1/messages`.
#[derive(Clone, Debug)]
pub struct AnthropicBackend {
    client: Client,
    credentials: BackendCredentials,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicBackend {
    /// Create a backend with the given API key and default endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_credentials(BackendCredentials::new(api_key))
    }

    pub fn with_credentials(credentials: BackendCredentials) -> Self {
        Self {
            client: Client::new(),
            credentials,
        }
    }

    /// Create from `ANTHROPIC_API_KEY` (and optional `ANTHROPIC_BASE_URL`).
    pub fn from_env() -> BackendResult<Self> {
        Ok(Self::with_credentials(BackendCredentials::from_env()?))
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.credentials = self.credentials.with_base_url(url);
        self
    }

    /// Set the `anthropic-version` header value.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.credentials = self.credentials.with_api_version(version);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.credentials.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url())
    }
}

#[async_trait]
impl Backend for AnthropicBackend {
    async fn complete(&self, model: &str, max_tokens: u32, prompt: &str) -> BackendResult<String> {
        let start = std::time::Instant::now();
        let request = build_request(model, max_tokens, prompt);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", self.credentials.api_key())
            .header("anthropic-version", &self.credentials.api_version)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Anthropic request failed");
                BackendError::Network(e.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Anthropic rate limit hit");
            return Err(BackendError::RateLimited);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Anthropic API error");
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;

        debug!(
            model = %model,
            duration_ms = start.elapsed().as_millis() as u64,
            "Anthropic message completion"
        );

        response_text(body)
    }
}

fn build_request<'a>(model: &'a str, max_tokens: u32, prompt: &'a str) -> MessagesRequest<'a> {
    MessagesRequest {
        model,
        max_tokens,
        messages: [Message {
            role: "user",
            content: prompt,
        }],
    }
}

/// Concatenate the text blocks of a response.
fn response_text(body: MessagesResponse) -> BackendResult<String> {
    let text: String = body
        .content
        .into_iter()
        .filter(|block| block.block_type == "text")
        .filter_map(|block| block.text)
        .collect();

    if text.is_empty() {
        return Err(BackendError::EmptyResponse);
    }
    Ok(text)
}
