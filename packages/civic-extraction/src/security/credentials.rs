//! Credential handling with secure memory.
//!
//! Uses the `secrecy` crate to prevent accidental logging of API keys.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use crate::error::{BackendError, BackendResult};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Connection settings for a hosted backend.
///
/// The API key never shows up in `Debug` output.
#[derive(Clone)]
pub struct BackendCredentials {
    api_key: SecretString,

    /// API base URL, without a trailing `/v1`
    pub base_url: String,

    /// Value of the `anthropic-version` header
    pub api_version: String,
}

impl BackendCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Read `ANTHROPIC_API_KEY` and, if set, `ANTHROPIC_BASE_URL`.
    pub fn from_env() -> BackendResult<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| BackendError::Config("ANTHROPIC_API_KEY not set".into()))?;
        if api_key.trim().is_empty() {
            return Err(BackendError::Config("ANTHROPIC_API_KEY is empty".into()));
        }

        let mut credentials = Self::new(api_key);
        if let Ok(url) = std::env::var("ANTHROPIC_BASE_URL") {
            credentials = credentials.with_base_url(url);
        }
        Ok(credentials)
    }

    /// Set a custom base URL (for proxies, gateways, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Expose the API key.
    ///
    /// Only call this when building a request.
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

impl fmt::Debug for BackendCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendCredentials")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .finish()
    }
}
