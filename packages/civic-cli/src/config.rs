use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use civic_extraction::{PipelineConfig, RetryPolicy};

/// Pipeline settings from `CIVIC_*` environment variables.
///
/// Unset variables keep the library defaults.
pub fn from_env() -> Result<PipelineConfig> {
    from_lookup(|key| env::var(key).ok())
}

/// Same as [`from_env`], reading variables through `lookup`.
pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::default();

    if let Some(model) = lookup("CIVIC_MODEL").filter(|m| !m.trim().is_empty()) {
        config.model = model;
    }
    if let Some(max_tokens) = lookup("CIVIC_MAX_TOKENS") {
        config.max_output_tokens = max_tokens
            .trim()
            .parse()
            .context("CIVIC_MAX_TOKENS must be a positive integer")?;
    }

    let mut max_attempts = config.retry.max_attempts;
    let mut base_delay = config.retry.base_delay();
    if let Some(retries) = lookup("CIVIC_MAX_RETRIES") {
        max_attempts = retries
            .trim()
            .parse()
            .context("CIVIC_MAX_RETRIES must be a positive integer")?;
    }
    if let Some(delay) = lookup("CIVIC_BASE_DELAY_MS") {
        base_delay = Duration::from_millis(
            delay
                .trim()
                .parse()
                .context("CIVIC_BASE_DELAY_MS must be a number of milliseconds")?,
        );
    }
    config.retry = RetryPolicy::new(max_attempts, base_delay);

    Ok(config)
}
