//! Command-line runner for the CIViC extraction pipeline.
//!
//! Reads an already-extracted plain-text paper, runs extraction (and
//! optionally validation), writes the JSON report and prints a summary.

mod config;
mod summary;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use civic_extraction::{
    AnthropicBackend, ExtractionReport, Extractor, PipelineConfig, RetryPolicy, SchemaValidator,
    SemanticValidator,
};

#[derive(Parser)]
#[command(name = "civic-extract")]
#[command(about = "Extract CIViC variant evidence from a paper's text")]
struct Args {
    /// Plain-text file with the paper's content
    input: PathBuf,

    /// Report path (default: analysis_<input stem>.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run schema and semantic validation after extraction
    #[arg(long)]
    validate: bool,

    /// Model identifier (overrides CIVIC_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Output token limit per backend call (overrides CIVIC_MAX_TOKENS)
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Attempts per backend call (overrides CIVIC_MAX_RETRIES)
    #[arg(long)]
    max_retries: Option<u32>,

    /// Leave the input text out of the report
    #[arg(long)]
    no_raw_text: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Apply flag overrides on top of the environment config.
    fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_output_tokens = max_tokens;
        }
        if let Some(max_retries) = self.max_retries {
            config.retry = RetryPolicy::new(max_retries, config.retry.base_delay());
        }
        if self.no_raw_text {
            config.include_raw_text = false;
        }
        config
    }

    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.input))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (development)
    let _ = dotenv();

    let args = Args::parse();
    init_tracing(args.verbose);

    let config = args.apply(config::from_env()?);
    let output = args.output_path();

    summary::print_banner();
    tracing::info!(input = %args.input.display(), model = %config.model, "Processing document");

    let started = Instant::now();

    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    tracing::info!(characters = text.chars().count(), "Loaded document text");

    let backend = AnthropicBackend::from_env().context("Backend configuration failed")?;
    tracing::debug!(base_url = backend.base_url(), "Using Anthropic backend");
    let extractor = Extractor::new(backend, config.clone());

    let outcome = extractor.extract(&text).await;
    if let Some(error) = outcome.error() {
        tracing::warn!(error = %error, "Extraction failed, writing empty report");
    }
    let mut result = outcome.into_result();

    if args.validate && !result.is_failed() {
        let schema = SchemaValidator::new().annotate(&mut result);
        tracing::info!(
            is_valid = schema.is_valid,
            confidence = schema.confidence_score,
            "Schema check finished"
        );

        SemanticValidator::new(extractor.invoker().clone(), config.max_output_tokens)
            .validate_full(&mut result)
            .await;
    }

    let report = ExtractionReport::new(result, started.elapsed().as_secs_f64());
    write_report(&report, &output)?;
    tracing::info!(output = %output.display(), "Saved results");

    summary::print_report(&report, &output);

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "debug"
    } else {
        "info,civic_extraction=debug"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// `analysis_<stem>.json` in the current directory.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    PathBuf::from(format!("analysis_{stem}.json"))
}

fn write_report(report: &ExtractionReport, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let json = report.to_json().context("Failed to serialize report")?;
    fs::write(output, json).with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}
