//! The Extractor - main entry point for turning text into an extraction.
//!
//! One call runs the whole flow:
//!
//! ```text
//! text → ModelInvoker → parse_response → normalize_group → aggregate_confidence
//! ```
//!
//! Validation is a separate, optional step (see [`crate::validation`]).

use std::time::Instant;

use tracing::{debug, error, info};

use crate::error::{ExtractionError, Result};
use crate::pipeline::confidence::aggregate_confidence;
use crate::pipeline::invoker::ModelInvoker;
use crate::pipeline::normalize::normalize_group;
use crate::pipeline::parser::parse_response_with_path;
use crate::pipeline::prompts::VARIANT_ANALYSIS_PROMPT;
use crate::traits::backend::Backend;
use crate::types::config::PipelineConfig;
use crate::types::extraction::{ExtractionResult, ValidationStatus};

/// Result of [`Extractor::extract`].
///
/// Both arms carry a well-formed [`ExtractionResult`]; a failed extraction
/// has no records, zero confidence and `validation_status = failed`.
#[derive(Debug)]
#[must_use]
pub enum ExtractionOutcome {
    Completed(ExtractionResult),
    Failed {
        result: ExtractionResult,
        error: ExtractionError,
    },
}

impl ExtractionOutcome {
    /// The extraction, whichever arm.
    pub fn result(&self) -> &ExtractionResult {
        match self {
            ExtractionOutcome::Completed(result) | ExtractionOutcome::Failed { result, .. } => {
                result
            }
        }
    }

    pub fn into_result(self) -> ExtractionResult {
        match self {
            ExtractionOutcome::Completed(result) | ExtractionOutcome::Failed { result, .. } => {
                result
            }
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ExtractionOutcome::Failed { .. })
    }

    /// Why the extraction failed, if it did.
    pub fn error(&self) -> Option<&ExtractionError> {
        match self {
            ExtractionOutcome::Completed(_) => None,
            ExtractionOutcome::Failed { error, .. } => Some(error),
        }
    }
}

/// Orchestrates a single document extraction.
///
/// # Example
///
/// ```rust,ignore
/// let extractor = Extractor::new(AnthropicBackend::from_env()?, PipelineConfig::default());
///
/// let outcome = extractor.extract(&paper_text).await;
/// println!("overall confidence: {}", outcome.result().overall_confidence());
/// ```
pub struct Extractor<B> {
    invoker: ModelInvoker<B>,
    config: PipelineConfig,
}

impl<B: Backend> Extractor<B> {
    /// Create a new extractor.
    pub fn new(backend: B, config: PipelineConfig) -> Self {
        let invoker = ModelInvoker::new(backend, &config);
        Self { invoker, config }
    }

    /// Create an extractor around an existing invoker.
    ///
    /// Lets the extractor share one backend with a
    /// [`SemanticValidator`](crate::validation::SemanticValidator).
    pub fn with_invoker(invoker: ModelInvoker<B>, config: PipelineConfig) -> Self {
        Self { invoker, config }
    }

    pub fn invoker(&self) -> &ModelInvoker<B> {
        &self.invoker
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Extract variants, clinical evidence and molecular data from `text`.
    ///
    /// Never returns an error: every failure becomes
    /// [`ExtractionOutcome::Failed`] with the minimal failed extraction.
    pub async fn extract(&self, text: &str) -> ExtractionOutcome {
        let started = Instant::now();
        let text_length = text.chars().count();

        info!(text_length, model = %self.config.model, "Starting CIViC data extraction");

        match self.run(text, text_length, started).await {
            Ok(result) => {
                info!(
                    variants = result.variants.len(),
                    clinical_evidence = result.clinical_evidence.len(),
                    molecular_data = result.molecular_data.len(),
                    overall_confidence = result.overall_confidence(),
                    processing_time = result.metadata.processing_time,
                    "Extraction completed"
                );
                ExtractionOutcome::Completed(result)
            }
            Err(error) => {
                error!(error = %error, "Extraction failed");
                let result =
                    ExtractionResult::failed(&self.config.model, text_length, error.to_string());
                ExtractionOutcome::Failed { result, error }
            }
        }
    }

    async fn run(&self, text: &str, text_length: usize, started: Instant) -> Result<ExtractionResult> {
        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyInput);
        }

        let response = self
            .invoker
            .complete(text, VARIANT_ANALYSIS_PROMPT, self.config.max_output_tokens)
            .await
            .into_result()?;

        let (drafts, path) = parse_response_with_path(&response);
        debug!(?path, drafts = drafts.len(), "Parsed backend response");

        let normalized = normalize_group(&drafts);

        let mut result = ExtractionResult::new(&self.config.model, text_length);
        result.variants = normalized.variants;
        result.clinical_evidence = normalized.clinical_evidence;
        result.molecular_data = normalized.molecular_data;
        if self.config.include_raw_text {
            result.raw_text = Some(text.to_string());
        }

        result.metadata.confidence_scores = aggregate_confidence(&result);
        result.metadata.validation_status = ValidationStatus::Processed;
        result.metadata.processing_time = started.elapsed().as_secs_f64();

        Ok(result)
    }
}
