//! Model-based validation of records and whole extractions.
//!
//! A second backend call asks the model for a verdict
//! (`is_valid`, `confidence_score`, `reasoning`, `suggestions`). Nothing here
//! returns an error: any failure becomes a negative [`ValidationResult`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::{ExtractionError, Result};
use crate::pipeline::confidence::ConfidenceMetrics;
use crate::pipeline::invoker::ModelInvoker;
use crate::pipeline::prompts::{POST_PROCESSING_PROMPT, VALIDATION_PROMPT};
use crate::traits::backend::Backend;
use crate::types::config::PipelineConfig;
use crate::types::extraction::{ExtractionResult, ValidationStatus};
use crate::types::record::CanonicalRecord;
use crate::types::validation::{ValidationResult, ValidationType};
use crate::validation::schema::check_record;

/// Verdict fields as the model returns them. Absent fields take defaults;
/// present fields of the wrong JSON type fail deserialization.
#[derive(Debug, Deserialize)]
struct Verdict {
    is_valid: Option<bool>,
    confidence_score: Option<f64>,
    reasoning: Option<String>,
    suggestions: Option<Vec<String>>,
}

/// Asks the backend to judge extracted data.
pub struct SemanticValidator<B> {
    invoker: ModelInvoker<B>,
    max_tokens: u32,
}

impl<B> Clone for SemanticValidator<B> {
    fn clone(&self) -> Self {
        Self {
            invoker: self.invoker.clone(),
            max_tokens: self.max_tokens,
        }
    }
}

impl<B: Backend> SemanticValidator<B> {
    /// Create a validator that shares an existing invoker.
    pub fn new(invoker: ModelInvoker<B>, max_tokens: u32) -> Self {
        Self {
            invoker,
            max_tokens,
        }
    }

    /// Create a validator with its own invoker.
    pub fn from_config(backend: B, config: &PipelineConfig) -> Self {
        Self::new(ModelInvoker::new(backend, config), config.max_output_tokens)
    }

    pub fn invoker(&self) -> &ModelInvoker<B> {
        &self.invoker
    }

    /// Validate one record or a whole extraction.
    ///
    /// [`ValidationType::Extraction`] uses the per-record prompt; any other
    /// type uses the post-processing prompt.
    pub async fn validate<T: Serialize + ?Sized>(
        &self,
        subject: &T,
        validation_type: ValidationType,
    ) -> ValidationResult {
        match self.try_validate(subject, validation_type).await {
            Ok(result) => {
                info!(
                    validation_type = %validation_type,
                    is_valid = result.is_valid,
                    confidence = result.confidence_score,
                    "Validation completed"
                );
                result
            }
            Err(e) => {
                error!(validation_type = %validation_type, error = %e, "Validation failed");
                ValidationResult::failed(
                    validation_type,
                    format!("Validation failed: {e}"),
                    "Retry validation",
                )
            }
        }
    }

    async fn try_validate<T: Serialize + ?Sized>(
        &self,
        subject: &T,
        validation_type: ValidationType,
    ) -> Result<ValidationResult> {
        let prompt = match validation_type {
            ValidationType::Extraction => VALIDATION_PROMPT,
            ValidationType::PostProcessing | ValidationType::DataValidation => {
                POST_PROCESSING_PROMPT
            }
        };

        let text = serde_json::to_string(subject)?;
        let group = self.invoker.invoke(&text, prompt, self.max_tokens).await;

        if let Some(cause) = group.error {
            return Err(ExtractionError::BackendUnavailable(cause));
        }

        let verdict: Verdict = serde_json::from_value(Value::Object(group.extra))?;

        Ok(ValidationResult {
            is_valid: verdict.is_valid.unwrap_or(false),
            confidence_score: verdict.confidence_score.unwrap_or(0.0).clamp(0.0, 1.0),
            reasoning: verdict.reasoning.unwrap_or_default(),
            suggestions: verdict.suggestions.unwrap_or_default(),
            validation_type,
        })
    }

    /// Validate every record, then the extraction as a whole.
    ///
    /// Attaches a result to each record, stores the final pass in
    /// `metadata.post_validation`, moves `validation_status` to valid or
    /// invalid, and records the mean metrics score as
    /// `metadata.validated_confidence`. Failed extractions are left alone.
    pub async fn validate_full(&self, extraction: &mut ExtractionResult) {
        if extraction.is_failed() {
            warn!("Skipping validation of failed extraction");
            return;
        }

        info!(records = extraction.record_count(), "Starting full validation");

        self.validate_records(&mut extraction.variants).await;
        self.validate_records(&mut extraction.clinical_evidence).await;
        self.validate_records(&mut extraction.molecular_data).await;

        let post = self
            .validate(&*extraction, ValidationType::PostProcessing)
            .await;

        extraction.metadata.validation_status = if post.is_valid {
            ValidationStatus::Valid
        } else {
            ValidationStatus::Invalid
        };
        extraction.metadata.post_validation = Some(post);
        extraction.metadata.validated_confidence = validated_confidence(extraction);

        info!(
            status = ?extraction.metadata.validation_status,
            validated_confidence = ?extraction.metadata.validated_confidence,
            "Full validation completed"
        );
    }

    async fn validate_records<R: CanonicalRecord>(&self, records: &mut [R]) {
        for record in records.iter_mut() {
            let result = self.validate(&*record, ValidationType::Extraction).await;
            record.set_validation(result);
        }
    }
}

/// Mean [`ConfidenceMetrics`] score across all records, `None` when there
/// are no records.
pub fn validated_confidence(extraction: &ExtractionResult) -> Option<f64> {
    let mut scores = Vec::with_capacity(extraction.record_count());
    scores.extend(extraction.variants.iter().map(metrics_score));
    scores.extend(extraction.clinical_evidence.iter().map(metrics_score));
    scores.extend(extraction.molecular_data.iter().map(metrics_score));

    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}

fn metrics_score<R: CanonicalRecord>(record: &R) -> f64 {
    let issues = check_record(record).map(|m| m.len()).unwrap_or(0);
    ConfidenceMetrics::for_record(record, issues).score()
}
