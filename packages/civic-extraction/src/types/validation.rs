//! Validation result types shared by the schema and semantic validators.

use serde::{Deserialize, Serialize};

/// Which validation pass produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationType {
    /// Model-based check of a single record
    #[serde(rename = "extraction")]
    Extraction,

    /// Model-based check of the whole extraction
    #[serde(rename = "post-processing")]
    PostProcessing,

    /// Rule-based schema check
    #[serde(rename = "data_validation")]
    DataValidation,
}

impl std::fmt::Display for ValidationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ValidationType::Extraction => "extraction",
            ValidationType::PostProcessing => "post-processing",
            ValidationType::DataValidation => "data_validation",
        };
        f.write_str(label)
    }
}

/// Outcome of one validation call.
///
/// Produced fresh by every call and never merged with another result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,

    /// Confidence in the validated data (0.0 to 1.0)
    pub confidence_score: f64,

    pub reasoning: String,

    /// Remediation hints, most important first
    #[serde(default)]
    pub suggestions: Vec<String>,

    pub validation_type: ValidationType,
}

impl ValidationResult {
    /// A negative result carrying a diagnostic reason.
    pub fn failed(
        validation_type: ValidationType,
        reasoning: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            is_valid: false,
            confidence_score: 0.0,
            reasoning: reasoning.into(),
            suggestions: vec![suggestion.into()],
            validation_type,
        }
    }
}
