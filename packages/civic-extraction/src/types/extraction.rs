//! Core extraction types - the output of the extraction pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{ClinicalEvidence, MolecularData, RecordKind, Variant};
use super::validation::ValidationResult;

/// Lifecycle of an extraction's validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// Created but not yet processed.
    #[default]
    Pending,

    /// Records extracted and scored, not yet validated.
    Processed,

    /// The post-processing validation pass accepted the extraction.
    Valid,

    /// The post-processing validation pass rejected the extraction.
    Invalid,

    /// The pipeline could not produce an extraction.
    Failed,
}

/// Confidence per record kind plus the mean across kinds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidenceScores {
    pub variants: f64,
    pub clinical: f64,
    pub molecular: f64,
    pub overall: f64,
}

/// Processing metadata attached to every extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    pub timestamp: DateTime<Utc>,

    /// Model identifier that produced the analysis
    pub source: String,

    /// Input length in characters
    pub text_length: usize,

    /// Wall time of the extraction in seconds
    pub processing_time: f64,

    pub validation_status: ValidationStatus,

    pub confidence_scores: ConfidenceScores,

    /// Mean metrics-based confidence across records, set by the full
    /// semantic validation pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated_confidence: Option<f64>,

    /// Result of the rule-based schema check, when run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_validation: Option<ValidationResult>,

    /// Result of the post-processing semantic check, when run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_validation: Option<ValidationResult>,

    /// Why the extraction failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionMetadata {
    pub fn new(source: impl Into<String>, text_length: usize) -> Self {
        Self {
            timestamp: Utc::now(),
            source: source.into(),
            text_length,
            processing_time: 0.0,
            validation_status: ValidationStatus::Pending,
            confidence_scores: ConfidenceScores::default(),
            validated_confidence: None,
            schema_validation: None,
            post_validation: None,
            error: None,
        }
    }
}

/// One structured snapshot of a document.
///
/// Owned by the extractor for the duration of a run; validators annotate it
/// in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub variants: Vec<Variant>,

    #[serde(default)]
    pub clinical_evidence: Vec<ClinicalEvidence>,

    #[serde(default)]
    pub molecular_data: Vec<MolecularData>,

    /// The input text the extraction was made from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,

    pub metadata: ExtractionMetadata,
}

impl ExtractionResult {
    /// An empty extraction with fresh metadata.
    pub fn new(source: impl Into<String>, text_length: usize) -> Self {
        Self {
            variants: Vec::new(),
            clinical_evidence: Vec::new(),
            molecular_data: Vec::new(),
            raw_text: None,
            metadata: ExtractionMetadata::new(source, text_length),
        }
    }

    /// The minimal failure-state extraction: no records, zero confidence.
    pub fn failed(source: impl Into<String>, text_length: usize, error: impl Into<String>) -> Self {
        let mut result = Self::new(source, text_length);
        result.metadata.validation_status = ValidationStatus::Failed;
        result.metadata.error = Some(error.into());
        result
    }

    pub fn is_failed(&self) -> bool {
        self.metadata.validation_status == ValidationStatus::Failed
    }

    /// Number of records of one kind.
    pub fn count(&self, kind: RecordKind) -> usize {
        match kind {
            RecordKind::Variant => self.variants.len(),
            RecordKind::ClinicalEvidence => self.clinical_evidence.len(),
            RecordKind::MolecularData => self.molecular_data.len(),
        }
    }

    /// Total number of records.
    pub fn record_count(&self) -> usize {
        RecordKind::ALL.iter().map(|kind| self.count(*kind)).sum()
    }

    /// Overall confidence (0.0 for failed extractions).
    pub fn overall_confidence(&self) -> f64 {
        self.metadata.confidence_scores.overall
    }

    /// Descriptions of one kind, in order.
    pub fn descriptions(&self, kind: RecordKind) -> Vec<&str> {
        match kind {
            RecordKind::Variant => self.variants.iter().map(|r| r.description.as_str()).collect(),
            RecordKind::ClinicalEvidence => self
                .clinical_evidence
                .iter()
                .map(|r| r.description.as_str())
                .collect(),
            RecordKind::MolecularData => self
                .molecular_data
                .iter()
                .map(|r| r.description.as_str())
                .collect(),
        }
    }
}
