//! The persisted output artifact: records, metadata and run statistics.

use serde::{Deserialize, Serialize};

use super::extraction::{ExtractionMetadata, ExtractionResult};
use super::record::{ClinicalEvidence, MolecularData, RecordKind, Variant};

/// Summary statistics for one processed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// End-to-end processing time in seconds
    pub processing_time: f64,
    pub text_length: usize,
    pub num_variants: usize,
    pub num_clinical_evidence: usize,
    pub num_molecular_data: usize,
    pub overall_confidence: f64,
}

/// JSON-serializable snapshot written once per input document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub variants: Vec<Variant>,
    pub clinical_evidence: Vec<ClinicalEvidence>,
    pub molecular_data: Vec<MolecularData>,
    pub metadata: ExtractionMetadata,
    pub stats: ProcessingStats,
}

impl ExtractionReport {
    /// Build the report from a finished extraction.
    ///
    /// `processing_time` covers the whole run (extraction plus any
    /// validation), so it can exceed the extractor's own timing.
    pub fn new(result: ExtractionResult, processing_time: f64) -> Self {
        let stats = ProcessingStats {
            processing_time,
            text_length: result.metadata.text_length,
            num_variants: result.count(RecordKind::Variant),
            num_clinical_evidence: result.count(RecordKind::ClinicalEvidence),
            num_molecular_data: result.count(RecordKind::MolecularData),
            overall_confidence: result.overall_confidence(),
        };

        Self {
            variants: result.variants,
            clinical_evidence: result.clinical_evidence,
            molecular_data: result.molecular_data,
            metadata: result.metadata,
            stats,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
