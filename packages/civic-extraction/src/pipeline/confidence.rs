//! Confidence scoring.
//!
//! Three entry points:
//!
//! - [`score_record`]: bounded per-record score from a draft's completeness,
//!   evidence level and supporting data.
//! - [`aggregate_confidence`]: mean per kind, then the unweighted mean of
//!   the three kind means. An empty kind contributes 0.0 to `overall`.
//! - [`ConfidenceMetrics`]: ten-factor weighted score used once validation
//!   results are available. Never written back over a record's own
//!   `confidence`.

use serde::{Deserialize, Serialize};

use crate::types::draft::{DraftFields, DraftRecord};
use crate::types::extraction::{ConfidenceScores, ExtractionResult};
use crate::types::record::{CanonicalRecord, ReasoningTrace};
use crate::types::validation::ValidationResult;

/// Descriptive fields counted for completeness.
pub const SCORED_FIELDS: [&str; 6] = [
    "name",
    "type",
    "significance",
    "evidence_level",
    "molecular_effect",
    "clinical_relevance",
];

const COMPLETENESS_WEIGHT: f64 = 0.3;
const EVIDENCE_WEIGHT: f64 = 0.5;
const SUPPORT_WEIGHT: f64 = 0.2;

/// Supporting items beyond this count add nothing.
const SUPPORT_CEILING: f64 = 3.0;

/// Weight of an evidence level (case-insensitive).
///
/// A: multiple high-quality trials, B: single high-quality trial,
/// C: multiple lower-quality studies, D: case reports or expert opinion.
pub fn evidence_level_weight(level: &str) -> f64 {
    match level.trim().to_ascii_uppercase().as_str() {
        "A" => 1.0,
        "B" => 0.8,
        "C" => 0.6,
        "D" => 0.4,
        _ => 0.2,
    }
}

/// The three weighted inputs of the per-record score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    /// Fraction of [`SCORED_FIELDS`] present
    pub completeness: f64,

    /// [`evidence_level_weight`] of the record's evidence level
    pub evidence_weight: f64,

    /// Number of supporting data items
    pub supporting_count: usize,
}

impl ScoreInputs {
    pub fn from_draft(draft: &DraftRecord) -> Self {
        let present = SCORED_FIELDS
            .iter()
            .filter(|field| draft.has_value(field))
            .count();

        Self {
            completeness: present as f64 / SCORED_FIELDS.len() as f64,
            evidence_weight: evidence_level_weight(&draft.text("evidence_level")),
            supporting_count: draft.list_len("supporting_data"),
        }
    }
}

/// Weighted per-record score, rounded to 2 decimals and bounded to [0, 1].
pub fn score_inputs(inputs: &ScoreInputs) -> f64 {
    let support = (inputs.supporting_count as f64 / SUPPORT_CEILING).min(1.0);
    let score = inputs.completeness * COMPLETENESS_WEIGHT
        + inputs.evidence_weight * EVIDENCE_WEIGHT
        + support * SUPPORT_WEIGHT;

    round_to(score.clamp(0.0, 1.0), 2)
}

/// Score a draft record.
pub fn score_record(draft: &DraftRecord) -> f64 {
    score_inputs(&ScoreInputs::from_draft(draft))
}

/// Arithmetic mean of record confidences (0.0 when empty).
pub fn mean_confidence<R: CanonicalRecord>(records: &[R]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().map(|r| r.confidence()).sum::<f64>() / records.len() as f64
}

/// Per-kind means and their unweighted overall mean.
pub fn aggregate_confidence(extraction: &ExtractionResult) -> ConfidenceScores {
    let variants = mean_confidence(&extraction.variants);
    let clinical = mean_confidence(&extraction.clinical_evidence);
    let molecular = mean_confidence(&extraction.molecular_data);

    ConfidenceScores {
        variants,
        clinical,
        molecular,
        overall: (variants + clinical + molecular) / 3.0,
    }
}

/// Ten-factor breakdown of confidence, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceMetrics {
    // Evidence
    pub evidence_strength: f64,
    pub evidence_consistency: f64,
    pub evidence_quality: f64,

    // Data quality
    pub data_completeness: f64,
    pub data_consistency: f64,

    // Validation
    pub extraction_confidence: f64,
    pub validation_score: f64,

    // Reasoning trace
    pub reasoning_confidence: f64,
    pub action_confidence: f64,
    pub conclusion_confidence: f64,
}

impl ConfidenceMetrics {
    /// Build metrics for a canonical record.
    ///
    /// `schema_issues` is the number of schema messages the record produced;
    /// each one costs 0.1 of data consistency.
    pub fn for_record<R: CanonicalRecord>(record: &R, schema_issues: usize) -> Self {
        let evidence = evaluate_evidence(
            record.evidence_level(),
            record.evidence_direction(),
            record.has_citations(),
            record.validation().is_some(),
        );
        let trace = evaluate_trace(record.trace());
        let validation = evaluate_validation(record.validation());

        Self {
            evidence_strength: evidence.strength,
            evidence_consistency: evidence.consistency,
            evidence_quality: evidence.quality,
            data_completeness: data_completeness(record),
            data_consistency: (1.0 - 0.1 * schema_issues as f64).max(0.0),
            extraction_confidence: validation.extraction_confidence,
            validation_score: validation.validation_score,
            reasoning_confidence: trace.reasoning,
            action_confidence: trace.action,
            conclusion_confidence: trace.conclusion,
        }
    }

    /// Weighted sum, rounded to 3 decimals and capped at 1.0.
    ///
    /// The evidence-strength weight is doubled, so the weights total 1.1.
    pub fn score(&self) -> f64 {
        let weighted = [
            (self.evidence_strength, 0.2),
            (self.evidence_consistency, 0.1),
            (self.evidence_quality, 0.1),
            (self.data_completeness, 0.1),
            (self.data_consistency, 0.1),
            (self.extraction_confidence, 0.1),
            (self.validation_score, 0.1),
            (self.reasoning_confidence, 0.1),
            (self.action_confidence, 0.1),
            (self.conclusion_confidence, 0.1),
        ];

        let score: f64 = weighted.iter().map(|(value, weight)| value * weight).sum();
        round_to(score.clamp(0.0, 1.0), 3)
    }
}

/// Evidence sub-scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvidenceMetrics {
    pub strength: f64,
    pub consistency: f64,
    pub quality: f64,
}

pub fn evaluate_evidence(
    evidence_level: Option<&str>,
    direction: Option<&str>,
    has_citations: bool,
    has_validation: bool,
) -> EvidenceMetrics {
    let strength = match evidence_level
        .map(|l| l.trim().to_ascii_uppercase())
        .as_deref()
    {
        Some("A") | Some("B") => 0.8,
        Some("C") => 0.6,
        Some("D") => 0.4,
        _ => 0.2,
    };

    // "Supports" from the analysis prompt and "Supportive" both count.
    let supportive = direction.is_some_and(|d| {
        let d = d.trim().to_ascii_lowercase();
        d.starts_with("support")
    });

    EvidenceMetrics {
        strength,
        consistency: if supportive { 0.8 } else { 0.4 },
        quality: if has_citations && has_validation { 0.8 } else { 0.4 },
    }
}

/// Reasoning-trace sub-scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceMetrics {
    pub reasoning: f64,
    pub action: f64,
    pub conclusion: f64,
}

pub fn evaluate_trace(trace: Option<&ReasoningTrace>) -> TraceMetrics {
    let present = |s: Option<&String>| if s.is_some_and(|s| !s.is_empty()) { 0.8 } else { 0.2 };

    TraceMetrics {
        reasoning: present(trace.map(|t| &t.reasoning)),
        action: present(trace.map(|t| &t.action)),
        conclusion: present(trace.map(|t| &t.conclusion)),
    }
}

/// Validation sub-scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationMetrics {
    pub extraction_confidence: f64,
    pub validation_score: f64,
}

pub fn evaluate_validation(validation: Option<&ValidationResult>) -> ValidationMetrics {
    match validation {
        None => ValidationMetrics {
            extraction_confidence: 0.5,
            validation_score: 0.5,
        },
        Some(v) => ValidationMetrics {
            extraction_confidence: v.confidence_score.clamp(0.0, 1.0),
            validation_score: if v.is_valid { 0.8 } else { 0.2 },
        },
    }
}

/// Fraction of a record's text fields that are non-empty.
fn data_completeness<R: CanonicalRecord>(record: &R) -> f64 {
    let Ok(serde_json::Value::Object(fields)) = serde_json::to_value(record) else {
        return 0.0;
    };

    let texts: Vec<&str> = fields.values().filter_map(|v| v.as_str()).collect();
    if texts.is_empty() {
        return 0.0;
    }
    texts.iter().filter(|t| !t.trim().is_empty()).count() as f64 / texts.len() as f64
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
