//! Extraction pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Backend invocation with retry and backoff
//! - Dual-path response parsing (strict JSON, then line heuristics)
//! - Normalization into canonical records
//! - Per-record and aggregate confidence scoring

pub mod confidence;
pub mod extract;
pub mod invoker;
pub mod normalize;
pub mod parser;
pub mod prompts;

pub use confidence::{
    aggregate_confidence, evaluate_evidence, evaluate_trace, evaluate_validation,
    evidence_level_weight, mean_confidence, score_inputs, score_record, ConfidenceMetrics,
    EvidenceMetrics, ScoreInputs, TraceMetrics, ValidationMetrics,
};
pub use extract::{ExtractionOutcome, Extractor};
pub use invoker::{Invocation, ModelInvoker};
pub use normalize::{
    normalize_clinical_evidence, normalize_group, normalize_molecular_data, normalize_record,
    normalize_variant, NormalizedGroup,
};
pub use parser::{
    classify_line, parse_fallback, parse_response, parse_response_with_path, parse_strict,
    section_marker, ClassificationRule, ParsePath, TraceSection, CLASSIFICATION_RULES,
    SECTION_MARKERS,
};
pub use prompts::{format_request, POST_PROCESSING_PROMPT, VALIDATION_PROMPT, VARIANT_ANALYSIS_PROMPT};
