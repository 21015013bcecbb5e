//! CIViC Evidence Extraction Library
//!
//! Turns the text of a biomedical paper into structured, confidence-scored
//! records of genetic variants, clinical evidence and molecular pathway data,
//! using a text-generation backend.
//!
//! # Design Philosophy
//!
//! **"Always return a value"**
//!
//! - Backend failures are retried with exponential backoff
//! - Malformed responses fall back to line heuristics instead of failing
//! - Missing fields get named defaults instead of errors
//! - A failed document yields a well-formed, empty extraction
//!
//! # Usage
//!
//! ```rust,ignore
//! use civic_extraction::{Extractor, PipelineConfig, SchemaValidator, SemanticValidator};
//! use civic_extraction::backend::AnthropicBackend;
//!
//! let config = PipelineConfig::default();
//! let extractor = Extractor::new(AnthropicBackend::from_env()?, config.clone());
//!
//! let mut result = extractor.extract(&paper_text).await.into_result();
//!
//! // Optional second pass
//! SchemaValidator::new().annotate(&mut result);
//! let validator = SemanticValidator::new(extractor.invoker().clone(), config.max_output_tokens);
//! validator.validate_full(&mut result).await;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - The `Backend` abstraction
//! - [`types`] - Draft records, canonical records, results and reports
//! - [`pipeline`] - Invocation, parsing, normalization and confidence scoring
//! - [`validation`] - Schema and semantic validation
//! - [`backend`] - Reference Anthropic backend
//! - [`security`] - Credential handling
//! - [`testing`] - Mock backend for testing

pub mod backend;
pub mod error;
pub mod pipeline;
pub mod security;
pub mod testing;
pub mod traits;
pub mod types;
pub mod validation;

// Re-export core types at crate root
pub use error::{BackendError, BackendResult, ExtractionError, Result};
pub use traits::backend::Backend;
pub use types::{
    config::{PipelineConfig, RetryPolicy, DEFAULT_MODEL},
    draft::{DraftFields, DraftGroup, DraftRecord},
    extraction::{ConfidenceScores, ExtractionMetadata, ExtractionResult, ValidationStatus},
    record::{
        CanonicalRecord, ClinicalEvidence, MolecularData, ReasoningTrace, Record, RecordKind,
        Variant,
    },
    report::{ExtractionReport, ProcessingStats},
    validation::{ValidationResult, ValidationType},
};

// Re-export pipeline components
pub use pipeline::{
    // Orchestration
    ExtractionOutcome, Extractor, Invocation, ModelInvoker,
    // Parsing and normalization
    normalize_group, parse_response, NormalizedGroup, ParsePath,
    // Confidence
    aggregate_confidence, score_record, ConfidenceMetrics,
};

// Re-export validators
pub use validation::{SchemaValidator, SemanticValidator};

#[cfg(feature = "anthropic")]
pub use backend::AnthropicBackend;

pub use security::BackendCredentials;

// Re-export testing utilities
pub use testing::MockBackend;
