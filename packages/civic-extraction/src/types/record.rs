//! Canonical records - the normalized, schema-conformant output types.
//!
//! Each kind is a fixed struct rather than an open mapping, so a field the
//! normalizer doesn't know about can never leak into the output.

use serde::{Deserialize, Serialize};

use super::validation::ValidationResult;

/// The three kinds of record the pipeline extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Variant,
    ClinicalEvidence,
    MolecularData,
}

impl RecordKind {
    /// All kinds, in extraction order.
    pub const ALL: [RecordKind; 3] = [
        RecordKind::Variant,
        RecordKind::ClinicalEvidence,
        RecordKind::MolecularData,
    ];

    /// Key of this kind's collection in JSON payloads.
    pub fn collection_key(&self) -> &'static str {
        match self {
            RecordKind::Variant => "variants",
            RecordKind::ClinicalEvidence => "clinical_evidence",
            RecordKind::MolecularData => "molecular_data",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RecordKind::Variant => "variant",
            RecordKind::ClinicalEvidence => "clinical evidence",
            RecordKind::MolecularData => "molecular data",
        };
        f.write_str(label)
    }
}

/// Reasoning trace captured by the heuristic parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReasoningTrace {
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub conclusion: String,
}

impl ReasoningTrace {
    pub fn is_empty(&self) -> bool {
        self.reasoning.is_empty() && self.action.is_empty() && self.conclusion.is_empty()
    }
}

/// A genetic variant or mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub description: String,
    pub variant_type: String,
    pub significance: String,
    pub frequency: String,
    #[serde(default)]
    pub drugs: Vec<String>,
    pub evidence_level: String,
    pub molecular_effect: String,
    pub clinical_relevance: String,
    #[serde(default)]
    pub resistance_mechanisms: Vec<String>,
    pub biomarker_status: String,
    pub confidence: f64,
    #[serde(default)]
    pub citations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<ReasoningTrace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
}

/// A clinical evidence item (trial result, diagnostic or prognostic finding).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalEvidence {
    pub description: String,
    pub evidence_type: String,
    #[serde(default)]
    pub drugs: Vec<String>,
    pub trial_phase: String,
    pub patient_population: String,
    pub line_of_therapy: String,
    pub evidence_level: String,
    /// Whether the evidence supports the association ("Supports", "Does Not Support")
    #[serde(default)]
    pub evidence_direction: String,
    pub significance: String,
    pub confidence: f64,
    #[serde(default)]
    pub supporting_data: Vec<String>,
    #[serde(default)]
    pub biomarker_requirements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<ReasoningTrace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
}

/// Molecular pathway data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MolecularData {
    pub description: String,
    pub pathway: String,
    pub mechanism: String,
    #[serde(default)]
    pub alterations: Vec<String>,
    #[serde(default)]
    pub interactions: Vec<String>,
    #[serde(default)]
    pub therapeutic_implications: Vec<String>,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<ReasoningTrace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
}

/// Shared view over the three record structs.
pub trait CanonicalRecord: Serialize {
    const KIND: RecordKind;

    fn description(&self) -> &str;
    fn confidence(&self) -> f64;

    /// Evidence level (A-D) if the kind carries one.
    fn evidence_level(&self) -> Option<&str> {
        None
    }

    /// Direction of the evidence if the kind carries one.
    fn evidence_direction(&self) -> Option<&str> {
        None
    }

    /// Whether the record cites any source.
    fn has_citations(&self) -> bool {
        false
    }

    fn trace(&self) -> Option<&ReasoningTrace>;
    fn validation(&self) -> Option<&ValidationResult>;
    fn set_validation(&mut self, validation: ValidationResult);
}

impl CanonicalRecord for Variant {
    const KIND: RecordKind = RecordKind::Variant;

    fn description(&self) -> &str {
        &self.description
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }

    fn evidence_level(&self) -> Option<&str> {
        Some(&self.evidence_level)
    }

    fn has_citations(&self) -> bool {
        !self.citations.is_empty()
    }

    fn trace(&self) -> Option<&ReasoningTrace> {
        self.trace.as_ref()
    }

    fn validation(&self) -> Option<&ValidationResult> {
        self.validation.as_ref()
    }

    fn set_validation(&mut self, validation: ValidationResult) {
        self.validation = Some(validation);
    }
}

impl CanonicalRecord for ClinicalEvidence {
    const KIND: RecordKind = RecordKind::ClinicalEvidence;

    fn description(&self) -> &str {
        &self.description
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }

    fn evidence_level(&self) -> Option<&str> {
        Some(&self.evidence_level)
    }

    fn evidence_direction(&self) -> Option<&str> {
        Some(&self.evidence_direction)
    }

    // Supporting data plays the role of citations for trial evidence.
    fn has_citations(&self) -> bool {
        !self.supporting_data.is_empty()
    }

    fn trace(&self) -> Option<&ReasoningTrace> {
        self.trace.as_ref()
    }

    fn validation(&self) -> Option<&ValidationResult> {
        self.validation.as_ref()
    }

    fn set_validation(&mut self, validation: ValidationResult) {
        self.validation = Some(validation);
    }
}

impl CanonicalRecord for MolecularData {
    const KIND: RecordKind = RecordKind::MolecularData;

    fn description(&self) -> &str {
        &self.description
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }

    fn trace(&self) -> Option<&ReasoningTrace> {
        self.trace.as_ref()
    }

    fn validation(&self) -> Option<&ValidationResult> {
        self.validation.as_ref()
    }

    fn set_validation(&mut self, validation: ValidationResult) {
        self.validation = Some(validation);
    }
}

/// One canonical record of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Variant(Variant),
    ClinicalEvidence(ClinicalEvidence),
    MolecularData(MolecularData),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Variant(_) => RecordKind::Variant,
            Record::ClinicalEvidence(_) => RecordKind::ClinicalEvidence,
            Record::MolecularData(_) => RecordKind::MolecularData,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Record::Variant(r) => r.confidence,
            Record::ClinicalEvidence(r) => r.confidence,
            Record::MolecularData(r) => r.confidence,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Record::Variant(r) => &r.description,
            Record::ClinicalEvidence(r) => &r.description,
            Record::MolecularData(r) => &r.description,
        }
    }
}
