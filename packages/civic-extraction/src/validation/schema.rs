//! Rule-based schema validation of canonical records.
//!
//! Each kind has a required-field list and a field→type table. Records are
//! checked through their JSON form so the same rules apply to canonical
//! structs and to records read back from disk.

use serde_json::Value;

use crate::types::draft::is_truthy;
use crate::types::extraction::ExtractionResult;
use crate::types::record::{CanonicalRecord, RecordKind};
use crate::types::validation::{ValidationResult, ValidationType};

/// JSON type a field must have when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    /// Any JSON number
    Float,
    List,
}

impl FieldType {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Float => value.is_number(),
            FieldType::List => value.is_array(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Float => "float",
            FieldType::List => "list",
        }
    }
}

/// Required fields and declared types for one record kind.
#[derive(Debug, Clone, Copy)]
pub struct SchemaRules {
    pub required: &'static [&'static str],
    pub types: &'static [(&'static str, FieldType)],
}

pub const VARIANT_RULES: SchemaRules = SchemaRules {
    required: &["description", "variant_type", "significance"],
    types: &[
        ("description", FieldType::String),
        ("variant_type", FieldType::String),
        ("significance", FieldType::String),
        ("confidence", FieldType::Float),
        ("diseases", FieldType::List),
        ("drugs", FieldType::List),
    ],
};

pub const CLINICAL_RULES: SchemaRules = SchemaRules {
    required: &["description", "evidence_type", "significance"],
    types: &[
        ("description", FieldType::String),
        ("evidence_type", FieldType::String),
        ("significance", FieldType::String),
        ("confidence", FieldType::Float),
        ("citations", FieldType::List),
    ],
};

pub const MOLECULAR_RULES: SchemaRules = SchemaRules {
    required: &["description", "pathway", "mechanism"],
    types: &[
        ("description", FieldType::String),
        ("pathway", FieldType::String),
        ("mechanism", FieldType::String),
        ("confidence", FieldType::Float),
        ("protein_changes", FieldType::List),
        ("cellular_effects", FieldType::List),
    ],
};

pub fn rules_for(kind: RecordKind) -> &'static SchemaRules {
    match kind {
        RecordKind::Variant => &VARIANT_RULES,
        RecordKind::ClinicalEvidence => &CLINICAL_RULES,
        RecordKind::MolecularData => &MOLECULAR_RULES,
    }
}

/// Sum of required-field counts across all kinds.
pub fn total_required_fields() -> usize {
    RecordKind::ALL
        .iter()
        .map(|kind| rules_for(*kind).required.len())
        .sum()
}

/// Check one record's JSON form against its kind's rules.
///
/// Returns the issue messages; an empty list means the record is valid.
pub fn validate_record(kind: RecordKind, record: &Value) -> Vec<String> {
    let rules = rules_for(kind);
    let mut messages = Vec::new();

    for field in rules.required {
        if !record.get(field).is_some_and(is_truthy) {
            messages.push(format!("Missing required field: {field}"));
        }
    }

    for (field, expected) in rules.types {
        match record.get(field) {
            None | Some(Value::Null) => {}
            Some(value) if expected.matches(value) => {}
            Some(value) => messages.push(format!(
                "Invalid type for {field}: expected {}, got {}",
                expected.name(),
                json_type_name(value)
            )),
        }
    }

    messages
}

/// Check a canonical record.
pub fn check_record<R: CanonicalRecord>(record: &R) -> serde_json::Result<Vec<String>> {
    Ok(validate_record(R::KIND, &serde_json::to_value(record)?))
}

/// Validates whole extractions against the schema rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate every record of every kind.
    pub fn validate(&self, extraction: &ExtractionResult) -> ValidationResult {
        match self.try_validate(extraction) {
            Ok(result) => {
                tracing::info!(
                    is_valid = result.is_valid,
                    confidence = result.confidence_score,
                    issues = result.reasoning.lines().count(),
                    "Schema validation completed"
                );
                result
            }
            Err(e) => {
                tracing::error!(error = %e, "Schema validation failed");
                ValidationResult::failed(
                    ValidationType::DataValidation,
                    format!("Validation error: {e}"),
                    "Check data structure",
                )
            }
        }
    }

    /// Validate and store the result in `metadata.schema_validation`.
    pub fn annotate<'a>(&self, extraction: &'a mut ExtractionResult) -> &'a ValidationResult {
        let result = self.validate(extraction);
        extraction.metadata.schema_validation.insert(result)
    }

    fn try_validate(&self, extraction: &ExtractionResult) -> serde_json::Result<ValidationResult> {
        let mut messages = Vec::new();
        collect(&extraction.variants, &mut messages)?;
        collect(&extraction.clinical_evidence, &mut messages)?;
        collect(&extraction.molecular_data, &mut messages)?;

        let completeness = top_level_completeness(extraction)?;
        let confidence = (1.0 - 0.1 * messages.len() as f64) * completeness;

        Ok(ValidationResult {
            is_valid: messages.is_empty(),
            confidence_score: confidence.clamp(0.0, 1.0),
            reasoning: messages.join("\n"),
            suggestions: suggestions(&messages),
            validation_type: ValidationType::DataValidation,
        })
    }
}

fn collect<R: CanonicalRecord>(records: &[R], messages: &mut Vec<String>) -> serde_json::Result<()> {
    for record in records {
        messages.extend(check_record(record)?);
    }
    Ok(())
}

/// Non-null top-level fields (minus `raw_text` and `metadata`) over the
/// total required-field count.
fn top_level_completeness(extraction: &ExtractionResult) -> serde_json::Result<f64> {
    let filled = match serde_json::to_value(extraction)? {
        Value::Object(map) => map
            .iter()
            .filter(|(key, value)| *key != "raw_text" && *key != "metadata" && !value.is_null())
            .count(),
        _ => 0,
    };
    Ok(filled as f64 / total_required_fields() as f64)
}

/// Group issue messages into remediation hints.
pub fn suggestions(messages: &[String]) -> Vec<String> {
    let missing: Vec<&str> = messages
        .iter()
        .filter_map(|m| m.strip_prefix("Missing required field: "))
        .collect();
    let invalid: Vec<&str> = messages
        .iter()
        .filter_map(|m| m.strip_prefix("Invalid type for "))
        .filter_map(|rest| rest.split(':').next())
        .collect();

    let mut suggestions = Vec::new();
    if !missing.is_empty() {
        suggestions.push(format!("Add missing required fields: {}", missing.join(", ")));
    }
    if !invalid.is_empty() {
        suggestions.push(format!("Fix data types for: {}", invalid.join(", ")));
    }
    if suggestions.is_empty() {
        suggestions.push("No improvements needed".to_string());
    }
    suggestions
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
