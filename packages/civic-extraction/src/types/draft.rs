//! Draft records - unvalidated model output before normalization.

use serde::Serialize;
use serde_json::{Map, Value};

use super::record::RecordKind;

/// A loosely-typed extraction item straight from the model.
///
/// Usually an object, but list items are kept exactly as the backend sent
/// them: a bare string such as `"BRAF V600E"` stays a string, and reads as
/// its own `description`. The normalizer decides what survives.
pub type DraftRecord = Value;

/// Draft records grouped by kind, plus whatever else the response carried.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DraftGroup {
    pub variants: Vec<DraftRecord>,
    pub clinical_evidence: Vec<DraftRecord>,
    pub molecular_data: Vec<DraftRecord>,

    /// Cleaned response text (fallback path only)
    pub raw_text: String,

    /// Set only on the fallback mapping after retries are exhausted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Top-level keys that are not record collections.
    ///
    /// Validation responses land here (`is_valid`, `confidence_score`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DraftGroup {
    /// The fixed empty-but-well-formed mapping returned when the backend
    /// could not be reached.
    pub fn fallback() -> Self {
        Self {
            error: Some("Analysis failed".to_string()),
            ..Default::default()
        }
    }

    /// Whether this is the exhausted-retries fallback.
    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }

    /// Drafts of one kind.
    pub fn records(&self, kind: RecordKind) -> &[DraftRecord] {
        match kind {
            RecordKind::Variant => &self.variants,
            RecordKind::ClinicalEvidence => &self.clinical_evidence,
            RecordKind::MolecularData => &self.molecular_data,
        }
    }

    /// Mutable drafts of one kind.
    pub fn records_mut(&mut self, kind: RecordKind) -> &mut Vec<DraftRecord> {
        match kind {
            RecordKind::Variant => &mut self.variants,
            RecordKind::ClinicalEvidence => &mut self.clinical_evidence,
            RecordKind::MolecularData => &mut self.molecular_data,
        }
    }

    /// Append a draft to its kind's list.
    pub fn push(&mut self, kind: RecordKind, record: DraftRecord) {
        self.records_mut(kind).push(record);
    }

    /// Total number of drafts across all kinds.
    pub fn len(&self) -> usize {
        self.variants.len() + self.clinical_evidence.len() + self.molecular_data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lenient field access over a draft record.
///
/// Missing or oddly-shaped values never fail; they degrade to empty
/// strings and lists.
pub trait DraftFields {
    /// Field as text. Scalars are stringified, containers are JSON-encoded.
    fn text(&self, key: &str) -> String;

    /// First non-empty text among aliased keys, or `default`.
    fn text_or(&self, keys: &[&str], default: &str) -> String;

    /// Field as a list of strings.
    ///
    /// A bare string becomes a one-element list. An object of lists is
    /// flattened into `"key: item"` entries.
    fn list(&self, key: &str) -> Vec<String>;

    /// Number of items in a list field (0 for anything that isn't a list).
    fn list_len(&self, key: &str) -> usize;

    /// Whether the field holds a non-empty value.
    fn has_value(&self, key: &str) -> bool;
}

/// Field lookup over any draft shape.
///
/// Objects are keyed as usual. A non-null scalar answers only for
/// `description`; arrays and null have no fields.
fn field<'a>(draft: &'a DraftRecord, key: &str) -> Option<&'a Value> {
    match draft {
        Value::Object(map) => map.get(key),
        Value::Null | Value::Array(_) => None,
        scalar => (key == "description").then_some(scalar),
    }
}

impl DraftFields for DraftRecord {
    fn text(&self, key: &str) -> String {
        field(self, key).map(value_to_text).unwrap_or_default()
    }

    fn text_or(&self, keys: &[&str], default: &str) -> String {
        keys.iter()
            .find(|key| self.has_value(key))
            .map(|key| self.text(key))
            .unwrap_or_else(|| default.to_string())
    }

    fn list(&self, key: &str) -> Vec<String> {
        match field(self, key) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .filter(|v| !v.is_null())
                .map(value_to_text)
                .collect(),
            Some(Value::String(s)) if s.trim().is_empty() => Vec::new(),
            Some(Value::Object(map)) => map
                .iter()
                .flat_map(|(name, value)| match value {
                    Value::Array(items) => items
                        .iter()
                        .map(|item| format!("{}: {}", name, value_to_text(item)))
                        .collect::<Vec<_>>(),
                    other => vec![format!("{}: {}", name, value_to_text(other))],
                })
                .collect(),
            Some(other) => vec![value_to_text(other)],
        }
    }

    fn list_len(&self, key: &str) -> usize {
        match field(self, key) {
            Some(Value::Array(items)) => items.len(),
            _ => 0,
        }
    }

    fn has_value(&self, key: &str) -> bool {
        field(self, key).is_some_and(is_truthy)
    }
}

/// Render a JSON value as plain text.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Whether a value counts as "present".
///
/// Null, empty strings, empty containers, `false` and zero are absent.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
