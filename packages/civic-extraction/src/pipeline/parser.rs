//! Response parsing - turn raw model output into draft records.
//!
//! Two paths, tried in order:
//!
//! 1. **Strict**: find the outermost `{...}` span and decode it as JSON.
//! 2. **Fallback**: strip code fences and classify each line into a record
//!    kind by keyword, tracking REASON / ACTION / CONCLUDE sections so every
//!    draft carries the trace accumulated so far.
//!
//! Backends regularly wrap JSON in prose or return prose alone, so the
//! parser never fails; the worst case is an empty group.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use crate::types::draft::{DraftGroup, DraftRecord};
use crate::types::record::RecordKind;

/// Greedy span from the first `{` to the last `}`.
static JSON_SPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// A keyword rule mapping a line to a record kind.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub kind: RecordKind,

    /// Lowercase keywords, matched as substrings of the lowercased line
    pub keywords: &'static [&'static str],
}

impl ClassificationRule {
    pub fn matches(&self, lowercase_line: &str) -> bool {
        self.keywords.iter().any(|k| lowercase_line.contains(k))
    }
}

/// Line classification rules. Evaluated in order, first match wins.
pub const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        kind: RecordKind::Variant,
        keywords: &["variant", "mutation"],
    },
    ClassificationRule {
        kind: RecordKind::ClinicalEvidence,
        keywords: &["clinical", "evidence"],
    },
    ClassificationRule {
        kind: RecordKind::MolecularData,
        keywords: &["molecular", "pathway"],
    },
];

/// Sections of a reasoning trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceSection {
    Reasoning,
    Action,
    Conclusion,
}

/// Case-sensitive header tokens that switch the current trace section.
pub const SECTION_MARKERS: &[(&str, TraceSection)] = &[
    ("REASON", TraceSection::Reasoning),
    ("ACTION", TraceSection::Action),
    ("CONCLUDE", TraceSection::Conclusion),
];

/// Which path produced a draft group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsePath {
    Strict,
    Fallback,
}

/// Sectioned top-level shapes some responses use instead of flat keys.
const SECTIONED_KEYS: &[(&str, &str, RecordKind)] = &[
    ("Genetic Variants & Mutations", "variants", RecordKind::Variant),
    ("Clinical Evidence", "evidence", RecordKind::ClinicalEvidence),
    ("Molecular Mechanisms", "data", RecordKind::MolecularData),
];

/// Parse a raw model response into a draft group.
pub fn parse_response(raw: &str) -> DraftGroup {
    parse_response_with_path(raw).0
}

/// Parse a raw model response, reporting which path was taken.
pub fn parse_response_with_path(raw: &str) -> (DraftGroup, ParsePath) {
    if let Some(group) = parse_strict(raw) {
        tracing::info!(
            drafts = group.len(),
            "Parsed structured JSON from model response"
        );
        return (group, ParsePath::Strict);
    }

    let group = parse_fallback(raw);
    tracing::info!(
        variants = group.variants.len(),
        clinical = group.clinical_evidence.len(),
        molecular = group.molecular_data.len(),
        "Structured model response with line heuristics"
    );
    (group, ParsePath::Fallback)
}

/// Strict path: decode the first `{...}` span.
///
/// Returns `None` when there is no span or it isn't a JSON object.
pub fn parse_strict(raw: &str) -> Option<DraftGroup> {
    let span = JSON_SPAN.find(raw)?;

    match serde_json::from_str::<Value>(span.as_str()) {
        Ok(Value::Object(map)) => Some(group_from_object(map)),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "JSON span failed to decode, falling back to text processing");
            None
        }
    }
}

/// Fallback path: keyword classification of individual lines.
pub fn parse_fallback(raw: &str) -> DraftGroup {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    let mut group = DraftGroup {
        raw_text: cleaned.to_string(),
        ..Default::default()
    };

    let mut section: Option<TraceSection> = None;
    let mut trace = TraceBlocks::default();

    for line in cleaned.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Header lines switch sections but are still classified below.
        if let Some(marker) = section_marker(line) {
            section = Some(marker);
        } else if let Some(current) = section {
            trace.push(current, line);
        }

        if let Some(kind) = classify_line(line) {
            group.push(kind, trace.draft(line));
        }
    }

    group
}

/// Record kind for a line, if any rule matches.
pub fn classify_line(line: &str) -> Option<RecordKind> {
    let lowered = line.to_lowercase();
    CLASSIFICATION_RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| rule.kind)
}

/// Trace section a header line opens, if any.
pub fn section_marker(line: &str) -> Option<TraceSection> {
    SECTION_MARKERS
        .iter()
        .find(|(token, _)| line.contains(token))
        .map(|(_, section)| *section)
}

/// Trace lines accumulated per section.
#[derive(Debug, Default)]
struct TraceBlocks<'a> {
    reasoning: Vec<&'a str>,
    action: Vec<&'a str>,
    conclusion: Vec<&'a str>,
}

impl<'a> TraceBlocks<'a> {
    fn push(&mut self, section: TraceSection, line: &'a str) {
        match section {
            TraceSection::Reasoning => self.reasoning.push(line),
            TraceSection::Action => self.action.push(line),
            TraceSection::Conclusion => self.conclusion.push(line),
        }
    }

    fn draft(&self, line: &str) -> DraftRecord {
        let mut record = Map::new();
        record.insert("description".into(), Value::String(line.to_string()));
        record.insert("reasoning".into(), Value::String(self.reasoning.join("\n")));
        record.insert("action".into(), Value::String(self.action.join("\n")));
        record.insert("conclusion".into(), Value::String(self.conclusion.join("\n")));
        Value::Object(record)
    }
}

fn group_from_object(mut map: Map<String, Value>) -> DraftGroup {
    let mut group = DraftGroup::default();

    for kind in RecordKind::ALL {
        if let Some(value) = take_collection(&mut map, kind) {
            *group.records_mut(kind) = records_from_value(value, kind);
        }
    }

    if let Some(Value::String(raw_text)) = map.remove("raw_text") {
        group.raw_text = raw_text;
    }

    group.extra = map;
    group
}

/// Remove a kind's collection from the top-level object.
///
/// Sectioned shapes take precedence over the flat key.
fn take_collection(map: &mut Map<String, Value>, kind: RecordKind) -> Option<Value> {
    for (section, inner, section_kind) in SECTIONED_KEYS {
        if *section_kind != kind {
            continue;
        }
        if let Some(Value::Object(mut nested)) = map.remove(*section) {
            return nested.remove(*inner);
        }
    }

    map.remove(kind.collection_key())
}

/// Items of a kind's collection, kept exactly as decoded.
///
/// A single object stands in for a one-item list; any other non-list
/// value yields nothing.
fn records_from_value(value: Value, kind: RecordKind) -> Vec<DraftRecord> {
    match value {
        Value::Array(items) => {
            let bare = items.iter().filter(|item| !item.is_object()).count();
            if bare > 0 {
                tracing::debug!(kind = %kind, bare, "Model response lists non-object items");
            }
            items
        }
        record @ Value::Object(_) => vec![record],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strict_path_returns_variants_unmodified() {
        let raw = r#"Here is the analysis:
{"variants": [{"name": "BRAF V600E", "type": "mutation", "evidence_level": "A", "extra": {"k": 1}}], "clinical_evidence": []}
Let me know if you need more."#;

        let (group, path) = parse_response_with_path(raw);

        assert_eq!(path, ParsePath::Strict);
        let expected = json!([{"name": "BRAF V600E", "type": "mutation", "evidence_level": "A", "extra": {"k": 1}}]);
        assert_eq!(serde_json::to_value(&group.variants).unwrap(), expected);
        assert!(group.clinical_evidence.is_empty());
    }

    #[test]
    fn test_strict_path_keeps_extra_keys() {
        let raw = r#"{"is_valid": true, "confidence_score": 0.9, "reasoning": "ok", "suggestions": []}"#;
        let group = parse_response(raw);

        assert!(group.is_empty());
        assert_eq!(group.extra["is_valid"], json!(true));
        assert_eq!(group.extra["confidence_score"], json!(0.9));
    }

    #[test]
    fn test_strict_path_accepts_sectioned_shape_and_single_object() {
        let raw = r#"{
            "Genetic Variants & Mutations": {"variants": [{"name": "KRAS G12C"}]},
            "Clinical Evidence": {"evidence": {"type": "therapeutic", "outcome": "response"}},
            "molecular_data": [{"pathway": "MAPK"}]
        }"#;
        let group = parse_response(raw);

        assert_eq!(group.variants.len(), 1);
        assert_eq!(group.variants[0]["name"], json!("KRAS G12C"));
        assert_eq!(group.clinical_evidence.len(), 1);
        assert_eq!(group.molecular_data.len(), 1);
        assert!(group.extra.is_empty());
    }

    #[test]
    fn test_strict_path_keeps_bare_string_items() {
        let raw = r#"{"variants": ["BRAF V600E", {"name": "KRAS G12C"}], "molecular_data": [null, 7]}"#;
        let (group, path) = parse_response_with_path(raw);

        assert_eq!(path, ParsePath::Strict);
        assert_eq!(
            serde_json::to_value(&group.variants).unwrap(),
            json!(["BRAF V600E", {"name": "KRAS G12C"}])
        );
        assert_eq!(group.molecular_data, vec![Value::Null, json!(7)]);
    }

    #[test]
    fn test_invalid_json_falls_back() {
        let raw = "{ this is not json }\nThe EGFR mutation confers sensitivity.";
        let (group, path) = parse_response_with_path(raw);

        assert_eq!(path, ParsePath::Fallback);
        assert_eq!(group.variants.len(), 1);
        assert_eq!(
            group.variants[0]["description"],
            json!("The EGFR mutation confers sensitivity.")
        );
    }

    #[test]
    fn test_fallback_description_is_verbatim_line() {
        let raw = "Summary\n  The T790M mutation drives resistance.  \n";
        let group = parse_response(raw);

        assert_eq!(group.variants.len(), 1);
        assert_eq!(
            group.variants[0]["description"],
            json!("The T790M mutation drives resistance.")
        );
    }

    #[test]
    fn test_fallback_first_rule_wins() {
        let raw = "A variant with clinical evidence in the MAPK pathway";
        let group = parse_response(raw);

        assert_eq!(group.variants.len(), 1);
        assert!(group.clinical_evidence.is_empty());
        assert!(group.molecular_data.is_empty());
    }

    #[test]
    fn test_fallback_classifies_each_kind() {
        let raw = "```json\nClinical trial showed response\nPathway crosstalk observed\nNothing relevant here\n```";
        let group = parse_response(raw);

        assert!(group.variants.is_empty());
        assert_eq!(group.clinical_evidence.len(), 1);
        assert_eq!(group.molecular_data.len(), 1);
        assert!(!group.raw_text.contains("```"));
    }

    #[test]
    fn test_fallback_tracks_trace_sections() {
        let raw = "REASONING:\nThe paper reports a BRAF mutation.\nACTION:\nLook up evidence level.\nCONCLUDE:\nStrong clinical evidence.";
        let group = parse_response(raw);

        assert_eq!(group.variants.len(), 1);
        let variant = &group.variants[0];
        assert_eq!(variant["reasoning"], json!("The paper reports a BRAF mutation."));
        assert_eq!(variant["action"], json!(""));

        // "Look up evidence level." and "Strong clinical evidence." are clinical lines.
        assert_eq!(group.clinical_evidence.len(), 2);
        let last = &group.clinical_evidence[1];
        assert_eq!(last["action"], json!("Look up evidence level."));
        assert_eq!(last["conclusion"], json!("Strong clinical evidence."));
    }

    #[test]
    fn test_section_markers_are_case_sensitive() {
        assert_eq!(section_marker("REASONING"), Some(TraceSection::Reasoning));
        assert_eq!(section_marker("reasoning"), None);
        assert_eq!(section_marker("Next ACTION"), Some(TraceSection::Action));
    }

    #[test]
    fn test_classify_line_is_case_insensitive() {
        assert_eq!(classify_line("MUTATION found"), Some(RecordKind::Variant));
        assert_eq!(classify_line("Evidence base"), Some(RecordKind::ClinicalEvidence));
        assert_eq!(classify_line("PATHWAY"), Some(RecordKind::MolecularData));
        assert_eq!(classify_line("unrelated"), None);
    }

    #[test]
    fn test_empty_response_yields_empty_group() {
        let group = parse_response("");
        assert!(group.is_empty());
        assert!(!group.is_fallback());
    }
}
