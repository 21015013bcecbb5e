//! Normalization - map draft records onto the canonical schema.
//!
//! Recognized fields are copied with named defaults, a description is
//! synthesized when the draft has none, and every record gets a confidence
//! from [`score_record`]. Unknown fields are dropped.

use crate::pipeline::confidence::score_record;
use crate::types::draft::{DraftFields, DraftGroup, DraftRecord};
use crate::types::record::{
    ClinicalEvidence, MolecularData, ReasoningTrace, Record, RecordKind, Variant,
};

/// Canonical records grouped by kind, in draft order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedGroup {
    pub variants: Vec<Variant>,
    pub clinical_evidence: Vec<ClinicalEvidence>,
    pub molecular_data: Vec<MolecularData>,
}

/// Normalize every draft in a group.
pub fn normalize_group(group: &DraftGroup) -> NormalizedGroup {
    NormalizedGroup {
        variants: group.variants.iter().map(normalize_variant).collect(),
        clinical_evidence: group
            .clinical_evidence
            .iter()
            .map(normalize_clinical_evidence)
            .collect(),
        molecular_data: group.molecular_data.iter().map(normalize_molecular_data).collect(),
    }
}

/// Normalize a single draft of a known kind.
pub fn normalize_record(kind: RecordKind, draft: &DraftRecord) -> Record {
    match kind {
        RecordKind::Variant => Record::Variant(normalize_variant(draft)),
        RecordKind::ClinicalEvidence => {
            Record::ClinicalEvidence(normalize_clinical_evidence(draft))
        }
        RecordKind::MolecularData => Record::MolecularData(normalize_molecular_data(draft)),
    }
}

pub fn normalize_variant(draft: &DraftRecord) -> Variant {
    let description = first_text(draft, &["description", "name"]);

    Variant {
        description,
        variant_type: first_text(draft, &["type", "variant_type"]),
        significance: draft.text("significance"),
        frequency: draft.text_or(&["prevalence", "frequency"], "unknown"),
        drugs: draft.list("drugs"),
        evidence_level: draft.text("evidence_level"),
        molecular_effect: draft.text("molecular_effect"),
        clinical_relevance: draft.text("clinical_relevance"),
        resistance_mechanisms: draft.list("resistance_mechanisms"),
        biomarker_status: draft.text("biomarker_status"),
        confidence: score_record(draft),
        citations: first_list(draft, &["references", "citations"]),
        trace: trace_from_draft(draft),
        validation: None,
    }
}

pub fn normalize_clinical_evidence(draft: &DraftRecord) -> ClinicalEvidence {
    let evidence_type = first_text(draft, &["type", "evidence_type"]);
    let description = if draft.has_value("description") {
        draft.text("description")
    } else {
        format!("{}: {}", evidence_type, draft.text("outcome"))
    };

    ClinicalEvidence {
        description,
        evidence_type,
        drugs: draft.list("drugs"),
        trial_phase: first_text(draft, &["phase", "trial_phase"]),
        patient_population: first_text(draft, &["population", "patient_population"]),
        line_of_therapy: first_text(draft, &["line", "line_of_therapy"]),
        evidence_level: draft.text("evidence_level"),
        evidence_direction: first_text(draft, &["direction", "evidence_direction"]),
        significance: draft.text("significance"),
        confidence: score_record(draft),
        supporting_data: draft.list("supporting_data"),
        biomarker_requirements: draft.list("biomarker_requirements"),
        trace: trace_from_draft(draft),
        validation: None,
    }
}

pub fn normalize_molecular_data(draft: &DraftRecord) -> MolecularData {
    let pathway = draft.text("pathway");
    let description = if draft.has_value("description") {
        draft.text("description")
    } else {
        format!("Pathway: {}", pathway)
    };

    MolecularData {
        description,
        pathway,
        mechanism: draft.text("mechanism"),
        alterations: draft.list("alterations"),
        interactions: draft.list("interactions"),
        therapeutic_implications: draft.list("therapeutic_implications"),
        confidence: score_record(draft),
        trace: trace_from_draft(draft),
        validation: None,
    }
}

/// Reasoning trace carried by heuristic drafts, if any part is non-empty.
fn trace_from_draft(draft: &DraftRecord) -> Option<ReasoningTrace> {
    let trace = ReasoningTrace {
        reasoning: draft.text("reasoning"),
        action: draft.text("action"),
        conclusion: draft.text("conclusion"),
    };
    (!trace.is_empty()).then_some(trace)
}

/// First non-empty text among aliased keys.
fn first_text(draft: &DraftRecord, keys: &[&str]) -> String {
    draft.text_or(keys, "")
}

/// First non-empty list among aliased keys.
fn first_list(draft: &DraftRecord, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .find(|key| draft.has_value(key))
        .map(|key| draft.list(key))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_variant_fields_and_defaults() {
        let variant = normalize_variant(&json!({
            "name": "BRAF V600E",
            "type": "mutation",
            "significance": "pathogenic",
            "drugs": ["vemurafenib", "dabrafenib"],
            "evidence_level": "A",
            "references": ["PMID:22663011"],
            "unrecognized": "dropped"
        }));

        assert_eq!(variant.description, "BRAF V600E");
        assert_eq!(variant.variant_type, "mutation");
        assert_eq!(variant.frequency, "unknown");
        assert_eq!(variant.drugs, vec!["vemurafenib", "dabrafenib"]);
        assert_eq!(variant.citations, vec!["PMID:22663011"]);
        assert!(variant.resistance_mechanisms.is_empty());
        assert_eq!(variant.biomarker_status, "");
        assert!(variant.trace.is_none());
        assert!(variant.validation.is_none());

        let json = serde_json::to_value(&variant).unwrap();
        assert!(json.get("unrecognized").is_none());
    }

    #[test]
    fn test_variant_confidence_attached() {
        let variant = normalize_variant(&json!({
            "name": "BRAF V600E",
            "evidence_level": "A"
        }));
        // 1/6 * 0.3 + 1.0 * 0.5
        assert_eq!(variant.confidence, 0.55);
    }

    #[test]
    fn test_bare_string_variant_keeps_its_text() {
        let variant = normalize_variant(&json!("BRAF V600E"));

        assert_eq!(variant.description, "BRAF V600E");
        assert_eq!(variant.frequency, "unknown");
        assert!(variant.drugs.is_empty());
        // Unknown evidence floor only: 0.2 * 0.5
        assert_eq!(variant.confidence, 0.1);
    }

    #[test]
    fn test_variant_frequency_alias() {
        let variant = normalize_variant(&json!({"name": "KRAS G12C", "frequency": "13%"}));
        assert_eq!(variant.frequency, "13%");
    }

    #[test]
    fn test_clinical_description_synthesized() {
        let evidence = normalize_clinical_evidence(&json!({
            "type": "therapeutic",
            "outcome": "response",
            "phase": "III",
            "population": "metastatic melanoma",
            "line": "first",
            "direction": "Supports"
        }));

        assert_eq!(evidence.description, "therapeutic: response");
        assert_eq!(evidence.evidence_type, "therapeutic");
        assert_eq!(evidence.trial_phase, "III");
        assert_eq!(evidence.patient_population, "metastatic melanoma");
        assert_eq!(evidence.line_of_therapy, "first");
        assert_eq!(evidence.evidence_direction, "Supports");
    }

    #[test]
    fn test_clinical_description_with_missing_parts() {
        let evidence = normalize_clinical_evidence(&json!({}));
        assert_eq!(evidence.description, ": ");
    }

    #[test]
    fn test_molecular_description_and_interactions() {
        let data = normalize_molecular_data(&json!({
            "pathway": "MAPK",
            "alterations": ["BRAF V600E"],
            "interactions": {"upstream": ["RAS"], "downstream": ["MEK"]}
        }));

        assert_eq!(data.description, "Pathway: MAPK");
        assert_eq!(data.interactions, vec!["downstream: MEK", "upstream: RAS"]);
        assert_eq!(data.mechanism, "");
    }

    #[test]
    fn test_heuristic_draft_keeps_description_and_trace() {
        let record = json!({
            "description": "Clinical evidence supports osimertinib",
            "reasoning": "T790M detected",
            "action": "",
            "conclusion": ""
        });

        let evidence = normalize_clinical_evidence(&record);
        assert_eq!(evidence.description, "Clinical evidence supports osimertinib");
        let trace = evidence.trace.unwrap();
        assert_eq!(trace.reasoning, "T790M detected");
        assert!(trace.action.is_empty());
    }

    #[test]
    fn test_normalize_group_preserves_order() {
        let mut group = DraftGroup::default();
        group.variants.push(json!({"name": "first"}));
        group.variants.push(json!({"name": "second"}));
        group.molecular_data.push(json!({"pathway": "PI3K"}));

        let normalized = normalize_group(&group);

        assert_eq!(normalized.variants.len(), 2);
        assert_eq!(normalized.variants[0].description, "first");
        assert_eq!(normalized.variants[1].description, "second");
        assert_eq!(normalized.molecular_data[0].description, "Pathway: PI3K");
        assert!(normalized.clinical_evidence.is_empty());
    }

    #[test]
    fn test_normalize_record_tags_kind() {
        let record = normalize_record(RecordKind::MolecularData, &json!({"pathway": "WNT"}));
        assert_eq!(record.kind(), RecordKind::MolecularData);
        assert_eq!(record.description(), "Pathway: WNT");
    }
}
