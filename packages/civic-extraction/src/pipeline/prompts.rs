//! LLM prompts for the extraction pipeline.
//!
//! The analysis prompt asks for the JSON shape the strict parser expects;
//! the validation prompts ask for a verdict object.

/// Prompt for extracting variants, clinical evidence and molecular data.
pub const VARIANT_ANALYSIS_PROMPT: &str = r#"Analyze this medical text and provide a comprehensive structured JSON output. Extract ALL variants mentioned, including those with uncertain significance. For each element provide:

{
  "variants": [
    {
      "name": "precise HGVS notation",
      "type": "mutation/fusion/amplification/etc",
      "prevalence": "frequency in population",
      "significance": "pathogenic/likely pathogenic/etc",
      "drugs": ["associated drugs"],
      "evidence_level": "A/B/C/D",
      "molecular_effect": "pathway impact",
      "clinical_relevance": "therapeutic implications",
      "resistance_mechanisms": ["known resistance pathways"],
      "biomarker_status": "predictive/prognostic/diagnostic",
      "references": ["supporting citations"]
    }
  ],
  "clinical_evidence": [
    {
      "type": "therapeutic/diagnostic/prognostic",
      "drugs": ["drug names"],
      "phase": "trial phase",
      "population": "patient characteristics",
      "line": "line of therapy",
      "evidence_level": "A/B/C/D",
      "outcome": "response/resistance/etc",
      "direction": "Supports/Does Not Support",
      "significance": "clinical importance",
      "supporting_data": ["key trial results", "statistics"],
      "biomarker_requirements": ["required biomarkers"]
    }
  ],
  "molecular_data": [
    {
      "pathway": "pathway name",
      "mechanism": "how the alteration acts on the pathway",
      "alterations": ["specific changes"],
      "interactions": {
        "upstream": ["pathways"],
        "downstream": ["pathways"]
      },
      "therapeutic_implications": ["drug targets", "resistance mechanisms"],
      "evidence_level": "A/B/C/D",
      "supporting_data": ["key findings"]
    }
  ]
}

Be comprehensive and include ALL relevant information from the text. Provide evidence levels for each entry."#;

/// Prompt for validating a single extracted record.
pub const VALIDATION_PROMPT: &str = r#"You are reviewing one item extracted from a biomedical paper. Check it step by step.

REASON: Is every field consistent with the others? Is the evidence level justified by the description? Are drug and variant names plausible?
ACTION: List concrete problems with the item, if any.
CONCLUDE: Decide whether the item is valid.

Output JSON only:
{
    "is_valid": true | false,
    "confidence_score": 0.0 to 1.0,
    "reasoning": "short explanation of the decision",
    "suggestions": ["specific fix", "..."]
}"#;

/// Prompt for validating a complete extraction after processing.
pub const POST_PROCESSING_PROMPT: &str = r#"You are reviewing a complete structured extraction of genetic variants, clinical evidence and molecular pathway data from one biomedical paper.

REASON: Do the variants, the clinical evidence and the molecular data agree with each other? Are there duplicates, contradictions or obviously missing links (a drug without any evidence, evidence without a variant)?
ACTION: List the problems that affect the extraction as a whole.
CONCLUDE: Decide whether the extraction is fit to store.

Output JSON only:
{
    "is_valid": true | false,
    "confidence_score": 0.0 to 1.0,
    "reasoning": "short explanation of the decision",
    "suggestions": ["specific fix", "..."]
}"#;

/// Join a prompt and the text it applies to into one request body.
pub fn format_request(prompt: &str, text: &str) -> String {
    format!("{}\n\nText to analyze:\n{}", prompt, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_request() {
        let request = format_request("Analyze.", "BRAF V600E");
        assert_eq!(request, "Analyze.\n\nText to analyze:\nBRAF V600E");
    }

    #[test]
    fn test_validation_prompts_ask_for_verdict_fields() {
        for prompt in [VALIDATION_PROMPT, POST_PROCESSING_PROMPT] {
            assert!(prompt.contains("is_valid"));
            assert!(prompt.contains("confidence_score"));
            assert!(prompt.contains("suggestions"));
        }
    }
}
