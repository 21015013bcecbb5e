//! Integration tests for the extraction pipeline.
//!
//! These tests verify the full workflow against a mock backend:
//! 1. Invoke the backend (with retries)
//! 2. Parse the response (strict or fallback)
//! 3. Normalize and score records
//! 4. Validate (schema + semantic)
//! 5. Build the output report

use std::time::Duration;

use civic_extraction::{
    testing::MockBackend, validation::validate_record, BackendError, ExtractionOutcome,
    ExtractionReport, Extractor, PipelineConfig, RecordKind, RetryPolicy, SchemaValidator,
    SemanticValidator, ValidationStatus,
};

const PAPER: &str = "BRAF V600E mutations occur in roughly half of melanomas. \
In a phase III trial vemurafenib improved overall survival in BRAF V600E positive patients.";

const ANALYSIS: &str = r#"Sure, here is the structured analysis.

```json
{
  "variants": [
    {
      "name": "BRAF V600E",
      "type": "SNV",
      "significance": "pathogenic",
      "prevalence": "50% of melanomas",
      "drugs": ["vemurafenib", "dabrafenib"],
      "evidence_level": "A",
      "molecular_effect": "constitutive kinase activation",
      "clinical_relevance": "predicts response to BRAF inhibitors",
      "references": ["PMID:21639808", "PMID:22663011", "PMID:20818844"]
    },
    {
      "name": "NRAS Q61K",
      "type": "SNV"
    }
  ],
  "clinical_evidence": [
    {
      "type": "predictive",
      "outcome": "improved overall survival",
      "drugs": ["vemurafenib"],
      "phase": "III",
      "population": "BRAF V600E melanoma",
      "evidence_level": "B",
      "direction": "Supports",
      "significance": "sensitivity",
      "supporting_data": ["HR 0.37"]
    }
  ],
  "molecular_data": {
    "pathway": "MAPK",
    "mechanism": "RAF-MEK-ERK signaling",
    "interactions": {"upstream": ["RAS"], "downstream": ["MEK1", "MEK2"]}
  }
}
```"#;

const VALID: &str =
    r#"{"is_valid": true, "confidence_score": 0.85, "reasoning": "consistent", "suggestions": []}"#;

fn config() -> PipelineConfig {
    PipelineConfig::new().with_retry(RetryPolicy::immediate(3))
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[tokio::test]
async fn test_extract_full_response() {
    let extractor = Extractor::new(MockBackend::new().with_response(ANALYSIS), config());

    let result = extractor.extract(PAPER).await.into_result();

    assert_eq!(result.metadata.validation_status, ValidationStatus::Processed);
    assert_eq!(
        result.descriptions(RecordKind::Variant),
        vec!["BRAF V600E", "NRAS Q61K"]
    );

    let braf = &result.variants[0];
    assert_eq!(braf.variant_type, "SNV");
    assert_eq!(braf.significance, "pathogenic");
    assert_eq!(braf.frequency, "50% of melanomas");
    assert_eq!(braf.citations.len(), 3);
    // All six scored fields and level A; references are not supporting data
    assert_close(braf.confidence, 0.8);

    let nras = &result.variants[1];
    assert_eq!(nras.frequency, "unknown");

    let evidence = &result.clinical_evidence[0];
    assert_eq!(evidence.description, "predictive: improved overall survival");
    assert_eq!(evidence.trial_phase, "III");
    assert_eq!(evidence.patient_population, "BRAF V600E melanoma");
    assert_eq!(evidence.evidence_direction, "Supports");

    // Single object wrapped into a list
    assert_eq!(result.molecular_data.len(), 1);
    let pathway = &result.molecular_data[0];
    assert_eq!(pathway.description, "Pathway: MAPK");
    assert_eq!(
        pathway.interactions,
        vec!["downstream: MEK1", "downstream: MEK2", "upstream: RAS"]
    );
}

#[tokio::test]
async fn test_overall_is_mean_of_kind_means() {
    let extractor = Extractor::new(MockBackend::new().with_response(ANALYSIS), config());

    let result = extractor.extract(PAPER).await.into_result();
    let scores = result.metadata.confidence_scores;

    let variant_mean = result.variants.iter().map(|v| v.confidence).sum::<f64>()
        / result.variants.len() as f64;
    assert_close(scores.variants, variant_mean);
    assert_close(scores.clinical, result.clinical_evidence[0].confidence);
    assert_close(scores.molecular, result.molecular_data[0].confidence);
    assert_close(
        scores.overall,
        (scores.variants + scores.clinical + scores.molecular) / 3.0,
    );
    assert!((0.0..=1.0).contains(&scores.overall));
}

#[tokio::test]
async fn test_missing_kinds_pull_overall_down() {
    let response = r#"{"variants": [{"name": "EGFR L858R", "evidence_level": "A"}]}"#;
    let extractor = Extractor::new(MockBackend::new().with_response(response), config());

    let result = extractor.extract(PAPER).await.into_result();
    let scores = result.metadata.confidence_scores;

    assert_eq!(scores.clinical, 0.0);
    assert_eq!(scores.molecular, 0.0);
    assert_close(scores.overall, scores.variants / 3.0);
}

#[tokio::test]
async fn test_sectioned_response_shape() {
    let response = r#"{
        "Genetic Variants & Mutations": {"variants": [{"name": "KRAS G12C"}]},
        "Clinical Evidence": {"evidence": [{"type": "predictive", "outcome": "response to sotorasib"}]},
        "Molecular Mechanisms": {"data": [{"pathway": "MAPK"}]}
    }"#;
    let extractor = Extractor::new(MockBackend::new().with_response(response), config());

    let result = extractor.extract(PAPER).await.into_result();

    assert_eq!(result.descriptions(RecordKind::Variant), vec!["KRAS G12C"]);
    assert_eq!(
        result.descriptions(RecordKind::ClinicalEvidence),
        vec!["predictive: response to sotorasib"]
    );
    assert_eq!(result.descriptions(RecordKind::MolecularData), vec!["Pathway: MAPK"]);
}

#[tokio::test]
async fn test_bare_string_variants_survive_to_records() {
    let response = r#"{"variants": ["BRAF V600E", {"name": "KRAS G12C", "evidence_level": "B"}]}"#;
    let extractor = Extractor::new(MockBackend::new().with_response(response), config());

    let result = extractor.extract(PAPER).await.into_result();

    assert_eq!(
        result.descriptions(RecordKind::Variant),
        vec!["BRAF V600E", "KRAS G12C"]
    );
    assert_eq!(result.variants[0].frequency, "unknown");
    assert_eq!(result.variants[0].confidence, 0.1);
}

#[tokio::test]
async fn test_prose_response_classified_by_keywords() {
    let response = "\
REASON
The paper reports a clinical trial of a targeted variant inhibitor.
ACTION
Check the molecular pathway.
CONCLUDE
Evidence supports use in melanoma.";
    let extractor = Extractor::new(MockBackend::new().with_response(response), config());

    let result = extractor.extract(PAPER).await.into_result();

    // "clinical ... variant" matches the variant rule first
    assert_eq!(result.variants.len(), 1);
    assert!(result.variants[0].description.contains("targeted variant"));
    assert_eq!(
        result.descriptions(RecordKind::MolecularData),
        vec!["Check the molecular pathway."]
    );
    assert_eq!(
        result.descriptions(RecordKind::ClinicalEvidence),
        vec!["Evidence supports use in melanoma."]
    );

    let trace = result.clinical_evidence[0].trace.as_ref().unwrap();
    assert_eq!(trace.action, "Check the molecular pathway.");
    assert_eq!(trace.conclusion, "Evidence supports use in melanoma.");
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_backend_yields_failed_extraction() {
    let backend = MockBackend::new()
        .with_failure(BackendError::RateLimited)
        .with_failure(BackendError::Api {
            status: 500,
            message: "overloaded".into(),
        })
        .with_failure(BackendError::Network("connection reset".into()));
    let config = PipelineConfig::new().with_retry(RetryPolicy::new(3, Duration::from_secs(1)));
    let extractor = Extractor::new(backend, config);

    let outcome = extractor.extract(PAPER).await;

    let ExtractionOutcome::Failed { result, error } = outcome else {
        panic!("expected failed outcome");
    };
    assert!(error.to_string().contains("connection reset"));
    assert_eq!(result.metadata.validation_status, ValidationStatus::Failed);
    assert!(result.variants.is_empty());
    assert!(result.clinical_evidence.is_empty());
    assert!(result.molecular_data.is_empty());
    assert_eq!(result.overall_confidence(), 0.0);

    let calls = extractor.invoker().backend().calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1].at - calls[0].at, Duration::from_secs(1));
    assert_eq!(calls[2].at - calls[1].at, Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_recovers() {
    let backend = MockBackend::new()
        .with_failure(BackendError::RateLimited)
        .with_response(ANALYSIS);
    let config = PipelineConfig::new().with_retry(RetryPolicy::new(3, Duration::from_secs(1)));
    let extractor = Extractor::new(backend, config);

    let outcome = extractor.extract(PAPER).await;

    assert!(!outcome.is_failed());
    assert_eq!(outcome.result().variants.len(), 2);
}

#[tokio::test]
async fn test_schema_round_trip_on_extracted_records() {
    let extractor = Extractor::new(MockBackend::new().with_response(ANALYSIS), config());
    let result = extractor.extract(PAPER).await.into_result();

    let braf = serde_json::to_value(&result.variants[0]).unwrap();
    assert!(validate_record(RecordKind::Variant, &braf).is_empty());

    // NRAS has no significance
    let nras = serde_json::to_value(&result.variants[1]).unwrap();
    assert_eq!(
        validate_record(RecordKind::Variant, &nras),
        vec!["Missing required field: significance".to_string()]
    );
}

#[tokio::test]
async fn test_failing_record_checks_do_not_block_final_pass() {
    let backend = MockBackend::new()
        .with_response_for("comprehensive structured JSON output", ANALYSIS)
        .with_failure_for("reviewing one item", BackendError::RateLimited)
        .with_response_for("reviewing a complete structured extraction", VALID);
    let config = config();
    let extractor = Extractor::new(backend, config.clone());

    let mut result = extractor.extract(PAPER).await.into_result();
    let validator = SemanticValidator::new(extractor.invoker().clone(), config.max_output_tokens);
    validator.validate_full(&mut result).await;

    let check = result.variants[0].validation.as_ref().unwrap();
    assert!(!check.is_valid);
    assert_eq!(check.confidence_score, 0.0);
    assert!(check.reasoning.starts_with("Validation failed:"));
    assert_eq!(result.metadata.validation_status, ValidationStatus::Valid);

    // One extraction call, four record checks of three attempts each, one final pass
    assert_eq!(extractor.invoker().backend().call_count(), 14);
}

#[tokio::test]
async fn test_full_validation_flow_and_report() {
    let backend = MockBackend::new()
        .with_response_for("comprehensive structured JSON output", ANALYSIS)
        .with_response_for("reviewing one item", VALID)
        .with_response_for("reviewing a complete structured extraction", VALID);
    let config = config();
    let extractor = Extractor::new(backend, config.clone());

    let mut result = extractor.extract(PAPER).await.into_result();
    let confidences: Vec<f64> = result.variants.iter().map(|v| v.confidence).collect();

    let schema = SchemaValidator::new().annotate(&mut result).clone();
    assert!(!schema.is_valid);
    assert!(schema.suggestions[0].starts_with("Add missing required fields:"));

    let validator = SemanticValidator::new(extractor.invoker().clone(), config.max_output_tokens);
    validator.validate_full(&mut result).await;

    assert_eq!(result.metadata.validation_status, ValidationStatus::Valid);
    assert!(result.variants.iter().all(|v| v.validation.is_some()));
    assert!(result.clinical_evidence[0].validation.is_some());
    assert!(result.molecular_data[0].validation.is_some());
    assert_eq!(
        result.variants.iter().map(|v| v.confidence).collect::<Vec<_>>(),
        confidences
    );
    assert!(result.metadata.validated_confidence.is_some());

    // One extraction call, four record checks, one post-processing pass
    assert_eq!(extractor.invoker().backend().call_count(), 6);

    let report = ExtractionReport::new(result, 1.5);
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

    for key in ["variants", "clinical_evidence", "molecular_data", "metadata", "stats"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert_eq!(json["stats"]["num_variants"], 2);
    assert_eq!(json["stats"]["num_clinical_evidence"], 1);
    assert_eq!(json["stats"]["num_molecular_data"], 1);
    assert_eq!(json["stats"]["processing_time"], 1.5);
    assert_eq!(json["metadata"]["validation_status"], "valid");
}
