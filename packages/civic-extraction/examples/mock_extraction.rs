//! End-to-end extraction against a scripted backend.
//!
//! Shows the full flow (extract, schema check, semantic validation, report)
//! without network access:
//!
//! ```sh
//! cargo run -p civic-extraction --example mock_extraction
//! ```

use civic_extraction::{
    ExtractionReport, Extractor, MockBackend, PipelineConfig, RecordKind, RetryPolicy,
    SchemaValidator, SemanticValidator,
};

const PAPER: &str = "The EGFR L858R substitution predicts response to gefitinib in \
non-small cell lung cancer (phase III, n=1217).";

const ANALYSIS: &str = r#"{
  "variants": [{"name": "EGFR L858R", "type": "SNV", "significance": "oncogenic",
                "evidence_level": "A", "drugs": ["gefitinib"]}],
  "clinical_evidence": [{"type": "predictive", "outcome": "response to gefitinib",
                         "phase": "III", "evidence_level": "A", "direction": "Supports",
                         "significance": "sensitivity", "supporting_data": ["n=1217"]}],
  "molecular_data": [{"pathway": "EGFR signaling", "mechanism": "ligand-independent activation"}]
}"#;

const VERDICT: &str =
    r#"{"is_valid": true, "confidence_score": 0.8, "reasoning": "fields agree", "suggestions": []}"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info,civic_extraction=debug")
        .init();

    let backend = MockBackend::new()
        .with_response_for("comprehensive structured JSON output", ANALYSIS)
        .with_default_response(VERDICT);
    let config = PipelineConfig::new().with_retry(RetryPolicy::immediate(1));
    let extractor = Extractor::new(backend, config.clone());

    let started = std::time::Instant::now();
    let mut result = extractor.extract(PAPER).await.into_result();

    SchemaValidator::new().annotate(&mut result);
    SemanticValidator::new(extractor.invoker().clone(), config.max_output_tokens)
        .validate_full(&mut result)
        .await;

    for kind in RecordKind::ALL {
        println!("{kind}: {:?}", result.descriptions(kind));
    }

    let report = ExtractionReport::new(result, started.elapsed().as_secs_f64());
    println!("{}", report.to_json()?);

    Ok(())
}
