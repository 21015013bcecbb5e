//! Second-pass validation: rule-based schema checks and model-based
//! semantic checks. Both annotate an [`ExtractionResult`](crate::ExtractionResult)
//! in place and never fail.

pub mod schema;
pub mod semantic;

pub use schema::{
    check_record, rules_for, validate_record, FieldType, SchemaRules, SchemaValidator,
    CLINICAL_RULES, MOLECULAR_RULES, VARIANT_RULES,
};
pub use semantic::{validated_confidence, SemanticValidator};
