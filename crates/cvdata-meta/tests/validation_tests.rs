//! Rule engine behaviour against realistic documents

use cvdata_meta::{
    DocumentType, RuleCatalog, extract_version, identify_file_type, validate_file,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};

fn modern_cv() -> Value {
    json!({
        "metadata": {"version": "4.0.0", "schema_version": "4.0.0", "last_updated": "2026-10-01T09:00:00Z"},
        "profile": {
            "personal": {"name": "Ada Lovelace", "title": "Analyst", "summary": "Writes programs for engines that do not exist yet."},
            "contact": {"email": "ada@example.com", "github": "https://github.com/ada"}
        },
        "career": {"experience": [{"company": "Analytical Engines", "role": "Programmer"}]},
        "portfolio": {"projects": []},
        "skills": [{"name": "Rust", "level": 90}]
    })
}

#[test]
fn test_valid_cv_scores_full_marks() {
    let catalog = RuleCatalog::builtin().unwrap();
    let outcome = validate_file("base-cv.json", &modern_cv(), DocumentType::CoreCv, &catalog);
    assert!(outcome.valid, "errors: {:?}", outcome.errors);
    assert_eq!(outcome.score, 100);
}

#[test]
fn test_missing_metadata_fails_base_cv_rules() {
    let catalog = RuleCatalog::builtin().unwrap();
    let mut doc = modern_cv();
    doc.as_object_mut().unwrap().remove("metadata");

    let outcome = validate_file("base-cv.json", &doc, DocumentType::CoreCv, &catalog);

    assert!(!outcome.valid);
    assert!(outcome.score <= 80);
    assert!(
        outcome
            .errors
            .contains(&"Missing required field: metadata".to_string())
    );
}

#[test]
fn test_every_missing_required_field_costs_twenty() {
    let catalog = RuleCatalog::builtin().unwrap();
    let outcome = validate_file("base-cv.json", &json!({}), DocumentType::CoreCv, &catalog);
    assert_eq!(outcome.score, 40);
    assert_eq!(outcome.errors.len(), 3);
}

#[test]
fn test_validation_is_deterministic() {
    let catalog = RuleCatalog::builtin().unwrap();
    let doc = json!({"profile": {"contact": {"email": "nope"}}, "skills": []});

    let first = validate_file("base-cv.json", &doc, DocumentType::CoreCv, &catalog);
    let second = validate_file("base-cv.json", &doc, DocumentType::CoreCv, &catalog);

    assert_eq!(first, second);
}

#[test]
fn test_undeclared_fields_are_warnings_only() {
    let catalog = RuleCatalog::builtin().unwrap();
    let mut doc = modern_cv();
    doc["favourite_colour"] = json!("teal");

    let outcome = validate_file("base-cv.json", &doc, DocumentType::CoreCv, &catalog);

    assert!(outcome.valid);
    assert_eq!(outcome.warnings, vec!["Undeclared top-level field: favourite_colour"]);
}

#[rstest]
#[case("base-cv.json", json!({}), DocumentType::CoreCv)]
#[case("activity-summary.json", json!({}), DocumentType::Activity)]
#[case("ai-enhancements.json", json!({}), DocumentType::Enhancement)]
#[case("protected-content.json", json!({}), DocumentType::Protection)]
#[case("gh.json", json!({"timestamp": "2026-10-01", "github_stats": {}}), DocumentType::Activity)]
#[case("extra.json", json!({"ai_enhancements": {}}), DocumentType::Enhancement)]
#[case("guard.json", json!({"protected_sections": []}), DocumentType::Protection)]
#[case("misc.json", json!({"anything": true}), DocumentType::Unknown)]
fn test_identify_file_type(#[case] name: &str, #[case] data: Value, #[case] expected: DocumentType) {
    assert_eq!(identify_file_type(name, &data).doc_type, expected);
}

#[test]
fn test_legacy_shape_detected_as_3_0_0() {
    let doc = json!({
        "personal_info": {"name": "Ada Lovelace"},
        "contact_info": {"email": "ada@example.com"}
    });
    assert_eq!(extract_version(&doc).version.to_string(), "3.0.0");
}
