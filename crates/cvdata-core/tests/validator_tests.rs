//! Tests for the ArchitectureValidator

use cvdata_core::backup::BackupManager;
use cvdata_core::config::{BackupSettings, SyncSettings};
use cvdata_core::sync::SyncEngine;
use cvdata_core::validator::{ArchitectureValidator, IssueKind};
use cvdata_meta::RuleCatalog;
use cvdata_test_utils::TestDataDir;
use pretty_assertions::assert_eq;
use serde_json::json;

fn validate(dir: &TestDataDir) -> cvdata_core::ValidationReport {
    let catalog = RuleCatalog::builtin().unwrap();
    ArchitectureValidator::new(dir.layout(), &catalog)
        .validate()
        .unwrap()
}

#[test]
fn test_complete_data_set_scores_full_marks() {
    let dir = TestDataDir::new().with_full_set();
    let catalog = RuleCatalog::builtin().unwrap();

    let report = ArchitectureValidator::new(dir.layout(), &catalog)
        .run()
        .unwrap();

    assert!(report.errors.is_empty(), "errors: {:?}", report.errors);
    assert_eq!(report.consistency, 100.0);
    assert_eq!(report.integrity, 100.0);
    assert_eq!(report.relationships, 100.0);
    assert_eq!(report.overall, 100.0);
    assert_eq!(report.documents.len(), 4);
    assert!(report.passed(70.0));
    assert!(report.recommendations.is_empty());

    let written = dir.read_json("data-architecture-validation-report.json");
    assert_eq!(written["overall"], 100.0);
}

#[test]
fn test_unparseable_document_is_recorded_not_fatal() {
    let dir = TestDataDir::new().with_full_set();
    dir.write_raw("broken.json", "{ \"unterminated\": ");

    let report = validate(&dir);

    let parse_errors: Vec<_> = report
        .errors
        .iter()
        .filter(|e| e.kind == IssueKind::ParseError)
        .collect();
    assert_eq!(parse_errors.len(), 1);
    assert_eq!(parse_errors[0].file, "broken.json");
    assert_eq!(report.consistency, 100.0);
    // No index or backup registry yet: parse, inputs and schema checks apply
    assert_eq!(report.integrity, 66.67);
    assert!(
        report
            .recommendations
            .iter()
            .any(|r| r.contains("Fix malformed JSON in broken.json"))
    );
}

#[test]
fn test_non_utf8_document_is_recorded_not_fatal() {
    let dir = TestDataDir::new().with_full_set();
    std::fs::write(dir.path("broken.json"), b"{\"\xff\xfe\"}").unwrap();

    let report = validate(&dir);

    let parse_errors: Vec<_> = report
        .errors
        .iter()
        .filter(|e| e.kind == IssueKind::ParseError)
        .collect();
    assert_eq!(parse_errors.len(), 1);
    assert_eq!(parse_errors[0].file, "broken.json");
    assert_eq!(report.documents.len(), 4);
    assert_eq!(report.relationships, 100.0);
    assert_eq!(report.integrity, 66.67);
}

#[test]
fn test_activity_for_another_account_breaks_relationships() {
    let dir = TestDataDir::new().with_full_set();
    let mut activity = dir.read_json("activity-summary.json");
    activity["github_stats"]["username"] = json!("someone-else");
    dir.write_json("activity-summary.json", &activity);

    let report = validate(&dir);

    assert_eq!(report.relationships, 66.67);
    let issue = report
        .errors
        .iter()
        .find(|e| e.kind == IssueKind::RelationshipError)
        .expect("relationship issue recorded");
    assert_eq!(issue.file, "activity_matches_profile");
    assert!(issue.message.contains("someone-else"));
    assert!(
        report
            .recommendations
            .contains(&"Align cross-document references with the CV".to_string())
    );
}

#[test]
fn test_legacy_cv_is_flagged_for_migration() {
    let dir = TestDataDir::new().with_v3_0_cv();

    let report = validate(&dir);

    assert_eq!(report.consistency, 40.0);
    assert_eq!(report.integrity, 100.0);
    assert_eq!(report.relationships, 100.0);
    assert_eq!(report.overall, 82.0);
    assert!(
        report
            .recommendations
            .iter()
            .any(|r| r.contains("base-cv.json") && r.contains("cvdata migrate"))
    );
}

#[test]
fn test_tampered_backup_fails_integrity() {
    let dir = TestDataDir::new().with_full_set();
    let mut backups = BackupManager::open(dir.layout(), BackupSettings::default()).unwrap();
    let backup = backups.create_backup("base-cv.json", "4.0.0", "manual").unwrap();
    dir.write_raw(&backup.backup_path, "{}");

    let report = validate(&dir);

    assert_eq!(report.integrity, 75.0);
    let check = report
        .checks
        .iter()
        .find(|c| c.name == "backup_snapshots_intact")
        .unwrap();
    assert!(!check.passed);
    assert!(
        report
            .recommendations
            .contains(&"Prune or recreate damaged backups".to_string())
    );
}

#[test]
fn test_index_drift_recommends_resync() {
    let dir = TestDataDir::new().with_full_set();
    SyncEngine::new(dir.layout(), SyncSettings::default())
        .run()
        .unwrap();
    let mut activity = dir.read_json("activity-summary.json");
    activity["github_stats"]["followers"] = json!(8);
    dir.write_json("activity-summary.json", &activity);

    let report = validate(&dir);

    assert_eq!(report.integrity, 75.0);
    assert!(
        report
            .errors
            .iter()
            .any(|e| e.file == "index_matches_disk" && e.message.contains("activity-summary.json"))
    );
    assert!(
        report
            .recommendations
            .contains(&"Rebuild the data index with `cvdata sync run`".to_string())
    );
}

#[test]
fn test_unrecognized_document_is_warned_not_scored() {
    let dir = TestDataDir::new()
        .with_v4_cv()
        .with_document("notes.json", &json!({"todo": []}));

    let report = validate(&dir);

    assert_eq!(report.documents.len(), 1);
    assert_eq!(report.consistency, 100.0);
    assert!(report.warnings.iter().any(|w| w.starts_with("notes.json")));
}
