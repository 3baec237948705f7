//! End-to-end pipeline tests

use cvdata_core::config::Settings;
use cvdata_core::migration::MigrationRegistry;
use cvdata_core::orchestrator::{Orchestrator, PipelineOptions, Stage};
use cvdata_meta::{RuleCatalog, SchemaVersion, extract_version};
use cvdata_test_utils::TestDataDir;
use pretty_assertions::assert_eq;

fn pipeline(dir: &TestDataDir, continue_on_error: bool) -> cvdata_core::MasterReport {
    let catalog = RuleCatalog::builtin().unwrap();
    let registry = MigrationRegistry::with_builtins();
    Orchestrator::new(dir.layout(), Settings::default(), &catalog, &registry)
        .run(&PipelineOptions { continue_on_error })
        .unwrap()
}

#[test]
fn test_legacy_data_is_migrated_and_passes() {
    let dir = TestDataDir::new().with_v3_0_cv().with_activity();

    let report = pipeline(&dir, true);

    let order: Vec<Stage> = report.stages.iter().map(|s| s.stage).collect();
    assert_eq!(order, Stage::ALL.to_vec());
    assert!(report.overall_success, "stages: {:#?}", report.stages);
    assert_eq!(report.health.consistency, 100.0);
    assert_eq!(report.health.reliability, 100.0);
    assert_eq!(report.health.schema, 100.0);
    assert!(report.health.overall >= report.health_threshold);
    assert!(report.passed);

    let cv = dir.read_json("base-cv.json");
    assert_eq!(extract_version(&cv).version, SchemaVersion::current());
    for file in [
        "backup-registry.json",
        "migration-report.json",
        "data-architecture-validation-report.json",
        "data-index.json",
        "sync-performance-report.json",
        "quality-report.json",
        "data-architecture-master-report.json",
    ] {
        dir.assert_file_exists(file);
    }
}

#[test]
fn test_fail_fast_skips_remaining_stages() {
    let dir = TestDataDir::new().with_v3_0_cv();
    dir.write_raw("broken.json", "{");

    let report = pipeline(&dir, false);

    assert!(report.stages[0].success);
    assert!(!report.stages[1].success);
    assert!(!report.stages[1].skipped);
    assert!(report.stages[2..].iter().all(|s| s.skipped && !s.success));
    assert!(!report.overall_success);
    assert!(!report.passed);
    assert_eq!(report.health.reliability, 20.0);
    dir.assert_file_not_exists("quality-report.json");
}

#[test]
fn test_continue_on_error_runs_every_stage() {
    let dir = TestDataDir::new().with_v3_0_cv();
    dir.write_raw("broken.json", "{");

    let report = pipeline(&dir, true);

    assert!(report.stages.iter().all(|s| !s.skipped));
    let failed: Vec<Stage> = report
        .stages
        .iter()
        .filter(|s| !s.success)
        .map(|s| s.stage)
        .collect();
    assert_eq!(failed, vec![Stage::Migrator]);
    assert_eq!(report.health.reliability, 80.0);
    assert!(!report.passed);

    let written = dir.read_json("data-architecture-master-report.json");
    assert_eq!(written["stages"].as_array().unwrap().len(), 5);
}
