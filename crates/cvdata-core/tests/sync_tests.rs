//! Tests for change detection, the cascade and the sync loop

use std::fs;
use std::time::{Duration, SystemTime};

use cvdata_core::config::SyncSettings;
use cvdata_core::sync::{ChangeKind, Priority, SyncEngine, SyncIndex, SyncStatus, Tier, scan_drift};
use cvdata_test_utils::TestDataDir;
use pretty_assertions::assert_eq;
use serde_json::json;

fn engine(dir: &TestDataDir) -> SyncEngine {
    SyncEngine::new(dir.layout(), SyncSettings::default())
}

/// Push a file's mtime into the future without touching its content.
fn touch(dir: &TestDataDir, relative: &str, ahead: Duration) {
    let file = fs::File::options()
        .write(true)
        .open(dir.path(relative))
        .unwrap();
    file.set_modified(SystemTime::now() + ahead).unwrap();
}

#[test]
fn test_second_run_sees_no_changes() {
    // Initial run indexes and syncs everything; an immediate rerun is quiet
    let dir = TestDataDir::new().with_full_set();
    let mut engine = engine(&dir);

    let first = engine.run().unwrap();
    assert_eq!(first.total_files, 4);
    assert_eq!(first.changes, 4);
    assert_eq!(first.completed, 4);
    assert_eq!(first.pending, 0);
    assert!(first.success());
    dir.assert_file_exists("data-index.json");
    dir.assert_file_exists("sync-performance-report.json");

    let second = engine.run().unwrap();
    assert_eq!(second.changes, 0);
    assert_eq!(second.pending, 0);
    assert_eq!(second.completed, 0);
    assert_eq!(second.total_files, 4);
}

#[test]
fn test_detect_is_idempotent() {
    let dir = TestDataDir::new().with_full_set();
    let engine = engine(&dir);
    let index = engine.initialize_data_index().unwrap();
    dir.write_json("ai-enhancements.json", &json!({"enhancements": {}}));
    touch(&dir, "ai-enhancements.json", Duration::from_secs(60));

    let first = engine.detect_data_changes(&index).unwrap();
    let second = engine.detect_data_changes(&index).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].kind, ChangeKind::Modified);
}

#[test]
fn test_mtime_only_touch_is_not_a_change() {
    let dir = TestDataDir::new().with_v4_cv();
    let engine = engine(&dir);
    let index = engine.initialize_data_index().unwrap();

    touch(&dir, "base-cv.json", Duration::from_secs(60));

    assert!(engine.detect_data_changes(&index).unwrap().is_empty());
}

#[test]
fn test_run_records_mtime_of_touched_file() {
    let dir = TestDataDir::new().with_v4_cv();
    let mut engine = engine(&dir);
    engine.run().unwrap();
    let before = SyncIndex::load(&dir.layout()).unwrap().unwrap();

    touch(&dir, "base-cv.json", Duration::from_secs(60));
    let drift = scan_drift(&dir.layout(), &before).unwrap();
    assert!(drift.changes.is_empty());
    assert_eq!(drift.touched.len(), 1);

    let report = engine.run().unwrap();
    assert_eq!(report.changes, 0);

    let after = SyncIndex::load(&dir.layout()).unwrap().unwrap();
    assert!(after.entries["base-cv.json"].last_modified > before.entries["base-cv.json"].last_modified);
    assert_eq!(after.entries["base-cv.json"].checksum, before.entries["base-cv.json"].checksum);
    assert!(scan_drift(&dir.layout(), &after).unwrap().touched.is_empty());
}

#[test]
fn test_changes_are_ordered_critical_first() {
    let dir = TestDataDir::new()
        .with_enhancements()
        .with_v4_cv()
        .with_document("misc.json", &json!({"note": true}));
    let engine = engine(&dir);

    let changes = engine
        .detect_data_changes(&SyncIndex::new(chrono::Utc::now()))
        .unwrap();

    let order: Vec<(&str, Priority)> = changes
        .iter()
        .map(|c| (c.path.as_str(), c.priority))
        .collect();
    assert_eq!(
        order,
        vec![
            ("base-cv.json", Priority::Critical),
            ("ai-enhancements.json", Priority::High),
            ("misc.json", Priority::Normal),
        ]
    );
    assert!(changes.iter().all(|c| c.kind == ChangeKind::Added));
}

#[test]
fn test_cv_change_cascades_to_derived_files() {
    // Derived files that are indexed go pending and are swept by the critical tier
    let dir = TestDataDir::new()
        .with_v4_cv()
        .with_document("optimized/base-cv-optimized.json", &json!({}))
        .with_document("cache/base-cv.cache.json", &json!({}));
    let mut engine = engine(&dir);
    engine.run().unwrap();

    let mut cv = dir.read_json("base-cv.json");
    cv["profile"]["personal"]["summary"] = json!("Systems engineer");
    dir.write_json("base-cv.json", &cv);
    touch(&dir, "base-cv.json", Duration::from_secs(60));

    let report = engine.run().unwrap();

    assert_eq!(report.changes, 1);
    assert_eq!(report.cascade_triggers, 2);
    assert_eq!(report.completed, 2);
    assert_eq!(report.pending, 0);
    assert_eq!(engine.hooks().optimized(), vec!["base-cv.json", "base-cv.json"]);

    let index = SyncIndex::load(&dir.layout()).unwrap().unwrap();
    assert!(
        index
            .entries
            .values()
            .all(|e| e.sync_status == SyncStatus::Completed)
    );
}

#[test]
fn test_deleted_documents_are_purged() {
    let dir = TestDataDir::new().with_v4_cv().with_activity();
    let mut engine = engine(&dir);
    engine.run().unwrap();

    fs::remove_file(dir.path("activity-summary.json")).unwrap();
    let report = engine.run().unwrap();

    assert_eq!(report.changes, 1);
    assert_eq!(report.total_files, 1);
    let index = SyncIndex::load(&dir.layout()).unwrap().unwrap();
    assert!(!index.entries.contains_key("activity-summary.json"));
}

#[test]
fn test_missing_pending_document_fails_its_sweep() {
    let dir = TestDataDir::new().with_v4_cv().with_activity();
    let engine = engine(&dir);
    let mut index = engine.initialize_data_index().unwrap();

    fs::remove_file(dir.path("activity-summary.json")).unwrap();
    let sweep = engine.sync_pending(&mut index, Tier::Critical).unwrap();

    assert_eq!(sweep.completed, 1);
    assert_eq!(sweep.failed, 1);
    assert_eq!(
        index.entries["activity-summary.json"].sync_status,
        SyncStatus::Failed
    );
}

#[test]
fn test_tier_sweep_leaves_other_tiers_pending() {
    let dir = TestDataDir::new().with_v4_cv().with_enhancements();
    let engine = engine(&dir);
    let mut index = engine.initialize_data_index().unwrap();

    engine.sync_pending(&mut index, Tier::Critical).unwrap();

    assert_eq!(index.entries["base-cv.json"].sync_status, SyncStatus::Completed);
    assert_eq!(
        index.entries["ai-enhancements.json"].sync_status,
        SyncStatus::Pending
    );
}

#[tokio::test]
async fn test_watch_stops_after_requested_iterations() {
    let dir = TestDataDir::new().with_full_set();
    let settings = SyncSettings {
        critical_interval_secs: 0,
        normal_interval_secs: 0,
        background_interval_secs: 0,
    };
    let mut engine = SyncEngine::new(dir.layout(), settings);

    let summary = engine
        .watch(Some(2), std::future::pending::<()>())
        .await
        .unwrap();

    assert_eq!(summary.iterations, 2);
    assert_eq!(summary.completed, 4);
    assert_eq!(summary.failed, 0);
    let index = SyncIndex::load(&dir.layout()).unwrap().unwrap();
    assert_eq!(index.count(SyncStatus::Completed), 4);
}

#[tokio::test]
async fn test_watch_honours_shutdown() {
    let dir = TestDataDir::new().with_v4_cv();
    let mut engine = engine(&dir);

    let summary = engine.watch(None, async {}).await.unwrap();

    assert_eq!(summary.iterations, 0);
}
