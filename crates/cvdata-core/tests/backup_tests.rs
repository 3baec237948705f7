//! Tests for the BackupManager

use chrono::{Duration, Utc};
use cvdata_core::Error;
use cvdata_core::backup::BackupManager;
use cvdata_core::config::BackupSettings;
use cvdata_fs::checksum::compute_file_checksum;
use cvdata_test_utils::TestDataDir;
use pretty_assertions::assert_eq;
use std::fs;

fn manager(dir: &TestDataDir, settings: BackupSettings) -> BackupManager {
    BackupManager::open(dir.layout(), settings).unwrap()
}

#[test]
fn test_backup_matches_source_and_adds_one_entry() {
    let dir = TestDataDir::new().with_v4_cv();
    let mut backups = manager(&dir, BackupSettings::default());
    let source_checksum = compute_file_checksum(&dir.path("base-cv.json")).unwrap();
    let before = backups.list_backups().len();

    let backup = backups
        .create_backup("base-cv.json", "4.0.0", "manual")
        .unwrap();

    assert_eq!(backup.checksum, source_checksum);
    assert_eq!(
        compute_file_checksum(&dir.path(&backup.backup_path)).unwrap(),
        source_checksum
    );
    assert_eq!(backups.list_backups().len(), before + 1);
    assert_eq!(backup.size, fs::metadata(dir.path("base-cv.json")).unwrap().len());

    // Persisted, not just in memory
    let reopened = manager(&dir, BackupSettings::default());
    assert_eq!(reopened.list_backups(), &[backup]);
}

#[test]
fn test_expired_backup_leaves_registry_and_disk() {
    let dir = TestDataDir::new().with_v4_cv();
    let mut backups = manager(&dir, BackupSettings::default());
    let now = Utc::now();

    let old = backups
        .create_backup_at("base-cv.json", "4.0.0", "old", now - Duration::days(31))
        .unwrap();
    let recent = backups
        .create_backup_at("base-cv.json", "4.0.0", "recent", now - Duration::days(1))
        .unwrap();

    let report = backups.cleanup_old_backups(now).unwrap();

    assert_eq!(report.removed, vec![old.clone()]);
    assert_eq!(report.files_deleted, 1);
    assert_eq!(report.retained, 1);
    assert_eq!(backups.list_backups(), &[recent.clone()]);
    dir.assert_file_not_exists(&old.backup_path);
    dir.assert_file_exists(&recent.backup_path);

    let reopened = manager(&dir, BackupSettings::default());
    assert!(reopened.list_backups().iter().all(|b| b.id != old.id));
}

#[test]
fn test_keep_files_retains_snapshots_after_sweep() {
    let dir = TestDataDir::new().with_v4_cv();
    let settings = BackupSettings {
        retention_days: 7,
        keep_files: true,
    };
    let mut backups = manager(&dir, settings);
    let now = Utc::now();
    let old = backups
        .create_backup_at("base-cv.json", "4.0.0", "old", now - Duration::days(8))
        .unwrap();

    let report = backups.cleanup_old_backups(now).unwrap();

    assert_eq!(report.removed.len(), 1);
    assert_eq!(report.files_deleted, 0);
    assert!(backups.list_backups().is_empty());
    dir.assert_file_exists(&old.backup_path);
}

#[test]
fn test_restore_copies_snapshot_back() {
    let dir = TestDataDir::new().with_v4_cv();
    let original = fs::read_to_string(dir.path("base-cv.json")).unwrap();
    let mut backups = manager(&dir, BackupSettings::default());
    let backup = backups.create_backup("base-cv.json", "4.0.0", "manual").unwrap();

    dir.write_raw("base-cv.json", "{}");
    backups.restore_backup(&backup).unwrap();

    assert_eq!(fs::read_to_string(dir.path("base-cv.json")).unwrap(), original);
}

#[test]
fn test_restore_rejects_tampered_snapshot() {
    let dir = TestDataDir::new().with_v4_cv();
    let mut backups = manager(&dir, BackupSettings::default());
    let backup = backups.create_backup("base-cv.json", "4.0.0", "manual").unwrap();

    dir.write_raw(&backup.backup_path, "{\"tampered\": true}");

    assert!(!backups.verify_backup(&backup).unwrap());
    let result = backups.restore_backup(&backup);
    assert!(matches!(result, Err(Error::BackupIntegrity { .. })));
    assert_eq!(dir.read_json("base-cv.json")["metadata"]["version"], "4.0.0");
}
