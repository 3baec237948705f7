//! Document snapshots
//!
//! Every mutating operation copies the document aside first. Snapshots live
//! under `backups/` and are listed in `backup-registry.json`, one row per
//! backup event. Restoring a snapshot is the only undo mechanism.

use chrono::{DateTime, Utc};
use cvdata_fs::checksum::{compute_bytes_checksum, compute_file_checksum};
use cvdata_fs::{DataFile, DataLayout, NormalizedPath, io};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::BackupSettings;
use crate::{Error, Result};

const REGISTRY_FORMAT: &str = "1.0";

/// An immutable snapshot of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backup {
    pub id: Uuid,
    /// Document path relative to the data root
    pub original_path: String,
    /// Snapshot path relative to the data root
    pub backup_path: String,
    /// Schema version of the document when the snapshot was taken
    pub version: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    pub checksum: String,
    pub size: u64,
}

/// On-disk form of `backup-registry.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BackupRegistry {
    version: String,
    backups: Vec<Backup>,
}

impl Default for BackupRegistry {
    fn default() -> Self {
        Self {
            version: REGISTRY_FORMAT.to_string(),
            backups: Vec::new(),
        }
    }
}

/// Result of a retention sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Registry entries dropped
    pub removed: Vec<Backup>,
    /// Snapshot files deleted from disk
    pub files_deleted: usize,
    /// Entries still in the registry
    pub retained: usize,
}

/// Creates, lists, verifies and restores snapshots.
pub struct BackupManager {
    layout: DataLayout,
    settings: BackupSettings,
    registry: BackupRegistry,
}

impl BackupManager {
    /// Load the registry for `layout`, starting empty when none exists.
    pub fn open(layout: DataLayout, settings: BackupSettings) -> Result<Self> {
        let path = layout.file(DataFile::BackupRegistry);
        let registry = if path.is_file() {
            io::read_json(&path)?
        } else {
            BackupRegistry::default()
        };
        tracing::debug!(entries = registry.backups.len(), "backup registry loaded");
        Ok(Self {
            layout,
            settings,
            registry,
        })
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// Snapshot `file` (relative to the data root) now.
    pub fn create_backup(&mut self, file: &str, version: &str, reason: &str) -> Result<Backup> {
        self.create_backup_at(file, version, reason, Utc::now())
    }

    /// Snapshot `file` with an explicit timestamp.
    pub fn create_backup_at(
        &mut self,
        file: &str,
        version: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Backup> {
        let source = self.layout.document(file);
        if !source.is_file() {
            return Err(Error::DocumentNotFound {
                path: source.to_native(),
            });
        }
        let content = io::read_bytes(&source)?;

        let snapshot = self.snapshot_path(file, version, now);
        io::write_atomic(&snapshot, &content)?;

        let backup = Backup {
            id: Uuid::new_v4(),
            original_path: file.to_string(),
            backup_path: self.layout.relative(&snapshot),
            version: version.to_string(),
            reason: reason.to_string(),
            timestamp: now,
            checksum: compute_bytes_checksum(&content),
            size: content.len() as u64,
        };
        self.registry.backups.push(backup.clone());
        self.save()?;

        tracing::info!(file, backup = %backup.backup_path, reason, "backup created");
        Ok(backup)
    }

    // backups/<name>.backup.<version>.<millis>, bumped until unused
    fn snapshot_path(&self, file: &str, version: &str, now: DateTime<Utc>) -> NormalizedPath {
        let name = NormalizedPath::new(file)
            .file_name()
            .unwrap_or(file)
            .to_string();
        let mut stamp = now.timestamp_millis();
        loop {
            let candidate = self
                .layout
                .backups_dir()
                .join(&format!("{name}.backup.{version}.{stamp}"));
            if !candidate.exists() {
                return candidate;
            }
            stamp += 1;
        }
    }

    /// All registry entries, oldest first.
    pub fn list_backups(&self) -> &[Backup] {
        &self.registry.backups
    }

    /// Entries for one document, oldest first.
    pub fn backups_for(&self, file: &str) -> Vec<&Backup> {
        self.registry
            .backups
            .iter()
            .filter(|b| b.original_path == file)
            .collect()
    }

    /// Newest snapshot of `file` taken at `version`.
    pub fn latest_for(&self, file: &str, version: &str) -> Option<&Backup> {
        self.registry
            .backups
            .iter()
            .filter(|b| b.original_path == file && b.version == version)
            .max_by_key(|b| b.timestamp)
    }

    /// Look up an entry by id or unambiguous id prefix.
    pub fn find(&self, id: &str) -> Result<&Backup> {
        let mut matches = self
            .registry
            .backups
            .iter()
            .filter(|b| b.id.to_string().starts_with(id));
        match (matches.next(), matches.next()) {
            (Some(backup), None) if !id.is_empty() => Ok(backup),
            _ => Err(Error::BackupNotFound(id.to_string())),
        }
    }

    /// Recompute the snapshot checksum and compare with the registry.
    ///
    /// A missing snapshot file counts as not intact.
    pub fn verify_backup(&self, backup: &Backup) -> Result<bool> {
        let snapshot = self.layout.document(&backup.backup_path);
        if !snapshot.is_file() {
            return Ok(false);
        }
        Ok(compute_file_checksum(&snapshot.to_native())? == backup.checksum)
    }

    /// Copy a verified snapshot back over its original path.
    pub fn restore_backup(&self, backup: &Backup) -> Result<()> {
        let snapshot = self.layout.document(&backup.backup_path);
        let content = io::read_bytes(&snapshot)?;

        let actual = compute_bytes_checksum(&content);
        if actual != backup.checksum {
            return Err(Error::BackupIntegrity {
                id: backup.id.to_string(),
                expected: backup.checksum.clone(),
                actual,
            });
        }

        io::write_atomic(&self.layout.document(&backup.original_path), &content)?;
        tracing::info!(file = %backup.original_path, backup = %backup.backup_path, "backup restored");
        Ok(())
    }

    /// Drop entries older than the retention window.
    ///
    /// Snapshot files are unlinked too unless `keep_files` is set.
    pub fn cleanup_old_backups(&mut self, now: DateTime<Utc>) -> Result<CleanupReport> {
        let cutoff = now - self.settings.retention();
        let (expired, kept): (Vec<Backup>, Vec<Backup>) = std::mem::take(&mut self.registry.backups)
            .into_iter()
            .partition(|b| b.timestamp < cutoff);
        self.registry.backups = kept;

        let mut files_deleted = 0;
        if !self.settings.keep_files {
            for backup in &expired {
                let snapshot = self.layout.document(&backup.backup_path);
                if snapshot.is_file() {
                    std::fs::remove_file(snapshot.to_native())
                        .map_err(|e| cvdata_fs::Error::io(snapshot.to_native(), e))?;
                    files_deleted += 1;
                }
            }
        }

        if !expired.is_empty() {
            self.save()?;
            tracing::info!(
                removed = expired.len(),
                files_deleted,
                "expired backups swept"
            );
        }

        Ok(CleanupReport {
            retained: self.registry.backups.len(),
            removed: expired,
            files_deleted,
        })
    }

    fn save(&self) -> Result<()> {
        io::write_json(&self.layout.file(DataFile::BackupRegistry), &self.registry)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn setup() -> (TempDir, BackupManager) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("base-cv.json"), "{\"a\": 1}\n").unwrap();
        let layout = DataLayout::new(NormalizedPath::new(dir.path()));
        let manager = BackupManager::open(layout, BackupSettings::default()).unwrap();
        (dir, manager)
    }

    #[test]
    fn snapshot_name_carries_version_and_millis() {
        let (_dir, mut manager) = setup();
        let now = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();

        let backup = manager
            .create_backup_at("base-cv.json", "3.0.0", "test", now)
            .unwrap();

        assert_eq!(
            backup.backup_path,
            "backups/base-cv.json.backup.3.0.0.1700000000123"
        );
    }

    #[test]
    fn same_millisecond_does_not_overwrite() {
        let (_dir, mut manager) = setup();
        let now = Utc::now();

        let first = manager.create_backup_at("base-cv.json", "3.0.0", "a", now).unwrap();
        let second = manager.create_backup_at("base-cv.json", "3.0.0", "b", now).unwrap();

        assert_ne!(first.backup_path, second.backup_path);
        assert_eq!(manager.list_backups().len(), 2);
    }

    #[test]
    fn latest_for_picks_newest_matching_version() {
        let (_dir, mut manager) = setup();
        let now = Utc::now();
        manager
            .create_backup_at("base-cv.json", "3.0.0", "old", now - Duration::hours(2))
            .unwrap();
        let newest = manager
            .create_backup_at("base-cv.json", "3.0.0", "new", now - Duration::hours(1))
            .unwrap();
        manager.create_backup_at("base-cv.json", "3.1.0", "other", now).unwrap();

        assert_eq!(manager.latest_for("base-cv.json", "3.0.0"), Some(&newest));
        assert!(manager.latest_for("base-cv.json", "9.9.9").is_none());
    }

    #[test]
    fn find_accepts_unique_prefix() {
        let (_dir, mut manager) = setup();
        let backup = manager.create_backup("base-cv.json", "3.0.0", "x").unwrap();
        let prefix = &backup.id.to_string()[..8];

        assert_eq!(manager.find(prefix).unwrap().id, backup.id);
        assert!(matches!(manager.find(""), Err(Error::BackupNotFound(_))));
        assert!(matches!(manager.find("zzzz"), Err(Error::BackupNotFound(_))));
    }

    #[test]
    fn missing_source_is_an_error() {
        let (_dir, mut manager) = setup();
        let result = manager.create_backup("nope.json", "3.0.0", "x");
        assert!(matches!(result, Err(Error::DocumentNotFound { .. })));
        assert!(manager.list_backups().is_empty());
    }
}
