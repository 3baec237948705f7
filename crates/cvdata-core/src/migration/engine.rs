//! Applying migrations to documents on disk

use chrono::{DateTime, Utc};
use cvdata_fs::{DataFile, DataLayout, io};
use cvdata_meta::{
    DocumentType, JsonPath, SchemaVersion, VersionSource, extract_version, identify_file_type,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use similar::TextDiff;

use super::registry::MigrationRegistry;
use super::transform::{StepKey, apply_strategy};
use crate::backup::{Backup, BackupManager};
use crate::scan;
use crate::{Error, Result};

/// Options for migration operations
#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    /// Compute the result and a diff without touching disk
    pub dry_run: bool,
}

/// What happened to one file.
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    pub filename: String,
    pub from: SchemaVersion,
    pub to: SchemaVersion,
    pub steps: Vec<StepKey>,
    /// Snapshot taken before the first step; `None` for dry runs and no-ops
    pub backup: Option<Backup>,
    /// The migrated document
    pub document: Value,
    /// Unified diff of the document text, dry runs only
    pub diff: Option<String>,
    pub warnings: Vec<String>,
}

impl MigrationOutcome {
    /// Whether any step ran.
    pub fn changed(&self) -> bool {
        !self.steps.is_empty()
    }
}

/// Per-file row of the migration report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResult {
    pub file: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Migrated,
    Skipped,
    Failed,
}

/// Contents of `migration-report.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub timestamp: DateTime<Utc>,
    pub target_version: String,
    pub migrated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub results: Vec<FileResult>,
}

impl MigrationReport {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Walks documents along registry routes, snapshotting them first.
pub struct MigrationEngine<'a> {
    layout: DataLayout,
    registry: &'a MigrationRegistry,
    backups: BackupManager,
}

impl<'a> MigrationEngine<'a> {
    pub fn new(registry: &'a MigrationRegistry, backups: BackupManager) -> Self {
        Self {
            layout: backups.layout().clone(),
            registry,
            backups,
        }
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Apply `steps` in order to `filename` and write it back in place.
    ///
    /// A backup is taken before anything else. Any failing step aborts
    /// the whole file and leaves it untouched on disk.
    pub fn migrate_file(
        &mut self,
        filename: &str,
        steps: &[StepKey],
        options: &MigrateOptions,
    ) -> Result<MigrationOutcome> {
        let original_text = io::read_text(&self.layout.document(filename))?;
        let original: Value = serde_json::from_str(&original_text).map_err(|e| Error::Parse {
            file: filename.to_string(),
            message: e.to_string(),
        })?;

        let detected = extract_version(&original);
        let mut warnings = Vec::new();
        if detected.source == VersionSource::Fallback {
            warnings.push(format!(
                "{filename}: schema version not recognized, assuming {}",
                detected.version
            ));
        }

        let Some(first) = steps.first() else {
            return Ok(MigrationOutcome {
                filename: filename.to_string(),
                from: detected.version.clone(),
                to: detected.version,
                steps: Vec::new(),
                backup: None,
                document: original,
                diff: None,
                warnings,
            });
        };

        for pair in steps.windows(2) {
            if pair[0].to != pair[1].from {
                return Err(Error::migration(
                    pair[1].to_string(),
                    format!("does not continue from {}", pair[0]),
                ));
            }
        }
        if first.from != detected.version {
            warnings.push(format!(
                "{filename}: detected version {} but path starts at {}",
                detected.version, first.from
            ));
        }
        for warning in &warnings {
            tracing::warn!("{warning}");
        }

        let backup = if options.dry_run {
            None
        } else {
            Some(
                self.backups
                    .create_backup(filename, &detected.version.to_string(), "migration")?,
            )
        };

        let mut document = original.clone();
        for step in steps {
            let strategy = self.registry.require(step)?;
            apply_strategy(&mut document, strategy)?;
            tracing::debug!(file = filename, %step, "step applied");
        }

        let target = steps.last().map_or(&first.to, |s| &s.to).clone();
        stamp(
            &mut document,
            steps,
            &target,
            backup.as_ref().map(|b| b.backup_path.as_str()),
            Utc::now(),
        )
        .map_err(|message| Error::migration(first.to_string(), message))?;

        let mut text = serde_json::to_string_pretty(&document)?;
        text.push('\n');

        let diff = if options.dry_run {
            Some(
                TextDiff::from_lines(original_text.as_str(), text.as_str())
                    .unified_diff()
                    .context_radius(3)
                    .header(filename, &format!("{filename} (migrated)"))
                    .to_string(),
            )
        } else {
            io::write_text(&self.layout.document(filename), &text)?;
            tracing::info!(file = filename, from = %first.from, to = %target, "document migrated");
            None
        };

        Ok(MigrationOutcome {
            filename: filename.to_string(),
            from: first.from.clone(),
            to: target,
            steps: steps.to_vec(),
            backup,
            document,
            diff,
            warnings,
        })
    }

    /// Route `filename` from its detected version to `target` and migrate.
    pub fn migrate_to(
        &mut self,
        filename: &str,
        target: &SchemaVersion,
        options: &MigrateOptions,
    ) -> Result<MigrationOutcome> {
        let document = scan::read_document(&self.layout, filename)?;
        let detected = extract_version(&document);
        let path = self
            .registry
            .calculate_migration_path(&detected.version, target)?;
        self.migrate_file(filename, &path, options)
    }

    /// Restore the newest snapshot of `filename` taken at `target`.
    ///
    /// The current state is snapshotted first so the rollback itself can be
    /// undone. Returns the snapshot that was restored.
    pub fn rollback_file(&mut self, filename: &str, target: &SchemaVersion) -> Result<Backup> {
        let restore = self
            .backups
            .latest_for(filename, &target.to_string())
            .cloned()
            .ok_or_else(|| Error::Rollback {
                file: filename.to_string(),
                message: format!("no backup recorded at version {target}"),
            })?;

        let current = scan::read_document(&self.layout, filename)
            .map(|doc| extract_version(&doc).version.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        self.backups
            .create_backup(filename, &current, "pre-rollback")?;

        self.backups.restore_backup(&restore)?;
        tracing::info!(file = filename, from = %current, to = %target, "document rolled back");
        Ok(restore)
    }

    /// Migrate every CV document behind `target` and write the report.
    ///
    /// Per-file failures are recorded, never propagated. Dry runs do not
    /// write the report.
    pub fn run(&mut self, target: &SchemaVersion, options: &MigrateOptions) -> Result<MigrationReport> {
        let mut results = Vec::new();

        for file in scan::list_documents(&self.layout)? {
            let result = match scan::read_document(&self.layout, &file) {
                Err(e) => failed(&file, None, e),
                Ok(document) => {
                    let doc_type = identify_file_type(&file, &document).doc_type;
                    let version = extract_version(&document).version;
                    if doc_type != DocumentType::CoreCv {
                        skipped(&file, None, format!("{doc_type} documents are not versioned"))
                    } else if version >= *target {
                        skipped(&file, Some(&version), "up to date".to_string())
                    } else {
                        match self.migrate_to(&file, target, options) {
                            Ok(outcome) => FileResult {
                                file: file.clone(),
                                status: FileStatus::Migrated,
                                from: Some(outcome.from.to_string()),
                                to: Some(outcome.to.to_string()),
                                steps: outcome.steps.iter().map(ToString::to_string).collect(),
                                backup: outcome.backup.map(|b| b.backup_path),
                                message: (!outcome.warnings.is_empty())
                                    .then(|| outcome.warnings.join("; ")),
                            },
                            Err(e) => failed(&file, Some(&version), e),
                        }
                    }
                }
            };
            results.push(result);
        }

        let count = |status: FileStatus| results.iter().filter(|r| r.status == status).count();
        let report = MigrationReport {
            timestamp: Utc::now(),
            target_version: target.to_string(),
            migrated: count(FileStatus::Migrated),
            skipped: count(FileStatus::Skipped),
            failed: count(FileStatus::Failed),
            results,
        };

        if !options.dry_run {
            io::write_json(&self.layout.file(DataFile::MigrationReport), &report)?;
        }
        tracing::info!(
            migrated = report.migrated,
            skipped = report.skipped,
            failed = report.failed,
            "migration run complete"
        );
        Ok(report)
    }
}

fn skipped(file: &str, version: Option<&SchemaVersion>, message: String) -> FileResult {
    FileResult {
        file: file.to_string(),
        status: FileStatus::Skipped,
        from: version.map(ToString::to_string),
        to: None,
        steps: Vec::new(),
        backup: None,
        message: Some(message),
    }
}

fn failed(file: &str, version: Option<&SchemaVersion>, error: Error) -> FileResult {
    tracing::warn!(file, error = %error, "migration failed");
    FileResult {
        file: file.to_string(),
        status: FileStatus::Failed,
        from: version.map(ToString::to_string),
        to: None,
        steps: Vec::new(),
        backup: None,
        message: Some(error.to_string()),
    }
}

// Version stamps plus one history entry per step.
fn stamp(
    document: &mut Value,
    steps: &[StepKey],
    target: &SchemaVersion,
    backup: Option<&str>,
    now: DateTime<Utc>,
) -> std::result::Result<(), String> {
    let set = |doc: &mut Value, path: &str, value: Value| {
        if JsonPath::parse(path).insert(doc, value) {
            Ok(())
        } else {
            Err(format!("cannot write {path}"))
        }
    };

    set(document, "metadata.version", json!(target.to_string()))?;
    set(document, "metadata.schema_version", json!(target.to_string()))?;
    set(document, "metadata.last_updated", json!(now.to_rfc3339()))?;

    let history_path = JsonPath::parse("metadata.migration_history");
    if !history_path.get(document).is_some_and(Value::is_array) {
        set(document, "metadata.migration_history", json!([]))?;
    }
    let route: Vec<String> = steps.iter().map(ToString::to_string).collect();
    let Some(Value::Array(history)) = history_path.get_mut(document) else {
        return Err("cannot write metadata.migration_history".to_string());
    };
    for step in steps {
        history.push(json!({
            "from": step.from.to_string(),
            "to": step.to.to_string(),
            "path": route,
            "timestamp": now.to_rfc3339(),
            "backup": backup,
        }));
    }
    Ok(())
}
