//! The full maintenance pipeline
//!
//! Stages run in a fixed order. A failing stage does not stop the pipeline
//! unless `continue_on_error` is off; the master report weighs validator,
//! stage reliability and monitor results into one health score.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use cvdata_fs::{DataFile, DataLayout, io};
use cvdata_meta::{RuleCatalog, SchemaVersion, extract_version};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::backup::BackupManager;
use crate::config::Settings;
use crate::migration::{MigrateOptions, MigrationEngine, MigrationRegistry};
use crate::monitor::QualityMonitor;
use crate::scan;
use crate::sync::SyncEngine;
use crate::validator::ArchitectureValidator;

const CONSISTENCY_WEIGHT: f64 = 0.30;
const RELIABILITY_WEIGHT: f64 = 0.25;
const FRESHNESS_WEIGHT: f64 = 0.20;
const SCHEMA_WEIGHT: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Backup,
    Migrator,
    Validator,
    Synchronizer,
    Monitor,
}

impl Stage {
    /// Execution order.
    pub const ALL: [Stage; 5] = [
        Self::Backup,
        Self::Migrator,
        Self::Validator,
        Self::Synchronizer,
        Self::Monitor,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Backup => "backup",
            Self::Migrator => "migrator",
            Self::Validator => "validator",
            Self::Synchronizer => "synchronizer",
            Self::Monitor => "monitor",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: Stage,
    pub success: bool,
    /// Not run because an earlier stage failed
    pub skipped: bool,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Component scores, each 0-100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthScores {
    pub consistency: f64,
    /// Share of stages that succeeded
    pub reliability: f64,
    pub freshness: f64,
    pub schema: f64,
    pub overall: f64,
}

/// Contents of `data-architecture-master-report.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterReport {
    pub timestamp: DateTime<Utc>,
    /// Every stage succeeded
    pub overall_success: bool,
    pub health_threshold: f64,
    pub health: HealthScores,
    /// `overall_success` and health at or above the threshold
    pub passed: bool,
    pub stages: Vec<StageResult>,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub continue_on_error: bool,
}

impl PipelineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            continue_on_error: settings.orchestrator.continue_on_error,
        }
    }
}

// What a stage hands back besides success.
#[derive(Default)]
struct Collected {
    consistency: Option<f64>,
    freshness: Option<f64>,
    schema: Option<f64>,
}

/// Runs backup, migration, validation, synchronization and monitoring.
pub struct Orchestrator<'a> {
    layout: DataLayout,
    settings: Settings,
    catalog: &'a RuleCatalog,
    registry: &'a MigrationRegistry,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        layout: DataLayout,
        settings: Settings,
        catalog: &'a RuleCatalog,
        registry: &'a MigrationRegistry,
    ) -> Self {
        Self {
            layout,
            settings,
            catalog,
            registry,
        }
    }

    /// Run every stage and write the master report.
    pub fn run(&self, options: &PipelineOptions) -> Result<MasterReport> {
        let mut stages = Vec::new();
        let mut collected = Collected::default();
        let mut halted = false;

        for stage in Stage::ALL {
            if halted {
                stages.push(StageResult {
                    stage,
                    success: false,
                    skipped: true,
                    duration_ms: 0,
                    summary: None,
                    error: None,
                });
                continue;
            }

            tracing::info!(%stage, "stage starting");
            let started = Instant::now();
            let outcome = self.run_stage(stage, &mut collected);
            let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            let result = match outcome {
                Ok((success, summary)) => StageResult {
                    stage,
                    success,
                    skipped: false,
                    duration_ms,
                    summary: Some(summary),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(%stage, error = %e, "stage failed");
                    StageResult {
                        stage,
                        success: false,
                        skipped: false,
                        duration_ms,
                        summary: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            if !result.success && !options.continue_on_error {
                tracing::warn!(%stage, "halting pipeline");
                halted = true;
            }
            stages.push(result);
        }

        let succeeded = stages.iter().filter(|s| s.success).count();
        let reliability = succeeded as f64 * 100.0 / stages.len() as f64;
        let mut health = HealthScores {
            consistency: collected.consistency.unwrap_or(0.0),
            reliability,
            freshness: collected.freshness.unwrap_or(0.0),
            schema: collected.schema.unwrap_or(0.0),
            overall: 0.0,
        };
        health.overall = ((CONSISTENCY_WEIGHT * health.consistency
            + RELIABILITY_WEIGHT * health.reliability
            + FRESHNESS_WEIGHT * health.freshness
            + SCHEMA_WEIGHT * health.schema)
            * 100.0)
            .round()
            / 100.0;

        let threshold = self.settings.orchestrator.health_threshold;
        let overall_success = succeeded == stages.len();
        let report = MasterReport {
            timestamp: Utc::now(),
            overall_success,
            health_threshold: threshold,
            health,
            passed: overall_success && health.overall >= threshold,
            stages,
        };
        io::write_json(&self.layout.file(DataFile::MasterReport), &report)?;

        tracing::info!(
            health = report.health.overall,
            passed = report.passed,
            "pipeline complete"
        );
        Ok(report)
    }

    fn run_stage(&self, stage: Stage, collected: &mut Collected) -> Result<(bool, String)> {
        match stage {
            Stage::Backup => self.backup_stage(),
            Stage::Migrator => {
                let backups = BackupManager::open(self.layout.clone(), self.settings.backup.clone())?;
                let mut engine = MigrationEngine::new(self.registry, backups);
                let report = engine.run(&SchemaVersion::current(), &MigrateOptions::default())?;
                Ok((
                    report.success(),
                    format!(
                        "{} migrated, {} skipped, {} failed",
                        report.migrated, report.skipped, report.failed
                    ),
                ))
            }
            Stage::Validator => {
                let report = ArchitectureValidator::new(self.layout.clone(), self.catalog).run()?;
                collected.consistency = Some(report.consistency);
                Ok((
                    report.passed(self.settings.orchestrator.health_threshold),
                    format!("overall {:.2}, {} errors", report.overall, report.errors.len()),
                ))
            }
            Stage::Synchronizer => {
                let report = SyncEngine::new(self.layout.clone(), self.settings.sync.clone()).run()?;
                Ok((
                    report.success(),
                    format!(
                        "{} changes, {} completed, {} failed",
                        report.changes, report.completed, report.failed
                    ),
                ))
            }
            Stage::Monitor => {
                let report =
                    QualityMonitor::new(self.layout.clone(), self.settings.monitor.clone()).run()?;
                collected.freshness = Some(report.freshness);
                collected.schema = Some(report.schema);
                Ok((
                    true,
                    format!("freshness {:.2}, schema {:.2}", report.freshness, report.schema),
                ))
            }
        }
    }

    // Snapshot every input document, then sweep expired snapshots.
    fn backup_stage(&self) -> Result<(bool, String)> {
        let mut manager = BackupManager::open(self.layout.clone(), self.settings.backup.clone())?;
        let mut created = 0;
        for input in DataFile::INPUTS {
            if !self.layout.file(input).is_file() {
                continue;
            }
            let version = scan::read_document(&self.layout, input.as_str())
                .map(|doc| extract_version(&doc).version.to_string())
                .unwrap_or_else(|_| "unknown".to_string());
            manager.create_backup(input.as_str(), &version, "pipeline")?;
            created += 1;
        }
        let cleanup = manager.cleanup_old_backups(Utc::now())?;
        Ok((
            true,
            format!("{created} snapshots, {} expired", cleanup.removed.len()),
        ))
    }
}
