//! SyncEngine implementation
//!
//! The SyncEngine coordinates the saved index with the files on disk: it
//! detects drift, runs the cascade and sweeps pending entries.

use std::future::Future;
use std::pin::pin;
use std::time::Instant;

use chrono::{DateTime, Utc};
use cvdata_fs::{DataFile, DataLayout, io};
use cvdata_meta::DocumentType;
use serde::{Deserialize, Serialize};

use super::cascade::{DependencyMap, HookLog, SyncHooks};
use super::changes::{Change, ChangeKind, detect_data_changes, scan_drift};
use super::index::{SyncIndex, SyncStatus, fingerprint};
use super::scheduler::{SyncScheduler, Tier, TierSweep};
use crate::config::SyncSettings;
use crate::{Result, scan};

/// Effects of processing one batch of changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSummary {
    pub processed: usize,
    /// Indexed dependencies marked pending
    pub cascade_triggers: usize,
    pub optimizations: usize,
}

/// Contents of `sync-performance-report.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPerformanceReport {
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    pub total_files: usize,
    pub changes: usize,
    /// Entries still pending after the sweep
    pub pending: usize,
    /// Entries synced by this run
    pub completed: usize,
    /// Entries that failed to sync in this run
    pub failed: usize,
    pub cascade_triggers: usize,
}

impl SyncPerformanceReport {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Totals across a `watch` session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchSummary {
    pub iterations: usize,
    pub changes: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Engine for synchronizing the index with the data root
pub struct SyncEngine<H: SyncHooks = HookLog> {
    layout: DataLayout,
    deps: DependencyMap,
    settings: SyncSettings,
    hooks: H,
}

impl SyncEngine<HookLog> {
    /// Engine with the built-in dependency map and logging hooks.
    pub fn new(layout: DataLayout, settings: SyncSettings) -> Self {
        Self::with_hooks(layout, settings, DependencyMap::builtin(), HookLog::new())
    }
}

impl<H: SyncHooks> SyncEngine<H> {
    pub fn with_hooks(
        layout: DataLayout,
        settings: SyncSettings,
        deps: DependencyMap,
        hooks: H,
    ) -> Self {
        Self {
            layout,
            deps,
            settings,
            hooks,
        }
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// Fingerprint every document and write `data-index.json`.
    ///
    /// Every entry starts `pending`.
    pub fn initialize_data_index(&self) -> Result<SyncIndex> {
        let mut index = SyncIndex::new(Utc::now());
        for path in scan::list_documents(&self.layout)? {
            let entry = fingerprint(&self.layout, &path, &self.deps)?;
            index.entries.insert(path, entry);
        }
        index.save(&self.layout)?;
        tracing::info!(files = index.entries.len(), "data index initialized");
        Ok(index)
    }

    pub fn detect_data_changes(&self, index: &SyncIndex) -> Result<Vec<Change>> {
        detect_data_changes(&self.layout, index)
    }

    /// Apply `changes` (critical-first) to `index` and fire hooks.
    ///
    /// Added and modified documents are refreshed and marked completed;
    /// their indexed dependencies become pending. A dependency under
    /// `optimized/` re-triggers optimization of the changed source.
    pub fn process_changes(
        &mut self,
        index: &mut SyncIndex,
        changes: &[Change],
    ) -> Result<ProcessSummary> {
        let mut summary = ProcessSummary::default();
        let now = Utc::now();

        for change in changes {
            let path = change.path.as_str();
            summary.processed += 1;

            if change.kind == ChangeKind::Deleted {
                index.entries.remove(path);
                self.hooks.invalidate_cache(path);
                tracing::info!(path, "document removed from index");
                continue;
            }

            let mut entry = fingerprint(&self.layout, path, &self.deps)?;
            self.hooks.invalidate_cache(path);
            self.hooks.recache(path);
            if entry.doc_type == DocumentType::CoreCv {
                self.hooks.trigger_optimization(path);
                summary.optimizations += 1;
            }
            entry.sync_status = SyncStatus::Completed;
            entry.last_sync = Some(now);
            let dependencies = entry.dependencies.clone();
            index.entries.insert(path.to_string(), entry);

            for dependency in &dependencies {
                if let Some(derived) = index.entries.get_mut(dependency) {
                    derived.sync_status = SyncStatus::Pending;
                    summary.cascade_triggers += 1;
                }
                if dependency.contains("optimized/") {
                    self.hooks.trigger_optimization(path);
                    summary.optimizations += 1;
                }
            }
            tracing::debug!(path, kind = ?change.kind, "change processed");
        }
        Ok(summary)
    }

    /// Sync every pending entry of `tier`.
    ///
    /// Present files are re-fingerprinted and completed; missing files fail.
    /// Failures are not retried.
    pub fn sync_pending(&self, index: &mut SyncIndex, tier: Tier) -> Result<TierSweep> {
        let mut sweep = TierSweep::default();
        let now = Utc::now();

        for (path, entry) in index
            .entries
            .iter_mut()
            .filter(|(_, e)| e.sync_status == SyncStatus::Pending && e.priority.tier() == tier)
        {
            if self.layout.document(path).is_file() {
                let fresh = fingerprint(&self.layout, path, &self.deps)?;
                entry.doc_type = fresh.doc_type;
                entry.checksum = fresh.checksum;
                entry.size = fresh.size;
                entry.last_modified = fresh.last_modified;
                entry.sync_status = SyncStatus::Completed;
                entry.last_sync = Some(now);
                sweep.completed += 1;
            } else {
                tracing::warn!(path, "pending document is missing; marking failed");
                entry.sync_status = SyncStatus::Failed;
                sweep.failed += 1;
            }
        }

        if sweep != TierSweep::default() {
            tracing::debug!(?tier, completed = sweep.completed, failed = sweep.failed, "tier swept");
        }
        Ok(sweep)
    }

    /// One full pass: detect, process, sweep every tier, persist.
    ///
    /// Without a saved index the index is initialized and every document
    /// counts as a change.
    pub fn run(&mut self) -> Result<SyncPerformanceReport> {
        let started = Instant::now();

        let (mut index, changes, processed) = match SyncIndex::load(&self.layout)? {
            None => {
                let index = self.initialize_data_index()?;
                let changes = index.entries.len();
                (index, changes, ProcessSummary::default())
            }
            Some(mut index) => {
                let drift = scan_drift(&self.layout, &index)?;
                drift.refresh_mtimes(&mut index);
                let processed = self.process_changes(&mut index, &drift.changes)?;
                (index, drift.changes.len(), processed)
            }
        };

        let mut total = TierSweep::default();
        for tier in Tier::ALL {
            let sweep = self.sync_pending(&mut index, tier)?;
            total.completed += sweep.completed;
            total.failed += sweep.failed;
        }

        index.generated_at = Utc::now();
        index.save(&self.layout)?;

        let report = SyncPerformanceReport {
            timestamp: Utc::now(),
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            total_files: index.entries.len(),
            changes,
            pending: index.count(SyncStatus::Pending),
            completed: total.completed,
            failed: total.failed,
            cascade_triggers: processed.cascade_triggers,
        };
        io::write_json(&self.layout.file(DataFile::SyncPerformanceReport), &report)?;

        tracing::info!(
            changes = report.changes,
            completed = report.completed,
            failed = report.failed,
            "sync run complete"
        );
        Ok(report)
    }

    /// Continuous mode: one scheduler loop until `shutdown` resolves or
    /// `iterations` ticks have run.
    ///
    /// Each tick detects and processes changes, then sweeps the tiers that
    /// are due and saves the index.
    pub async fn watch<F>(&mut self, iterations: Option<usize>, shutdown: F) -> Result<WatchSummary>
    where
        F: Future<Output = ()>,
    {
        let mut index = match SyncIndex::load(&self.layout)? {
            Some(index) => index,
            None => self.initialize_data_index()?,
        };
        let mut scheduler = SyncScheduler::new(&self.settings, Instant::now());
        let mut summary = WatchSummary::default();
        let mut shutdown = pin!(shutdown);

        tracing::info!(?iterations, "watching data directory");
        while iterations.is_none_or(|limit| summary.iterations < limit) {
            if let Some(wake) = scheduler.next_wakeup() {
                tokio::select! {
                    biased;
                    _ = &mut shutdown => {
                        tracing::info!("shutdown requested");
                        break;
                    }
                    _ = tokio::time::sleep_until(tokio::time::Instant::from_std(wake)) => {}
                }
            }

            let now = Instant::now();
            let drift = scan_drift(&self.layout, &index)?;
            drift.refresh_mtimes(&mut index);
            self.process_changes(&mut index, &drift.changes)?;
            summary.changes += drift.changes.len();

            for tier in scheduler.due_tiers(now) {
                let sweep = self.sync_pending(&mut index, tier)?;
                summary.completed += sweep.completed;
                summary.failed += sweep.failed;
                scheduler.mark_ran(tier, now);
            }

            index.generated_at = Utc::now();
            index.save(&self.layout)?;
            summary.iterations += 1;
        }

        Ok(summary)
    }
}
