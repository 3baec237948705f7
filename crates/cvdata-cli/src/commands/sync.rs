//! Sync command implementations

use colored::Colorize;
use cvdata_core::SyncEngine;
use cvdata_core::sync::{ChangeKind, SyncIndex};

use crate::context::CliContext;
use crate::error::{CliError, Result};

fn engine(ctx: &CliContext) -> SyncEngine {
    SyncEngine::new(ctx.layout.clone(), ctx.settings.sync.clone())
}

/// Rebuild `data-index.json` from the files on disk.
pub fn run_sync_index(ctx: &CliContext) -> Result<()> {
    let index = engine(ctx).initialize_data_index()?;
    println!(
        "{} Indexed {} document(s).",
        "OK".green().bold(),
        index.entries.len()
    );
    Ok(())
}

/// List drift between the saved index and the files.
pub fn run_sync_detect(ctx: &CliContext) -> Result<()> {
    let index = SyncIndex::load(&ctx.layout)?.ok_or_else(|| {
        CliError::user("No data index found. Run `cvdata sync index` first.")
    })?;
    let changes = engine(ctx).detect_data_changes(&index)?;

    if changes.is_empty() {
        println!("{} Index is up to date.", "OK".green().bold());
        return Ok(());
    }

    println!("{} {} change(s):", "=>".blue().bold(), changes.len());
    for change in &changes {
        let marker = match change.kind {
            ChangeKind::Added => "+".green(),
            ChangeKind::Modified => "~".yellow(),
            ChangeKind::Deleted => "-".red(),
        };
        println!(
            "   {} {} ({:?})",
            marker,
            change.path.cyan(),
            change.priority
        );
    }
    Ok(())
}

/// One detect, cascade and sweep pass.
pub fn run_sync_run(ctx: &CliContext) -> Result<()> {
    println!("{} Synchronizing data index...", "=>".blue().bold());
    let report = engine(ctx).run()?;

    println!(
        "   {} change(s), {} cascade trigger(s), {} completed, {} pending",
        report.changes, report.cascade_triggers, report.completed, report.pending
    );
    if report.success() {
        println!(
            "{} Synchronized {} document(s) in {} ms.",
            "OK".green().bold(),
            report.total_files,
            report.duration_ms
        );
        Ok(())
    } else {
        Err(CliError::user(format!(
            "{} document(s) failed to sync",
            report.failed
        )))
    }
}

/// Continuous sync until Ctrl-C or `iterations` ticks.
pub fn run_sync_watch(ctx: &CliContext, iterations: Option<usize>) -> Result<()> {
    println!(
        "{} Watching {} (Ctrl-C to stop)...",
        "=>".blue().bold(),
        ctx.layout.root().as_str().cyan()
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let mut engine = engine(ctx);
    let summary = runtime.block_on(engine.watch(iterations, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }))?;

    println!(
        "{} {} tick(s), {} change(s), {} completed, {} failed.",
        "OK".green().bold(),
        summary.iterations,
        summary.changes,
        summary.completed,
        summary.failed
    );
    if summary.failed == 0 {
        Ok(())
    } else {
        Err(CliError::user(format!(
            "{} document(s) failed to sync",
            summary.failed
        )))
    }
}
