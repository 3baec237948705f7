//! Backup command implementations

use chrono::Utc;
use colored::Colorize;
use cvdata_core::{BackupManager, scan};
use cvdata_meta::extract_version;

use crate::context::CliContext;
use crate::error::Result;

fn open(ctx: &CliContext) -> Result<BackupManager> {
    Ok(BackupManager::open(
        ctx.layout.clone(),
        ctx.settings.backup.clone(),
    )?)
}

/// Snapshot `file`, tagging it with its detected schema version.
pub fn run_backup_create(ctx: &CliContext, file: &str, reason: &str) -> Result<()> {
    let version = scan::read_document(&ctx.layout, file)
        .map(|doc| extract_version(&doc).version.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let backup = open(ctx)?.create_backup(file, &version, reason)?;
    println!(
        "{} Backed up {} ({}) to {}",
        "OK".green().bold(),
        file.cyan(),
        version,
        backup.backup_path.dimmed()
    );
    println!("   id {}", backup.id);
    Ok(())
}

pub fn run_backup_list(ctx: &CliContext) -> Result<()> {
    let manager = open(ctx)?;
    let backups = manager.list_backups();
    if backups.is_empty() {
        println!("No backups recorded.");
        return Ok(());
    }

    println!("{} {} backup(s):", "=>".blue().bold(), backups.len());
    for backup in backups {
        let id = backup.id.to_string();
        println!(
            "   {} {} {:<8} {:<12} {}",
            id.get(..8).unwrap_or(&id).yellow(),
            backup.timestamp.format("%Y-%m-%d %H:%M:%S"),
            backup.version,
            backup.reason,
            backup.original_path.cyan()
        );
    }
    Ok(())
}

/// Apply the retention window.
pub fn run_backup_cleanup(ctx: &CliContext) -> Result<()> {
    let mut manager = open(ctx)?;
    let report = manager.cleanup_old_backups(Utc::now())?;

    if report.removed.is_empty() {
        println!("{} No expired backups.", "OK".green().bold());
    } else {
        println!(
            "{} Removed {} expired backup(s), {} file(s) deleted, {} retained.",
            "OK".green().bold(),
            report.removed.len(),
            report.files_deleted,
            report.retained
        );
        for backup in &report.removed {
            println!("   {} {}", "-".yellow(), backup.backup_path);
        }
    }
    Ok(())
}

/// Restore the snapshot with id (or id prefix) `id`.
pub fn run_backup_restore(ctx: &CliContext, id: &str) -> Result<()> {
    let manager = open(ctx)?;
    let backup = manager.find(id)?;
    manager.restore_backup(backup)?;
    println!(
        "{} Restored {} from {}",
        "OK".green().bold(),
        backup.original_path.cyan(),
        backup.backup_path.dimmed()
    );
    Ok(())
}
