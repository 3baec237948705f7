//! Migrate and rollback command implementations

use colored::Colorize;
use cvdata_core::migration::{FileStatus, MigrateOptions, MigrationEngine, MigrationRegistry};
use cvdata_core::BackupManager;
use cvdata_meta::SchemaVersion;

use crate::context::CliContext;
use crate::error::{CliError, Result};

fn parse_version(raw: Option<&str>) -> Result<SchemaVersion> {
    match raw {
        Some(raw) => Ok(SchemaVersion::parse(raw)?),
        None => Ok(SchemaVersion::current()),
    }
}

/// Migrate one document, or every CV document, to `to`.
pub fn run_migrate(
    ctx: &CliContext,
    to: Option<&str>,
    file: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let target = parse_version(to)?;
    let registry = MigrationRegistry::with_builtins();
    let backups = BackupManager::open(ctx.layout.clone(), ctx.settings.backup.clone())?;
    let mut engine = MigrationEngine::new(&registry, backups);
    let options = MigrateOptions { dry_run };

    let verb = if dry_run { "Previewing migration" } else { "Migrating" };
    println!("{} {verb} to schema {target}...", "=>".blue().bold());

    if let Some(file) = file {
        let outcome = engine.migrate_to(file, &target, &options)?;
        for warning in &outcome.warnings {
            println!("   {} {}", "!".yellow(), warning);
        }
        if !outcome.changed() {
            println!("{} {} is already at {}.", "OK".green().bold(), file.cyan(), outcome.to);
            return Ok(());
        }
        if let Some(diff) = &outcome.diff {
            print!("{diff}");
        }
        println!(
            "{} {} {} -> {}",
            "OK".green().bold(),
            file.cyan(),
            outcome.from,
            outcome.to
        );
        if let Some(backup) = &outcome.backup {
            println!("   {} backup {}", "+".green(), backup.backup_path.dimmed());
        }
        return Ok(());
    }

    let report = engine.run(&target, &options)?;
    for result in &report.results {
        let marker = match result.status {
            FileStatus::Migrated => "+".green(),
            FileStatus::Skipped => "-".dimmed(),
            FileStatus::Failed => "!".red(),
        };
        let detail = match (&result.from, &result.to) {
            (Some(from), Some(to)) => format!("{from} -> {to}"),
            _ => result.message.clone().unwrap_or_default(),
        };
        println!("   {} {} {}", marker, result.file.cyan(), detail);
    }
    println!();

    if report.success() {
        println!(
            "{} {} migrated, {} skipped.",
            "OK".green().bold(),
            report.migrated,
            report.skipped
        );
        Ok(())
    } else {
        Err(CliError::user(format!(
            "{} document(s) failed to migrate",
            report.failed
        )))
    }
}

/// Restore `file` from its newest backup taken at `to`.
pub fn run_rollback(ctx: &CliContext, file: &str, to: &str) -> Result<()> {
    let target = SchemaVersion::parse(to)?;
    println!("{} Rolling back {} to {target}...", "=>".blue().bold(), file.cyan());

    let registry = MigrationRegistry::with_builtins();
    let backups = BackupManager::open(ctx.layout.clone(), ctx.settings.backup.clone())?;
    let mut engine = MigrationEngine::new(&registry, backups);
    let restored = engine.rollback_file(file, &target)?;

    println!(
        "{} Restored {} from {}",
        "OK".green().bold(),
        file.cyan(),
        restored.backup_path.dimmed()
    );
    Ok(())
}
