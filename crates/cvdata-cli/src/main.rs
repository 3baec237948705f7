//! CV data toolkit CLI
//!
//! The `cvdata` binary: one subcommand per subsystem plus the orchestrated
//! pipeline. Exit status is 0 on success and 1 on any failure.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{BackupAction, Cli, Commands, SyncAction};
use context::CliContext;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        println!("{} CV data toolkit", "cvdata".green().bold());
        println!();
        println!("Run {} for available commands.", "cvdata --help".cyan());
        return Ok(());
    };

    let cwd = std::env::current_dir()?;
    let ctx = CliContext::load(&cwd, cli.data_dir.as_deref(), cli.config.as_deref())?;
    execute_command(&ctx, command)
}

// Logs go to stderr; `-v` forces debug, otherwise RUST_LOG applies.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("verbose mode enabled");
}

fn execute_command(ctx: &CliContext, command: Commands) -> Result<()> {
    match command {
        Commands::Validate { json } => commands::run_validate(ctx, json),
        Commands::Migrate { to, file, dry_run } => {
            commands::run_migrate(ctx, to.as_deref(), file.as_deref(), dry_run)
        }
        Commands::Rollback { file, to } => commands::run_rollback(ctx, &file, &to),
        Commands::Backup { action } => match action {
            BackupAction::Create { file, reason } => {
                commands::run_backup_create(ctx, &file, &reason)
            }
            BackupAction::List => commands::run_backup_list(ctx),
            BackupAction::Cleanup => commands::run_backup_cleanup(ctx),
            BackupAction::Restore { id } => commands::run_backup_restore(ctx, &id),
        },
        Commands::Sync { action } => match action {
            SyncAction::Index => commands::run_sync_index(ctx),
            SyncAction::Detect => commands::run_sync_detect(ctx),
            SyncAction::Run => commands::run_sync_run(ctx),
            SyncAction::Watch { iterations } => commands::run_sync_watch(ctx, iterations),
        },
        Commands::Monitor => commands::run_monitor(ctx),
        Commands::Run { fail_fast, json } => commands::run_pipeline(ctx, fail_fast, json),
    }
}
