//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CV data toolkit - validate, migrate, back up and synchronize CV data
#[derive(Parser, Debug)]
#[command(name = "cvdata")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Data directory (defaults to `data_dir` from cvdata.toml)
    #[arg(long, global = true, env = "CVDATA_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Settings file to use instead of ./cvdata.toml
    #[arg(long, global = true, env = "CVDATA_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Score every document and cross-document reference
    Validate {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Migrate CV documents to a schema version
    ///
    /// Examples:
    ///   cvdata migrate                        # Everything to the current schema
    ///   cvdata migrate --file base-cv.json    # One document
    ///   cvdata migrate --dry-run              # Show the diff only
    Migrate {
        /// Target schema version (defaults to the current one)
        #[arg(long)]
        to: Option<String>,

        /// Migrate only this document
        #[arg(long)]
        file: Option<String>,

        /// Preview changes without writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Restore a document from its newest backup at a version
    Rollback {
        /// Document path relative to the data directory
        file: String,

        /// Version to restore
        #[arg(long)]
        to: String,
    },

    /// Manage document snapshots
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Keep the data index in step with the files
    Sync {
        #[command(subcommand)]
        action: SyncAction,
    },

    /// Report freshness and schema currency
    Monitor,

    /// Run the full maintenance pipeline
    Run {
        /// Stop at the first failing stage
        #[arg(long)]
        fail_fast: bool,

        /// Print the master report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Backup subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum BackupAction {
    /// Snapshot a document
    Create {
        /// Document path relative to the data directory
        file: String,

        /// Why the snapshot was taken
        #[arg(long, default_value = "manual")]
        reason: String,
    },
    /// List recorded snapshots
    List,
    /// Remove snapshots older than the retention window
    Cleanup,
    /// Restore a snapshot by id (or unambiguous id prefix)
    Restore {
        id: String,
    },
}

/// Sync subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Rebuild the data index from scratch
    Index,
    /// List documents that drifted from the index
    Detect,
    /// Detect, cascade and sweep once
    Run,
    /// Keep syncing on the tier schedule until interrupted
    Watch {
        /// Stop after this many ticks
        #[arg(long)]
        iterations: Option<usize>,
    },
}
