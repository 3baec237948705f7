//! Maintenance engine for the CV data toolkit
//!
//! This crate builds on `cvdata-fs` and `cvdata-meta` and implements:
//!
//! - **Backups**: checksummed snapshots with a retention sweep
//! - **Migrations**: a version graph of strategies applied to documents on disk
//! - **Synchronization**: fingerprint index, change cascade and tiered sweeps
//! - **Validation**: consistency, integrity and relationship scoring
//! - **Monitoring**: freshness and schema currency
//! - **Orchestration**: all of the above as one pipeline with a health score
//!
//! # Architecture
//!
//! ```text
//!                    cvdata-cli
//!                        |
//!                   cvdata-core
//!                        |
//!              +---------+---------+
//!              |                   |
//!          cvdata-fs  <----  cvdata-meta
//! ```

pub mod backup;
pub mod config;
pub mod error;
pub mod migration;
pub mod monitor;
pub mod orchestrator;
pub mod scan;
pub mod sync;
pub mod validator;

pub use backup::{Backup, BackupManager, CleanupReport};
pub use config::{Settings, SettingsResolver};
pub use error::{Error, Result};
pub use migration::{
    MigrateOptions, MigrationEngine, MigrationOutcome, MigrationRegistry, MigrationReport,
    MigrationStrategy, StepKey,
};
pub use monitor::{QualityMonitor, QualityReport};
pub use orchestrator::{MasterReport, Orchestrator, PipelineOptions, Stage, StageResult};
pub use sync::{SyncEngine, SyncIndex, SyncPerformanceReport};
pub use validator::{ArchitectureValidator, ValidationReport};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_error_names_the_file() {
        let error = Error::Rollback {
            file: "base-cv.json".into(),
            message: "no backup recorded at version 3.0.0".into(),
        };
        let display = error.to_string();
        assert!(display.contains("base-cv.json"), "got: {display}");
        assert!(display.contains("3.0.0"), "got: {display}");
    }
}
