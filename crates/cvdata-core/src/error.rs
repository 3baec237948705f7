//! Error types for cvdata-core

use std::path::PathBuf;

/// Result type for cvdata-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cvdata-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A migration step could not be found, applied or verified
    #[error("Migration error in {step}: {message}")]
    Migration { step: String, message: String },

    /// No migration route exists between two versions
    #[error("No migration path from {from} to {to}")]
    NoMigrationPath { from: String, to: String },

    /// A rollback target has no matching snapshot
    #[error("Rollback error for {file}: {message}")]
    Rollback { file: String, message: String },

    /// A snapshot no longer matches its recorded checksum
    #[error("Backup {id} is corrupt: expected {expected}, found {actual}")]
    BackupIntegrity {
        id: String,
        expected: String,
        actual: String,
    },

    /// Backup lookup by id failed
    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    /// A document could not be read as JSON
    #[error("Failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    /// A document expected on disk is missing
    #[error("Document not found: {path}")]
    DocumentNotFound { path: PathBuf },

    /// Invalid settings file
    #[error("Invalid configuration at {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from cvdata-fs
    #[error(transparent)]
    Fs(#[from] cvdata_fs::Error),

    /// Metadata error from cvdata-meta
    #[error(transparent)]
    Meta(#[from] cvdata_meta::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn migration(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Migration {
            step: step.into(),
            message: message.into(),
        }
    }
}
