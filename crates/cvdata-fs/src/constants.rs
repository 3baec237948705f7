//! Well-known file names inside the data directory.

use std::path::Path;

/// Name of the snapshot directory under the data root.
pub const BACKUPS_DIR: &str = "backups";

/// Documents and generated artifacts that live at the data root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFile {
    /// Core CV document
    BaseCv,
    /// GitHub activity summary
    ActivitySummary,
    /// AI-generated content enhancements
    AiEnhancements,
    /// Content protection rules
    ProtectedContent,
    /// Persisted synchronization index
    DataIndex,
    /// Backup registry
    BackupRegistry,
    /// Output of the migration run
    MigrationReport,
    /// Output of the synchronization run
    SyncPerformanceReport,
    /// Output of the architecture validator
    ValidationReport,
    /// Output of the orchestrator
    MasterReport,
    /// Output of the quality monitor
    QualityReport,
}

impl DataFile {
    /// Source documents, in processing order.
    pub const INPUTS: [DataFile; 4] = [
        Self::BaseCv,
        Self::ActivitySummary,
        Self::AiEnhancements,
        Self::ProtectedContent,
    ];

    /// Files written by the toolkit itself.
    pub const GENERATED: [DataFile; 7] = [
        Self::DataIndex,
        Self::BackupRegistry,
        Self::MigrationReport,
        Self::SyncPerformanceReport,
        Self::ValidationReport,
        Self::MasterReport,
        Self::QualityReport,
    ];

    /// Get the file name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BaseCv => "base-cv.json",
            Self::ActivitySummary => "activity-summary.json",
            Self::AiEnhancements => "ai-enhancements.json",
            Self::ProtectedContent => "protected-content.json",
            Self::DataIndex => "data-index.json",
            Self::BackupRegistry => "backup-registry.json",
            Self::MigrationReport => "migration-report.json",
            Self::SyncPerformanceReport => "sync-performance-report.json",
            Self::ValidationReport => "data-architecture-validation-report.json",
            Self::MasterReport => "data-architecture-master-report.json",
            Self::QualityReport => "quality-report.json",
        }
    }

    /// Whether the toolkit owns this file (never validated or migrated).
    pub fn is_generated(&self) -> bool {
        Self::GENERATED.contains(self)
    }

    /// Look up a well-known file by its name.
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::INPUTS
            .iter()
            .chain(Self::GENERATED.iter())
            .copied()
            .find(|f| f.as_str() == name)
    }
}

impl AsRef<Path> for DataFile {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for DataFile {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for DataFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
