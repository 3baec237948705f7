//! Data directory layout
//!
//! Resolves where documents, generated reports and backup snapshots live
//! relative to a data root.

use crate::constants::{BACKUPS_DIR, DataFile};
use crate::{Error, NormalizedPath, Result};

/// Layout of a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: NormalizedPath,
}

impl DataLayout {
    /// Create a layout rooted at `root`.
    pub fn new(root: impl Into<NormalizedPath>) -> Self {
        Self { root: root.into() }
    }

    /// Create a layout and check the root exists.
    pub fn open(root: impl Into<NormalizedPath>) -> Result<Self> {
        let layout = Self::new(root);
        if !layout.root.is_dir() {
            return Err(Error::DataDirMissing {
                path: layout.root.to_native(),
            });
        }
        Ok(layout)
    }

    /// The data root.
    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// Path of a well-known file.
    pub fn file(&self, file: DataFile) -> NormalizedPath {
        self.root.join(file.as_str())
    }

    /// Path of any document relative to the data root.
    pub fn document(&self, relative: &str) -> NormalizedPath {
        self.root.join(relative)
    }

    /// Directory holding backup snapshots.
    pub fn backups_dir(&self) -> NormalizedPath {
        self.root.join(BACKUPS_DIR)
    }

    /// Express `path` relative to the data root, falling back to the full path.
    pub fn relative(&self, path: &NormalizedPath) -> String {
        path.relative_to(&self.root)
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| path.as_str().to_string())
    }

    /// Whether a root-relative path is toolkit-owned and must be skipped by
    /// scanners (generated reports and the backups tree).
    pub fn is_internal(&self, relative: &str) -> bool {
        relative == BACKUPS_DIR
            || relative.starts_with(&format!("{BACKUPS_DIR}/"))
            || DataFile::from_file_name(relative).is_some_and(|f| f.is_generated())
    }
}
