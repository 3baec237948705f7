//! Drift detection against a saved index

use chrono::{DateTime, Utc};
use cvdata_fs::DataLayout;
use cvdata_fs::checksum::compute_file_checksum;
use cvdata_meta::DocumentType;
use serde::{Deserialize, Serialize};

use super::index::{Priority, SyncIndex, modified_at};
use crate::{Result, scan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

/// One drifted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub path: String,
    pub kind: ChangeKind,
    pub priority: Priority,
    /// Indexed type; `unknown` for added files until they are fingerprinted
    pub doc_type: DocumentType,
}

/// Everything [`scan_drift`] observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drift {
    pub changes: Vec<Change>,
    /// Indexed files whose mtime moved while their content did not, with
    /// the mtime seen before hashing
    pub touched: Vec<(String, DateTime<Utc>)>,
}

impl Drift {
    /// Record the observed mtimes of touched files so later scans skip
    /// hashing them.
    pub fn refresh_mtimes(&self, index: &mut SyncIndex) {
        for (path, observed) in &self.touched {
            if let Some(entry) = index.entries.get_mut(path) {
                entry.last_modified = *observed;
            }
        }
    }
}

/// Compare the data root with `index`.
///
/// A file is only `Modified` when its checksum differs; the checksum is
/// recomputed only when the modification time moved. Results are sorted
/// critical-first, then by path.
pub fn detect_data_changes(layout: &DataLayout, index: &SyncIndex) -> Result<Vec<Change>> {
    Ok(scan_drift(layout, index)?.changes)
}

/// [`detect_data_changes`], also reporting mtime-only moves.
pub fn scan_drift(layout: &DataLayout, index: &SyncIndex) -> Result<Drift> {
    let mut drift = Drift::default();
    let changes = &mut drift.changes;

    for (path, entry) in &index.entries {
        let document = layout.document(path);
        if !document.is_file() {
            changes.push(Change {
                path: path.clone(),
                kind: ChangeKind::Deleted,
                priority: entry.priority,
                doc_type: entry.doc_type,
            });
            continue;
        }

        let observed = modified_at(layout, path)?;
        if observed == entry.last_modified {
            continue;
        }
        if compute_file_checksum(&document.to_native())? != entry.checksum {
            changes.push(Change {
                path: path.clone(),
                kind: ChangeKind::Modified,
                priority: entry.priority,
                doc_type: entry.doc_type,
            });
        } else {
            tracing::trace!(path, "mtime moved, content unchanged");
            drift.touched.push((path.clone(), observed));
        }
    }

    for path in scan::list_documents(layout)? {
        if !index.entries.contains_key(&path) {
            changes.push(Change {
                priority: Priority::classify(&path),
                path,
                kind: ChangeKind::Added,
                doc_type: DocumentType::Unknown,
            });
        }
    }

    changes.sort_by(|a, b| (a.priority, &a.path).cmp(&(b.priority, &b.path)));
    tracing::debug!(count = changes.len(), touched = drift.touched.len(), "changes detected");
    Ok(drift)
}
