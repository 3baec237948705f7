//! The persisted fingerprint table, `data-index.json`

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use cvdata_fs::checksum::compute_bytes_checksum;
use cvdata_fs::{DataFile, DataLayout, io};
use cvdata_meta::{DocumentType, identify_file_type};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::cascade::DependencyMap;
use super::scheduler::Tier;
use crate::Result;

const INDEX_FORMAT: &str = "1.0";

/// Processing priority, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Normal,
    Low,
}

const PRIORITY_RULES: &[(&str, Priority)] = &[
    ("base-cv", Priority::Critical),
    ("activity-summary", Priority::Critical),
    ("ai-enhancement", Priority::High),
    ("protected-content", Priority::High),
    ("optimization", Priority::Normal),
    ("cache", Priority::Normal),
    ("backup", Priority::Low),
    ("archive", Priority::Low),
];

impl Priority {
    /// Classify by path fragment; unmatched paths are normal.
    pub fn classify(path: &str) -> Self {
        PRIORITY_RULES
            .iter()
            .find(|(fragment, _)| path.contains(fragment))
            .map_or(Self::Normal, |(_, priority)| *priority)
    }

    /// Scheduler tier that sweeps this priority.
    pub fn tier(&self) -> Tier {
        match self {
            Self::Critical => Tier::Critical,
            Self::High | Self::Normal => Tier::Normal,
            Self::Low => Tier::Background,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Pending,
    Completed,
    Failed,
}

/// Bookkeeping for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncIndexEntry {
    pub doc_type: DocumentType,
    pub checksum: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub priority: Priority,
    /// Derived files regenerated from this document
    pub dependencies: Vec<String>,
    pub sync_status: SyncStatus,
    pub last_sync: Option<DateTime<Utc>>,
}

/// Contents of `data-index.json`, keyed by root-relative path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncIndex {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub entries: BTreeMap<String, SyncIndexEntry>,
}

impl SyncIndex {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            version: INDEX_FORMAT.to_string(),
            generated_at: now,
            entries: BTreeMap::new(),
        }
    }

    /// The saved index, if any.
    pub fn load(layout: &DataLayout) -> Result<Option<Self>> {
        let path = layout.file(DataFile::DataIndex);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(io::read_json(&path)?))
    }

    pub fn save(&self, layout: &DataLayout) -> Result<()> {
        io::write_json(&layout.file(DataFile::DataIndex), self)?;
        Ok(())
    }

    pub fn count(&self, status: SyncStatus) -> usize {
        self.entries
            .values()
            .filter(|e| e.sync_status == status)
            .count()
    }
}

/// Modification time of a root-relative file.
pub(crate) fn modified_at(layout: &DataLayout, path: &str) -> Result<DateTime<Utc>> {
    let native = layout.document(path).to_native();
    let modified = std::fs::metadata(&native)
        .and_then(|m| m.modified())
        .map_err(|e| cvdata_fs::Error::io(&native, e))?;
    Ok(DateTime::<Utc>::from(modified))
}

/// Fresh entry for a root-relative file, status `pending`.
///
/// Files that are not valid JSON are typed `unknown` rather than rejected.
pub fn fingerprint(layout: &DataLayout, path: &str, deps: &DependencyMap) -> Result<SyncIndexEntry> {
    let content = io::read_bytes(&layout.document(path))?;
    let parsed: Value = serde_json::from_slice(&content).unwrap_or(Value::Null);

    Ok(SyncIndexEntry {
        doc_type: identify_file_type(path, &parsed).doc_type,
        checksum: compute_bytes_checksum(&content),
        size: content.len() as u64,
        last_modified: modified_at(layout, path)?,
        priority: Priority::classify(path),
        dependencies: deps.for_source(path).to_vec(),
        sync_status: SyncStatus::Pending,
        last_sync: None,
    })
}
