//! Data quality monitoring: freshness and schema currency per document.

use chrono::{DateTime, NaiveDate, Utc};
use cvdata_fs::{DataFile, DataLayout, io};
use cvdata_meta::{DocumentType, SchemaVersion, extract_version, identify_file_type};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::MonitorSettings;
use crate::sync::modified_at;
use crate::{Error, Result, scan};

/// Where a document's age was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeSource {
    /// `metadata.last_updated`
    Metadata,
    /// Top-level `timestamp`
    Timestamp,
    /// File modification time
    Mtime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentQuality {
    pub path: String,
    pub doc_type: DocumentType,
    pub last_updated: DateTime<Utc>,
    pub age_source: AgeSource,
    pub age_days: f64,
    pub freshness: f64,
    /// Only for versioned (CV) documents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_current: Option<bool>,
}

/// Contents of `quality-report.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub timestamp: DateTime<Utc>,
    /// Mean document freshness, 0-100
    pub freshness: f64,
    /// Percentage of versioned documents at the current schema
    pub schema: f64,
    pub documents: Vec<DocumentQuality>,
    pub warnings: Vec<String>,
}

pub struct QualityMonitor {
    layout: DataLayout,
    settings: MonitorSettings,
}

impl QualityMonitor {
    pub fn new(layout: DataLayout, settings: MonitorSettings) -> Self {
        Self { layout, settings }
    }

    /// Assess every document as of `now`.
    pub fn assess_at(&self, now: DateTime<Utc>) -> Result<QualityReport> {
        let mut documents = Vec::new();
        let mut warnings = Vec::new();
        let current = SchemaVersion::current();

        for path in scan::list_documents(&self.layout)? {
            let data = match scan::read_document(&self.layout, &path) {
                Ok(data) => data,
                Err(Error::Parse { message, .. }) => {
                    warnings.push(format!("{path}: skipped, {message}"));
                    continue;
                }
                Err(e) => return Err(e),
            };

            let doc_type = identify_file_type(&path, &data).doc_type;
            let (last_updated, age_source) = match document_date(&data) {
                Some(found) => found,
                None => (modified_at(&self.layout, &path)?, AgeSource::Mtime),
            };
            let age_days = (now - last_updated).num_seconds().max(0) as f64 / 86_400.0;

            let (schema_version, schema_current) = if doc_type == DocumentType::CoreCv {
                let version = extract_version(&data).version;
                (Some(version.to_string()), Some(version == current))
            } else {
                (None, None)
            };

            documents.push(DocumentQuality {
                freshness: self.freshness(age_days),
                path,
                doc_type,
                last_updated,
                age_source,
                age_days: (age_days * 100.0).round() / 100.0,
                schema_version,
                schema_current,
            });
        }

        let freshness = if documents.is_empty() {
            0.0
        } else {
            documents.iter().map(|d| d.freshness).sum::<f64>() / documents.len() as f64
        };
        let versioned: Vec<bool> = documents.iter().filter_map(|d| d.schema_current).collect();
        let schema = if versioned.is_empty() {
            100.0
        } else {
            versioned.iter().filter(|c| **c).count() as f64 * 100.0 / versioned.len() as f64
        };

        Ok(QualityReport {
            timestamp: now,
            freshness: (freshness * 100.0).round() / 100.0,
            schema: (schema * 100.0).round() / 100.0,
            documents,
            warnings,
        })
    }

    /// Assess now and write `quality-report.json`.
    pub fn run(&self) -> Result<QualityReport> {
        let report = self.assess_at(Utc::now())?;
        io::write_json(&self.layout.file(DataFile::QualityReport), &report)?;
        tracing::info!(
            freshness = report.freshness,
            schema = report.schema,
            "quality assessed"
        );
        Ok(report)
    }

    // Linear decay from 100 at age zero to 0 at `stale_after_days`.
    fn freshness(&self, age_days: f64) -> f64 {
        let window = f64::from(self.settings.stale_after_days);
        if window <= 0.0 {
            return if age_days <= 0.0 { 100.0 } else { 0.0 };
        }
        ((1.0 - age_days / window) * 100.0).clamp(0.0, 100.0)
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
}

fn document_date(data: &Value) -> Option<(DateTime<Utc>, AgeSource)> {
    let metadata = data
        .get("metadata")
        .and_then(|m| m.get("last_updated"))
        .and_then(Value::as_str)
        .and_then(parse_date)
        .map(|d| (d, AgeSource::Metadata));
    metadata.or_else(|| {
        data.get("timestamp")
            .and_then(Value::as_str)
            .and_then(parse_date)
            .map(|d| (d, AgeSource::Timestamp))
    })
}
