//! Architecture validation
//!
//! Scores the whole data directory on three axes: consistency (mean rule
//! engine score), integrity (named storage checks) and relationships
//! (cross-document checks). Nothing here is fatal per file; every problem
//! becomes a record in the report.

mod checks;

use chrono::{DateTime, Utc};
use cvdata_fs::{DataFile, DataLayout, io};
use cvdata_meta::{
    DocumentType, RuleCatalog, SchemaVersion, ValidationOutcome, extract_version,
    identify_file_type, validate_file,
};
use serde::{Deserialize, Serialize};

use self::checks::{Check, Context, Documents, INTEGRITY_CHECKS, RELATIONSHIP_CHECKS, Verdict};
use crate::{Error, Result, scan};

const CONSISTENCY_WEIGHT: f64 = 0.3;
const INTEGRITY_WEIGHT: f64 = 0.4;
const RELATIONSHIP_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    ParseError,
    StructureValidation,
    IntegrityError,
    RelationshipError,
}

/// One problem found during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub kind: IssueKind,
    /// Document path, or the check name for integrity and relationship issues
    pub file: String,
    pub message: String,
}

/// Outcome of one named check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Contents of `data-architecture-validation-report.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub timestamp: DateTime<Utc>,
    pub consistency: f64,
    pub integrity: f64,
    pub relationships: f64,
    pub overall: f64,
    pub documents: Vec<ValidationOutcome>,
    pub checks: Vec<CheckResult>,
    pub errors: Vec<IssueRecord>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl ValidationReport {
    /// Whether the weighted score reaches `threshold`.
    pub fn passed(&self, threshold: f64) -> bool {
        self.overall >= threshold
    }

    fn failed(&self, check: &str) -> bool {
        self.checks.iter().any(|c| c.name == check && !c.passed)
    }
}

/// Validates every document under a data root against a rule catalog.
pub struct ArchitectureValidator<'a> {
    layout: DataLayout,
    catalog: &'a RuleCatalog,
}

impl<'a> ArchitectureValidator<'a> {
    pub fn new(layout: DataLayout, catalog: &'a RuleCatalog) -> Self {
        Self { layout, catalog }
    }

    /// Validate and build the report without writing it.
    pub fn validate(&self) -> Result<ValidationReport> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut documents = Documents::new();
        let mut parse_failures = Vec::new();
        let mut outcomes = Vec::new();

        for file in scan::list_documents(&self.layout)? {
            let data = match scan::read_document(&self.layout, &file) {
                Ok(data) => data,
                Err(Error::Parse { message, .. }) => {
                    tracing::warn!(file, %message, "document does not parse");
                    errors.push(IssueRecord {
                        kind: IssueKind::ParseError,
                        file: file.clone(),
                        message,
                    });
                    parse_failures.push(file);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let classification = identify_file_type(&file, &data);
            if classification.is_uncertain() {
                warnings.push(format!("{file}: document type not recognized, not scored"));
                documents.insert(file, (DocumentType::Unknown, data));
                continue;
            }

            let outcome = validate_file(&file, &data, classification.doc_type, self.catalog);
            errors.extend(outcome.errors.iter().map(|message| IssueRecord {
                kind: IssueKind::StructureValidation,
                file: file.clone(),
                message: message.clone(),
            }));
            warnings.extend(outcome.warnings.iter().map(|w| format!("{file}: {w}")));
            outcomes.push(outcome);
            documents.insert(file, (classification.doc_type, data));
        }

        let consistency = if outcomes.is_empty() {
            0.0
        } else {
            outcomes.iter().map(|o| f64::from(o.score)).sum::<f64>() / outcomes.len() as f64
        };

        let ctx = Context {
            layout: &self.layout,
            documents: &documents,
            parse_failures: &parse_failures,
        };
        let mut checks = Vec::new();
        let integrity = run_checks(
            &ctx,
            INTEGRITY_CHECKS,
            IssueKind::IntegrityError,
            &mut checks,
            &mut errors,
        );
        let relationships = run_checks(
            &ctx,
            RELATIONSHIP_CHECKS,
            IssueKind::RelationshipError,
            &mut checks,
            &mut errors,
        );

        let overall = round2(
            CONSISTENCY_WEIGHT * consistency
                + INTEGRITY_WEIGHT * integrity
                + RELATIONSHIP_WEIGHT * relationships,
        );

        let mut report = ValidationReport {
            timestamp: Utc::now(),
            consistency: round2(consistency),
            integrity: round2(integrity),
            relationships: round2(relationships),
            overall,
            documents: outcomes,
            checks,
            errors,
            warnings,
            recommendations: Vec::new(),
        };
        report.recommendations = recommendations(&report, &documents);
        Ok(report)
    }

    /// Validate and write the report.
    pub fn run(&self) -> Result<ValidationReport> {
        let report = self.validate()?;
        io::write_json(&self.layout.file(DataFile::ValidationReport), &report)?;
        tracing::info!(
            overall = report.overall,
            errors = report.errors.len(),
            "validation complete"
        );
        Ok(report)
    }
}

// Percentage of applicable checks that pass; 100 when none apply.
fn run_checks(
    ctx: &Context<'_>,
    suite: &[(&str, Check)],
    kind: IssueKind,
    results: &mut Vec<CheckResult>,
    errors: &mut Vec<IssueRecord>,
) -> f64 {
    let mut applicable = 0usize;
    let mut passed = 0usize;

    for (name, check) in suite {
        let verdict = check(ctx).unwrap_or_else(|e| {
            tracing::warn!(check = name, error = %e, "check errored");
            Verdict::Fail(format!("check errored: {e}"))
        });
        match verdict {
            Verdict::NotApplicable => continue,
            Verdict::Pass => {
                passed += 1;
                results.push(CheckResult {
                    name: name.to_string(),
                    passed: true,
                    detail: None,
                });
            }
            Verdict::Fail(detail) => {
                errors.push(IssueRecord {
                    kind,
                    file: name.to_string(),
                    message: detail.clone(),
                });
                results.push(CheckResult {
                    name: name.to_string(),
                    passed: false,
                    detail: Some(detail),
                });
            }
        }
        applicable += 1;
    }

    if applicable == 0 {
        100.0
    } else {
        passed as f64 * 100.0 / applicable as f64
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn recommendations(report: &ValidationReport, documents: &Documents) -> Vec<String> {
    let mut out = Vec::new();

    let unparsed: Vec<&str> = report
        .errors
        .iter()
        .filter(|e| e.kind == IssueKind::ParseError)
        .map(|e| e.file.as_str())
        .collect();
    if !unparsed.is_empty() {
        out.push(format!("Fix malformed JSON in {}", unparsed.join(", ")));
    }
    if report.consistency < 80.0 {
        out.push("Resolve structure validation errors to raise consistency".to_string());
    }

    let current = SchemaVersion::current();
    let behind: Vec<&str> = documents
        .iter()
        .filter(|(_, (t, doc))| *t == DocumentType::CoreCv && extract_version(doc).version < current)
        .map(|(path, _)| path.as_str())
        .collect();
    if !behind.is_empty() {
        out.push(format!(
            "Migrate {} to schema {current} with `cvdata migrate`",
            behind.join(", ")
        ));
    }

    if report.failed("index_matches_disk") {
        out.push("Rebuild the data index with `cvdata sync run`".to_string());
    }
    if report.failed("backup_snapshots_intact") {
        out.push("Prune or recreate damaged backups".to_string());
    }
    if report.failed("required_inputs_present") {
        out.push(format!("Restore {} from a backup", DataFile::BaseCv));
    }
    if RELATIONSHIP_CHECKS.iter().any(|(name, _)| report.failed(name)) {
        out.push("Align cross-document references with the CV".to_string());
    }
    out
}
