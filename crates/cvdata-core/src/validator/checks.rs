//! Named integrity and relationship checks
//!
//! Each check yields a [`Verdict`]; checks that do not apply to the data
//! at hand are left out of the score. Errors raised inside a check are
//! demoted to a failure by the caller.

use std::collections::BTreeMap;

use cvdata_fs::checksum::compute_file_checksum;
use cvdata_fs::{DataFile, DataLayout};
use cvdata_meta::{DocumentType, JsonPath, extract_version};
use serde_json::Value;

use crate::Result;
use crate::backup::BackupManager;
use crate::config::BackupSettings;
use crate::sync::SyncIndex;

/// Parsed documents keyed by root-relative path.
pub(super) type Documents = BTreeMap<String, (DocumentType, Value)>;

/// Result of one check run.
pub(super) enum Verdict {
    NotApplicable,
    Pass,
    Fail(String),
}

pub(super) struct Context<'a> {
    pub layout: &'a DataLayout,
    pub documents: &'a Documents,
    pub parse_failures: &'a [String],
}

impl Context<'_> {
    fn first_of(&self, doc_type: DocumentType) -> Option<(&str, &Value)> {
        // Prefer the canonical file name when several documents share a type
        self.documents
            .iter()
            .filter(|(_, (t, _))| *t == doc_type)
            .min_by_key(|(path, _)| !DataFile::INPUTS.iter().any(|f| f.as_str() == path.as_str()))
            .map(|(path, (_, doc))| (path.as_str(), doc))
    }
}

pub(super) type Check = fn(&Context<'_>) -> Result<Verdict>;

pub(super) const INTEGRITY_CHECKS: &[(&str, Check)] = &[
    ("documents_parse", documents_parse),
    ("required_inputs_present", required_inputs_present),
    ("index_matches_disk", index_matches_disk),
    ("backup_snapshots_intact", backup_snapshots_intact),
    ("schema_versions_supported", schema_versions_supported),
];

pub(super) const RELATIONSHIP_CHECKS: &[(&str, Check)] = &[
    ("activity_matches_profile", activity_matches_profile),
    ("enhancements_reference_cv", enhancements_reference_cv),
    ("protected_sections_exist", protected_sections_exist),
];

fn verdict(failures: Vec<String>) -> Verdict {
    if failures.is_empty() {
        Verdict::Pass
    } else {
        Verdict::Fail(failures.join("; "))
    }
}

fn documents_parse(ctx: &Context<'_>) -> Result<Verdict> {
    Ok(verdict(
        ctx.parse_failures
            .iter()
            .map(|f| format!("{f} is not valid JSON"))
            .collect(),
    ))
}

fn required_inputs_present(ctx: &Context<'_>) -> Result<Verdict> {
    let path = ctx.layout.file(DataFile::BaseCv);
    Ok(if path.is_file() {
        Verdict::Pass
    } else {
        Verdict::Fail(format!("{} is missing", DataFile::BaseCv))
    })
}

fn index_matches_disk(ctx: &Context<'_>) -> Result<Verdict> {
    let Some(index) = SyncIndex::load(ctx.layout)? else {
        return Ok(Verdict::NotApplicable);
    };
    let mut failures = Vec::new();
    for (path, entry) in &index.entries {
        let document = ctx.layout.document(path);
        if !document.is_file() {
            failures.push(format!("{path} is indexed but missing"));
        } else if compute_file_checksum(&document.to_native())? != entry.checksum {
            failures.push(format!("{path} differs from its index checksum"));
        }
    }
    Ok(verdict(failures))
}

fn backup_snapshots_intact(ctx: &Context<'_>) -> Result<Verdict> {
    if !ctx.layout.file(DataFile::BackupRegistry).is_file() {
        return Ok(Verdict::NotApplicable);
    }
    let manager = BackupManager::open(ctx.layout.clone(), BackupSettings::default())?;
    let mut failures = Vec::new();
    for backup in manager.list_backups() {
        if !manager.verify_backup(backup)? {
            failures.push(format!("{} is missing or corrupt", backup.backup_path));
        }
    }
    Ok(verdict(failures))
}

fn schema_versions_supported(ctx: &Context<'_>) -> Result<Verdict> {
    let mut applicable = false;
    let mut failures = Vec::new();
    for (path, (doc_type, doc)) in ctx.documents {
        if *doc_type != DocumentType::CoreCv {
            continue;
        }
        applicable = true;
        let version = extract_version(doc).version;
        if !version.is_supported() {
            failures.push(format!("{path} is at unsupported version {version}"));
        }
    }
    Ok(if applicable {
        verdict(failures)
    } else {
        Verdict::NotApplicable
    })
}

/// GitHub login named by a CV, from a profile URL or bare handle.
fn cv_github_login(cv: &Value) -> Option<String> {
    ["profile.contact.github", "contact_info.github_url", "contact_info.github"]
        .iter()
        .find_map(|p| JsonPath::parse(p).get(cv).and_then(Value::as_str))
        .and_then(|raw| {
            raw.trim_end_matches('/')
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase)
        })
}

fn activity_matches_profile(ctx: &Context<'_>) -> Result<Verdict> {
    let (Some((_, cv)), Some((activity_path, activity))) = (
        ctx.first_of(DocumentType::CoreCv),
        ctx.first_of(DocumentType::Activity),
    ) else {
        return Ok(Verdict::NotApplicable);
    };
    let login = ["github_stats.username", "github_stats.login"]
        .iter()
        .find_map(|p| JsonPath::parse(p).get(activity).and_then(Value::as_str));
    let (Some(login), Some(expected)) = (login, cv_github_login(cv)) else {
        return Ok(Verdict::NotApplicable);
    };

    Ok(if login.to_lowercase() == expected {
        Verdict::Pass
    } else {
        Verdict::Fail(format!(
            "{activity_path} tracks '{login}' but the CV links '{expected}'"
        ))
    })
}

fn enhancements_reference_cv(ctx: &Context<'_>) -> Result<Verdict> {
    let (Some((_, cv)), Some((path, enhancement))) = (
        ctx.first_of(DocumentType::CoreCv),
        ctx.first_of(DocumentType::Enhancement),
    ) else {
        return Ok(Verdict::NotApplicable);
    };
    let Some(Value::Object(sections)) = enhancement
        .get("enhancements")
        .or_else(|| enhancement.get("ai_enhancements"))
    else {
        return Ok(Verdict::NotApplicable);
    };

    Ok(verdict(
        sections
            .keys()
            .filter(|key| !JsonPath::parse(key).exists(cv))
            .map(|key| format!("{path} enhances '{key}', which the CV does not have"))
            .collect(),
    ))
}

fn protected_sections_exist(ctx: &Context<'_>) -> Result<Verdict> {
    let (Some((_, cv)), Some((path, protection))) = (
        ctx.first_of(DocumentType::CoreCv),
        ctx.first_of(DocumentType::Protection),
    ) else {
        return Ok(Verdict::NotApplicable);
    };
    let Some(Value::Array(sections)) = protection.get("protected_sections") else {
        return Ok(Verdict::NotApplicable);
    };

    let mut failures = Vec::new();
    for section in sections {
        let target = section
            .as_str()
            .or_else(|| section.get("path").and_then(Value::as_str))
            .or_else(|| section.get("section").and_then(Value::as_str));
        match target {
            Some(target) if JsonPath::parse(target).exists(cv) => {}
            Some(target) => {
                failures.push(format!("{path} protects '{target}', which the CV does not have"))
            }
            None => failures.push(format!("{path} has a protected section without a path")),
        }
    }
    Ok(verdict(failures))
}
