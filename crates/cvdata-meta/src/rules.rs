//! Declarative validation rule sets
//!
//! One [`RuleSet`] exists per [`DocumentType`]. The catalog is built once
//! (patterns compiled up front) and then shared by reference; nothing in
//! here is mutated after construction.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::DocumentType;
use crate::error::{Error, Result};

/// JSON value kinds a field can be constrained to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonKind {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
}

impl JsonKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Boolean,
            Value::Null => Self::Null,
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
        };
        f.write_str(name)
    }
}

/// Constraints on a single field. Nested object fields recurse.
#[derive(Debug, Clone, Default)]
pub struct FieldRule {
    pub kind: Option<JsonKind>,
    pub pattern: Option<Regex>,
    pub allowed: Option<Vec<String>>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min_items: Option<usize>,
    pub required: Vec<String>,
    pub fields: Vec<(String, FieldRule)>,
}

impl FieldRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object() -> Self {
        Self::new().kind(JsonKind::Object)
    }

    pub fn array() -> Self {
        Self::new().kind(JsonKind::Array)
    }

    pub fn string() -> Self {
        Self::new().kind(JsonKind::String)
    }

    pub fn number() -> Self {
        Self::new().kind(JsonKind::Number)
    }

    pub fn kind(mut self, kind: JsonKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Attach a regex; `field` is only used to label compile errors.
    pub fn pattern(mut self, field: &str, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            field: field.to_string(),
            pattern: pattern.to_string(),
            source,
        })?;
        self.pattern = Some(regex);
        Ok(self)
    }

    pub fn one_of(mut self, allowed: &[&str]) -> Self {
        self.allowed = Some(allowed.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn min_items(mut self, min: usize) -> Self {
        self.min_items = Some(min);
        self
    }

    pub fn require(mut self, keys: &[&str]) -> Self {
        self.required.extend(keys.iter().map(|k| k.to_string()));
        self
    }

    pub fn field(mut self, name: &str, rule: FieldRule) -> Self {
        self.fields.push((name.to_string(), rule));
        self
    }
}

/// The contract for one document type.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub doc_type: DocumentType,
    pub required: Vec<String>,
    pub fields: Vec<(String, FieldRule)>,
}

impl RuleSet {
    pub fn new(doc_type: DocumentType, required: &[&str]) -> Self {
        Self {
            doc_type,
            required: required.iter().map(|k| k.to_string()).collect(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: &str, rule: FieldRule) -> Self {
        self.fields.push((name.to_string(), rule));
        self
    }
}

const SEMVER: &str = r"^\d+\.\d+(\.\d+)?$";
const ISO_DATE: &str = r"^\d{4}-\d{2}-\d{2}";
const EMAIL: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";
const URL: &str = r"^https?://[^\s/$.?#].[^\s]*$";
const GITHUB_LOGIN: &str = r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,38})$";

fn metadata_rule() -> Result<FieldRule> {
    Ok(FieldRule::object()
        .field("version", FieldRule::string().pattern("metadata.version", SEMVER)?)
        .field(
            "schema_version",
            FieldRule::string().pattern("metadata.schema_version", SEMVER)?,
        )
        .field(
            "last_updated",
            FieldRule::string().pattern("metadata.last_updated", ISO_DATE)?,
        )
        .field("migration_history", FieldRule::array()))
}

fn core_cv_rules() -> Result<RuleSet> {
    let personal = FieldRule::object()
        .require(&["name"])
        .field("name", FieldRule::string().length(Some(2), Some(100)))
        .field("title", FieldRule::string().length(Some(2), Some(200)))
        .field("summary", FieldRule::string().length(Some(20), Some(2000)));

    let contact = FieldRule::object()
        .field("email", FieldRule::string().pattern("profile.contact.email", EMAIL)?)
        .field("website", FieldRule::string().pattern("profile.contact.website", URL)?)
        .field("github", FieldRule::string().pattern("profile.contact.github", URL)?)
        .field("linkedin", FieldRule::string().pattern("profile.contact.linkedin", URL)?);

    Ok(RuleSet::new(DocumentType::CoreCv, &["metadata", "profile", "career"])
        .field("metadata", metadata_rule()?)
        .field(
            "profile",
            FieldRule::object()
                .require(&["personal"])
                .field("personal", personal)
                .field("contact", contact),
        )
        .field(
            "career",
            FieldRule::object().field("experience", FieldRule::array().min_items(1)),
        )
        .field(
            "portfolio",
            FieldRule::object().field("projects", FieldRule::array()),
        )
        .field("skills", FieldRule::array().min_items(1))
        .field("certifications", FieldRule::array()))
}

fn activity_rules() -> Result<RuleSet> {
    Ok(RuleSet::new(DocumentType::Activity, &["timestamp", "github_stats"])
        .field(
            "timestamp",
            FieldRule::string().pattern("timestamp", ISO_DATE)?,
        )
        .field(
            "github_stats",
            FieldRule::object()
                .field(
                    "username",
                    FieldRule::string().pattern("github_stats.username", GITHUB_LOGIN)?,
                )
                .field("public_repos", FieldRule::number())
                .field("followers", FieldRule::number()),
        )
        .field("recent_activity", FieldRule::array())
        .field("languages", FieldRule::object()))
}

fn enhancement_rules() -> Result<RuleSet> {
    Ok(RuleSet::new(DocumentType::Enhancement, &["metadata", "enhancements"])
        .field("metadata", metadata_rule()?)
        .field("enhancements", FieldRule::object())
        .field(
            "quality_score",
            FieldRule::number(),
        ))
}

fn protection_rules() -> Result<RuleSet> {
    Ok(
        RuleSet::new(DocumentType::Protection, &["metadata", "protected_sections"])
            .field("metadata", metadata_rule()?)
            .field("protected_sections", FieldRule::array().min_items(1))
            .field(
                "protection_level",
                FieldRule::string().one_of(&["low", "standard", "strict"]),
            ),
    )
}

/// Rule sets keyed by document type.
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    sets: HashMap<DocumentType, RuleSet>,
}

impl RuleCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rule sets for the four document types.
    pub fn builtin() -> Result<Self> {
        let mut catalog = Self::new();
        for set in [
            core_cv_rules()?,
            activity_rules()?,
            enhancement_rules()?,
            protection_rules()?,
        ] {
            catalog = catalog.with(set);
        }
        Ok(catalog)
    }

    /// Add or replace a rule set.
    pub fn with(mut self, set: RuleSet) -> Self {
        self.sets.insert(set.doc_type, set);
        self
    }

    pub fn get(&self, doc_type: DocumentType) -> Option<&RuleSet> {
        self.sets.get(&doc_type)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_every_known_type() {
        let catalog = RuleCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 4);
        assert!(catalog.get(DocumentType::CoreCv).is_some());
        assert!(catalog.get(DocumentType::Unknown).is_none());
    }

    #[test]
    fn bad_pattern_is_reported() {
        let err = FieldRule::string().pattern("x", "(").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn kind_of_values() {
        assert_eq!(JsonKind::of(&serde_json::json!([])), JsonKind::Array);
        assert_eq!(JsonKind::of(&serde_json::json!(1.5)), JsonKind::Number);
    }
}
