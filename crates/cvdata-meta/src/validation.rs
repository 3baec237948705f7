//! Rule engine: score a document against its rule set.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::DocumentType;
use crate::rules::{FieldRule, JsonKind, RuleCatalog};

const MISSING_REQUIRED: i32 = 20;
const MISSING_NESTED: i32 = 10;
const WRONG_KIND: i32 = 10;
const PATTERN_MISMATCH: i32 = 10;
const NOT_ALLOWED: i32 = 10;
const LENGTH_VIOLATION: i32 = 5;
const TOO_FEW_ITEMS: i32 = 5;

/// Outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub filename: String,
    pub doc_type: DocumentType,
    pub valid: bool,
    /// 100 minus deductions, clamped to `0..=100`
    pub score: u32,
    /// Unclamped score, kept for diagnostics
    pub raw_score: i32,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

struct Tally {
    score: i32,
    errors: Vec<String>,
}

impl Tally {
    fn deduct(&mut self, points: i32, message: String) {
        self.score -= points;
        self.errors.push(message);
    }
}

/// Validate `data` against the rule set for `doc_type`.
///
/// Pure: the same inputs always produce the same outcome.
pub fn validate_file(
    filename: &str,
    data: &Value,
    doc_type: DocumentType,
    catalog: &RuleCatalog,
) -> ValidationOutcome {
    let Some(rules) = catalog.get(doc_type) else {
        return ValidationOutcome {
            filename: filename.to_string(),
            doc_type,
            valid: false,
            score: 0,
            raw_score: 0,
            errors: vec![format!("No validation rules for type: {doc_type}")],
            warnings: Vec::new(),
        };
    };

    let mut tally = Tally {
        score: 100,
        errors: Vec::new(),
    };
    let mut warnings = Vec::new();

    if !data.is_object() {
        tally.deduct(
            100,
            format!("Document root must be an object, found {}", JsonKind::of(data)),
        );
    }

    for key in &rules.required {
        if data.get(key).is_none() {
            tally.deduct(MISSING_REQUIRED, format!("Missing required field: {key}"));
        }
    }

    for (name, rule) in &rules.fields {
        if let Some(value) = data.get(name) {
            check_field(name, value, rule, &mut tally);
        }
    }

    if let Some(map) = data.as_object() {
        let declared = |k: &String| {
            rules.required.contains(k) || rules.fields.iter().any(|(name, _)| name == k)
        };
        for key in map.keys().filter(|k| !declared(k)) {
            warnings.push(format!("Undeclared top-level field: {key}"));
        }
    }

    tracing::debug!(
        filename,
        doc_type = %doc_type,
        score = tally.score,
        errors = tally.errors.len(),
        "validated document"
    );

    ValidationOutcome {
        filename: filename.to_string(),
        doc_type,
        valid: tally.errors.is_empty(),
        score: tally.score.clamp(0, 100) as u32,
        raw_score: tally.score,
        errors: tally.errors,
        warnings,
    }
}

fn check_field(path: &str, value: &Value, rule: &FieldRule, tally: &mut Tally) {
    if let Some(kind) = rule.kind {
        let actual = JsonKind::of(value);
        if actual != kind {
            tally.deduct(
                WRONG_KIND,
                format!("Field {path} must be {kind}, found {actual}"),
            );
            return;
        }
    }

    if let Some(text) = value.as_str() {
        if let Some(pattern) = &rule.pattern
            && !pattern.is_match(text)
        {
            tally.deduct(
                PATTERN_MISMATCH,
                format!("Field {path} does not match pattern {}", pattern.as_str()),
            );
        }
        let len = text.chars().count();
        if let Some(min) = rule.min_length
            && len < min
        {
            tally.deduct(
                LENGTH_VIOLATION,
                format!("Field {path} is shorter than {min} characters"),
            );
        }
        if let Some(max) = rule.max_length
            && len > max
        {
            tally.deduct(
                LENGTH_VIOLATION,
                format!("Field {path} is longer than {max} characters"),
            );
        }
    }

    if let Some(allowed) = &rule.allowed {
        let matches = value.as_str().is_some_and(|s| allowed.iter().any(|a| a == s));
        if !matches {
            tally.deduct(
                NOT_ALLOWED,
                format!("Field {path} must be one of: {}", allowed.join(", ")),
            );
        }
    }

    if let (Some(min), Some(items)) = (rule.min_items, value.as_array())
        && items.len() < min
    {
        tally.deduct(
            TOO_FEW_ITEMS,
            format!("Field {path} must contain at least {min} items"),
        );
    }

    for key in &rule.required {
        if value.get(key).is_none() {
            tally.deduct(MISSING_NESTED, format!("Missing required field: {path}.{key}"));
        }
    }

    for (name, child) in &rule.fields {
        if let Some(child_value) = value.get(name) {
            check_field(&format!("{path}.{name}"), child_value, child, tally);
        }
    }
}
