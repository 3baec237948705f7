//! Built-in strategies for the CV document chain `3.0.0 -> 3.1.0 -> 4.0.0`
//!
//! Only `4.0.0 -> 3.1.0` has a rollback strategy. Downgrading further is
//! done by restoring a snapshot.

use cvdata_meta::{JsonKind, SchemaVersion};
use serde_json::{Map, Value, json};

use super::transform::{MigrationStrategy, StepKey, Transformation, Validation};

fn step(from: (u64, u64, u64), to: (u64, u64, u64)) -> StepKey {
    StepKey::new(
        SchemaVersion::new(from.0, from.1, from.2),
        SchemaVersion::new(to.0, to.1, to.2),
    )
}

fn default_protection() -> Value {
    json!({
        "enabled": true,
        "level": "standard",
        "protected_sections": []
    })
}

fn ensure_object(root: &mut Value, key: &str) {
    if let Value::Object(map) = root
        && !map.get(key).is_some_and(Value::is_object)
    {
        map.insert(key.to_string(), Value::Object(Map::new()));
    }
}

fn ensure_metadata(root: &Value) -> Value {
    let mut next = root.clone();
    ensure_object(&mut next, "metadata");
    next
}

fn ensure_v4_sections(root: &Value) -> Value {
    let mut next = root.clone();
    for key in ["metadata", "profile", "career", "portfolio"] {
        ensure_object(&mut next, key);
    }
    next
}

fn ensure_content_protection(root: &Value) -> Value {
    let mut next = root.clone();
    if let Value::Object(map) = &mut next
        && !map.contains_key("content_protection")
    {
        map.insert("content_protection".to_string(), default_protection());
    }
    next
}

fn normalize_email(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim().to_lowercase()),
        other => other.clone(),
    }
}

fn skills_to_objects(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| match item {
                    Value::String(name) => json!({"name": name}),
                    other => other.clone(),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

pub(super) fn v3_0_to_v3_1() -> MigrationStrategy {
    MigrationStrategy::new(step((3, 0, 0), (3, 1, 0)), "Add content protection block")
        .then(Transformation::transform("", "ensure_metadata", ensure_metadata))
        .then(Transformation::add("content_protection", default_protection()))
        .then(Transformation::transform(
            "contact_info.email",
            "normalize_email",
            normalize_email,
        ))
        .ensure(Validation::kind("metadata", JsonKind::Object))
        .ensure(Validation::required("personal_info"))
        .ensure(Validation::kind("content_protection", JsonKind::Object))
}

pub(super) fn v3_1_to_v4_0() -> MigrationStrategy {
    MigrationStrategy::new(
        step((3, 1, 0), (4, 0, 0)),
        "Restructure into profile, career and portfolio sections",
    )
    .then(Transformation::move_to("personal_info", "profile.personal"))
    .then(Transformation::move_to("contact_info", "profile.contact"))
    .then(Transformation::rename("profile.contact.github_url", "github"))
    .then(Transformation::move_to("experience", "career.experience"))
    .then(Transformation::move_to("education", "career.education"))
    .then(Transformation::move_to("projects", "portfolio.projects"))
    .then(Transformation::move_to(
        "content_protection",
        "metadata.content_protection",
    ))
    .then(Transformation::transform("skills", "skills_to_objects", skills_to_objects))
    .then(Transformation::transform("", "ensure_v4_sections", ensure_v4_sections))
    .ensure(Validation::kind("profile", JsonKind::Object))
    .ensure(Validation::required("profile.personal"))
    .ensure(Validation::kind("career", JsonKind::Object))
    .ensure(Validation::kind("portfolio", JsonKind::Object))
}

/// Inverse of [`v3_1_to_v4_0`]. Skill objects stay objects.
pub(super) fn v4_0_to_v3_1() -> MigrationStrategy {
    MigrationStrategy::new(
        step((4, 0, 0), (3, 1, 0)),
        "Flatten profile, career and portfolio sections",
    )
    .then(Transformation::move_to("profile.personal", "personal_info"))
    .then(Transformation::move_to("profile.contact", "contact_info"))
    .then(Transformation::rename("contact_info.github", "github_url"))
    .then(Transformation::move_to("career.experience", "experience"))
    .then(Transformation::move_to("career.education", "education"))
    .then(Transformation::move_to("portfolio.projects", "projects"))
    .then(Transformation::move_to(
        "metadata.content_protection",
        "content_protection",
    ))
    .then(Transformation::transform(
        "",
        "ensure_content_protection",
        ensure_content_protection,
    ))
    .then(Transformation::remove("profile"))
    .then(Transformation::remove("career"))
    .then(Transformation::remove("portfolio"))
    .ensure(Validation::required("personal_info"))
    .ensure(Validation::kind("content_protection", JsonKind::Object))
}
