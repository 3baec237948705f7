//! Sample documents.
//!
//! All documents describe the same person so cross-document checks pass:
//! GitHub login `adadev`, CV sections referenced by the enhancement and
//! protection documents exist in the 4.0.0 CV.

use serde_json::{Value, json};

/// Date stamped into every fixture.
pub const FIXTURE_DATE: &str = "2024-06-01T00:00:00Z";

/// Legacy CV, no `metadata` and no `content_protection`.
pub fn cv_v3_0() -> Value {
    json!({
        "personal_info": {
            "name": "Ada Lovelace",
            "title": "Systems Engineer",
            "summary": "Engineer focused on reliable data pipelines and tooling."
        },
        "contact_info": {
            "email": "Ada@Example.com",
            "website": "https://ada.example.com",
            "github_url": "https://github.com/adadev"
        },
        "experience": [
            {"company": "Analytical Engines Ltd", "role": "Lead Engineer", "start": "2019-01"}
        ],
        "education": [
            {"institution": "University of London", "degree": "BSc Mathematics"}
        ],
        "projects": [
            {"name": "difference-engine", "url": "https://github.com/adadev/difference-engine"}
        ],
        "skills": ["Rust", "SQL"]
    })
}

/// Legacy CV with a protection block, recognized as 3.1.0 by shape.
pub fn cv_v3_1() -> Value {
    let mut doc = cv_v3_0();
    doc["contact_info"]["email"] = json!("ada@example.com");
    doc["metadata"] = json!({});
    doc["content_protection"] = json!({
        "enabled": true,
        "level": "standard",
        "protected_sections": []
    });
    doc
}

/// Current-schema CV.
pub fn cv_v4_0() -> Value {
    json!({
        "metadata": {
            "version": "4.0.0",
            "schema_version": "4.0.0",
            "last_updated": FIXTURE_DATE
        },
        "profile": {
            "personal": {
                "name": "Ada Lovelace",
                "title": "Systems Engineer",
                "summary": "Engineer focused on reliable data pipelines and tooling."
            },
            "contact": {
                "email": "ada@example.com",
                "website": "https://ada.example.com",
                "github": "https://github.com/adadev"
            }
        },
        "career": {
            "experience": [
                {"company": "Analytical Engines Ltd", "role": "Lead Engineer", "start": "2019-01"}
            ],
            "education": [
                {"institution": "University of London", "degree": "BSc Mathematics"}
            ]
        },
        "portfolio": {
            "projects": [
                {"name": "difference-engine", "url": "https://github.com/adadev/difference-engine"}
            ]
        },
        "skills": [
            {"name": "Rust", "level": 5},
            {"name": "SQL", "level": 4}
        ]
    })
}

pub fn activity_summary() -> Value {
    json!({
        "timestamp": FIXTURE_DATE,
        "github_stats": {
            "username": "adadev",
            "public_repos": 42,
            "followers": 7
        },
        "recent_activity": [
            {"type": "PushEvent", "repo": "adadev/difference-engine"}
        ],
        "languages": {"Rust": 70.5, "Python": 29.5}
    })
}

pub fn ai_enhancements() -> Value {
    json!({
        "metadata": {"version": "1.0.0", "last_updated": FIXTURE_DATE},
        "enhancements": {
            "profile.personal.summary": {
                "enhanced": "Systems engineer building dependable data tooling in Rust."
            },
            "skills": {"suggested": ["Tokio"]}
        },
        "quality_score": 87
    })
}

pub fn protected_content() -> Value {
    json!({
        "metadata": {"version": "1.0.0", "last_updated": FIXTURE_DATE},
        "protection_level": "standard",
        "protected_sections": ["profile.contact", "career.experience"]
    })
}
