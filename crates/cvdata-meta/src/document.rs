//! Document type classification
//!
//! A document's type decides which rule set validates it and whether the
//! migration chain applies. Classification first trusts the file name and
//! then falls back to sniffing the document's top-level shape.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kinds of data document the site consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "core_cv_data")]
    CoreCv,
    #[serde(rename = "activity_data")]
    Activity,
    #[serde(rename = "enhancement_data")]
    Enhancement,
    #[serde(rename = "protection_data")]
    Protection,
    #[serde(rename = "unknown")]
    Unknown,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CoreCv => "core_cv_data",
            Self::Activity => "activity_data",
            Self::Enhancement => "enhancement_data",
            Self::Protection => "protection_data",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a classification was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    /// Matched a known file-name fragment
    FileName,
    /// Matched a known top-level shape
    Structure,
    /// Nothing matched
    Unrecognized,
}

/// Result of [`identify_file_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub doc_type: DocumentType,
    pub method: ClassificationMethod,
}

impl Classification {
    /// Whether the caller should report this classification as a warning.
    pub fn is_uncertain(&self) -> bool {
        self.method == ClassificationMethod::Unrecognized
    }
}

const NAME_RULES: &[(&str, DocumentType)] = &[
    ("base-cv", DocumentType::CoreCv),
    ("activity-summary", DocumentType::Activity),
    ("ai-enhancement", DocumentType::Enhancement),
    ("protected-content", DocumentType::Protection),
];

fn has_all(data: &Value, keys: &[&str]) -> bool {
    keys.iter().all(|k| data.get(k).is_some())
}

fn has_any(data: &Value, keys: &[&str]) -> bool {
    keys.iter().any(|k| data.get(k).is_some())
}

/// Classify a document by file name, then by shape.
pub fn identify_file_type(filename: &str, data: &Value) -> Classification {
    if let Some((_, doc_type)) = NAME_RULES.iter().find(|(frag, _)| filename.contains(frag)) {
        return Classification {
            doc_type: *doc_type,
            method: ClassificationMethod::FileName,
        };
    }

    let sniffed = if has_all(data, &["metadata", "profile", "career"])
        || has_all(data, &["personal_info", "contact_info"])
    {
        Some(DocumentType::CoreCv)
    } else if has_all(data, &["timestamp", "github_stats"]) {
        Some(DocumentType::Activity)
    } else if has_any(data, &["enhancements", "ai_enhancements"]) {
        Some(DocumentType::Enhancement)
    } else if has_any(data, &["content_protection", "protected_sections"]) {
        Some(DocumentType::Protection)
    } else {
        None
    };

    match sniffed {
        Some(doc_type) => Classification {
            doc_type,
            method: ClassificationMethod::Structure,
        },
        None => {
            tracing::debug!(filename, "document shape not recognized");
            Classification {
                doc_type: DocumentType::Unknown,
                method: ClassificationMethod::Unrecognized,
            }
        }
    }
}
