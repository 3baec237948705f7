//! Schema versions and version detection.
//!
//! Versions are semver strings. Short forms such as `3.1` are accepted and
//! normalized to `3.1.0`.
//!
//! ```
//! use cvdata_meta::version::{SchemaVersion, extract_version, VersionSource};
//! use serde_json::json;
//!
//! let doc = json!({"personal_info": {}, "contact_info": {}});
//! let detected = extract_version(&doc);
//! assert_eq!(detected.version, SchemaVersion::parse("3.0.0").unwrap());
//! assert_eq!(detected.source, VersionSource::Inferred);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// Versions the toolkit knows about, oldest first.
pub const SUPPORTED_VERSIONS: [&str; 3] = ["3.0.0", "3.1.0", "4.0.0"];

/// The version every document is migrated towards by default.
pub const CURRENT_VERSION: &str = "4.0.0";

/// A document schema version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaVersion(semver::Version);

impl SchemaVersion {
    /// Parse `major.minor` or `major.minor.patch`.
    pub fn parse(version: &str) -> Result<Self> {
        let trimmed = version.trim().trim_start_matches('v');
        let parts: Vec<&str> = trimmed.split('.').collect();
        let full = match parts.len() {
            1 => format!("{trimmed}.0.0"),
            2 => format!("{trimmed}.0"),
            _ => trimmed.to_string(),
        };
        semver::Version::parse(&full)
            .map(Self)
            .map_err(|e| Error::InvalidVersion {
                version: version.to_string(),
                reason: e.to_string(),
            })
    }

    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    /// The current schema version.
    pub fn current() -> Self {
        Self::new(4, 0, 0)
    }

    /// The oldest supported schema version.
    pub fn oldest() -> Self {
        Self::new(3, 0, 0)
    }

    /// All supported versions, oldest first.
    pub fn supported() -> Vec<Self> {
        SUPPORTED_VERSIONS
            .iter()
            .filter_map(|v| Self::parse(v).ok())
            .collect()
    }

    /// Whether this version is in the supported list.
    pub fn is_supported(&self) -> bool {
        Self::supported().contains(self)
    }

    pub fn as_semver(&self) -> &semver::Version {
        &self.0
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SchemaVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for SchemaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for SchemaVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Where a detected version came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSource {
    /// `metadata.version` or `metadata.schema_version`
    Explicit,
    /// Recognized document shape
    Inferred,
    /// Nothing matched; oldest supported version assumed
    Fallback,
}

/// Result of [`extract_version`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDetection {
    pub version: SchemaVersion,
    pub source: VersionSource,
}

fn explicit_version(data: &Value) -> Option<SchemaVersion> {
    let metadata = data.get("metadata")?;
    ["version", "schema_version"]
        .iter()
        .filter_map(|key| metadata.get(key).and_then(Value::as_str))
        .find_map(|raw| match SchemaVersion::parse(raw) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(raw, error = %e, "ignoring unparseable metadata version");
                None
            }
        })
}

/// Determine a document's schema version.
///
/// An explicit metadata version wins. Otherwise the shape decides:
/// `profile + career + portfolio` is the current layout, `personal_info +
/// contact_info` is legacy (`3.1.0` once `content_protection` exists,
/// `3.0.0` before). Anything else falls back to the oldest version.
pub fn extract_version(data: &Value) -> VersionDetection {
    if let Some(version) = explicit_version(data) {
        return VersionDetection {
            version,
            source: VersionSource::Explicit,
        };
    }

    let has = |key: &str| data.get(key).is_some();

    if has("profile") && has("career") && has("portfolio") {
        return VersionDetection {
            version: SchemaVersion::current(),
            source: VersionSource::Inferred,
        };
    }

    if has("personal_info") && has("contact_info") {
        let version = if has("content_protection") {
            SchemaVersion(semver::Version::new(3, 1, 0))
        } else {
            SchemaVersion::oldest()
        };
        return VersionDetection {
            version,
            source: VersionSource::Inferred,
        };
    }

    VersionDetection {
        version: SchemaVersion::oldest(),
        source: VersionSource::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("3.1", "3.1.0")]
    #[case("4", "4.0.0")]
    #[case("v3.0.0", "3.0.0")]
    #[case("4.0.0", "4.0.0")]
    fn parse_normalizes(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(SchemaVersion::parse(raw).unwrap().to_string(), expected);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            SchemaVersion::parse("latest"),
            Err(Error::InvalidVersion { .. })
        ));
    }

    #[test]
    fn explicit_version_wins_over_shape() {
        let doc = json!({
            "metadata": {"version": "3.1.0"},
            "profile": {}, "career": {}, "portfolio": {}
        });
        let d = extract_version(&doc);
        assert_eq!(d.version.to_string(), "3.1.0");
        assert_eq!(d.source, VersionSource::Explicit);
    }

    #[test]
    fn schema_version_key_is_read() {
        let doc = json!({"metadata": {"schema_version": "4.0"}});
        assert_eq!(extract_version(&doc).version, SchemaVersion::current());
    }

    #[test]
    fn legacy_without_protection_is_3_0() {
        let doc = json!({"personal_info": {}, "contact_info": {}});
        assert_eq!(extract_version(&doc).version.to_string(), "3.0.0");
    }

    #[test]
    fn legacy_with_protection_is_3_1() {
        let doc = json!({"personal_info": {}, "contact_info": {}, "content_protection": {}});
        assert_eq!(extract_version(&doc).version.to_string(), "3.1.0");
    }

    #[test]
    fn modern_shape_is_current() {
        let doc = json!({"profile": {}, "career": {}, "portfolio": {}});
        assert_eq!(extract_version(&doc).version, SchemaVersion::current());
    }

    #[test]
    fn unrecognized_falls_back() {
        let d = extract_version(&json!({"timestamp": "2026-01-01"}));
        assert_eq!(d.source, VersionSource::Fallback);
        assert_eq!(d.version, SchemaVersion::oldest());
    }

    #[test]
    fn supported_list_is_ordered() {
        let versions = SchemaVersion::supported();
        assert_eq!(versions.len(), SUPPORTED_VERSIONS.len());
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(versions.last().unwrap().to_string(), CURRENT_VERSION);
    }
}
