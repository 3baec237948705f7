//! Document metadata for the CV data toolkit.
//!
//! This crate knows what a data document *is*: its type, its schema
//! version, how to address values inside it and which declarative rules it
//! must satisfy. Everything here is a pure function of its inputs.

pub mod document;
pub mod error;
pub mod path;
pub mod rules;
pub mod validation;
pub mod version;

pub use document::{Classification, ClassificationMethod, DocumentType, identify_file_type};
pub use error::{Error, Result};
pub use path::{JsonPath, PathSegment};
pub use rules::{FieldRule, JsonKind, RuleCatalog, RuleSet};
pub use validation::{ValidationOutcome, validate_file};
pub use version::{SchemaVersion, VersionDetection, VersionSource, extract_version};
