//! Error types for cvdata-meta

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid schema version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("Invalid pattern '{pattern}' for field {field}: {source}")]
    InvalidPattern {
        field: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
