//! Atomic document I/O
//!
//! Every write goes through [`write_atomic`]: the bytes are staged in a
//! hidden sibling file, locked and synced, then renamed over the target.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use fs2::FileExt;
use serde::{Serialize, de::DeserializeOwned};
use tempfile::Builder;

use crate::{Error, NormalizedPath, Result};

/// Replace `path` with `content` without readers ever seeing a partial file.
///
/// The staging file is removed if any step fails.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let target = path.to_native();
    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

    let prefix = format!(".{}.", path.file_name().unwrap_or("document"));
    let mut staged = Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(|e| Error::io(&dir, e))?;
    let staged_path = staged.path().to_path_buf();

    FileExt::lock_exclusive(staged.as_file()).map_err(|_| Error::LockFailed {
        path: target.clone(),
    })?;
    staged
        .write_all(content)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|e| Error::io(&staged_path, e))?;
    FileExt::unlock(staged.as_file()).map_err(|_| Error::LockFailed {
        path: target.clone(),
    })?;

    staged
        .persist(&target)
        .map_err(|e| Error::io(&target, e.error))?;

    tracing::trace!(path = %path, bytes = content.len(), "atomic write complete");
    Ok(())
}

/// Read raw bytes from a file.
pub fn read_bytes(path: &NormalizedPath) -> Result<Vec<u8>> {
    let native_path = path.to_native();
    fs::read(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Write text content to a file atomically.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &NormalizedPath) -> Result<T> {
    let content = read_bytes(path)?;
    serde_json::from_slice(&content).map_err(|e| Error::Parse {
        path: path.to_native(),
        format: "JSON".into(),
        message: e.to_string(),
    })
}

/// Serialize a value as pretty JSON (trailing newline) and write it atomically.
pub fn write_json<T: Serialize>(path: &NormalizedPath, value: &T) -> Result<()> {
    let mut content = serde_json::to_string_pretty(value).map_err(|e| Error::Serialize {
        path: path.to_native(),
        format: "JSON".into(),
        message: e.to_string(),
    })?;
    content.push('\n');
    write_atomic(path, content.as_bytes())
}
