//! Document discovery under the data root

use std::fs;

use cvdata_fs::{DataLayout, NormalizedPath, io};
use serde_json::Value;

use crate::{Error, Result};

/// Read a root-relative document. Malformed JSON, including bytes that are
/// not UTF-8, is an [`Error::Parse`] naming the file.
pub fn read_document(layout: &DataLayout, file: &str) -> Result<Value> {
    let bytes = io::read_bytes(&layout.document(file))?;
    serde_json::from_slice(&bytes).map_err(|e| Error::Parse {
        file: file.to_string(),
        message: e.to_string(),
    })
}

/// Every `.json` document under the data root, as sorted root-relative
/// paths. Generated reports, the `backups/` tree and hidden files are
/// skipped.
pub fn list_documents(layout: &DataLayout) -> Result<Vec<String>> {
    let mut found = Vec::new();
    walk(layout, layout.root(), &mut found)?;
    found.sort();
    Ok(found)
}

fn walk(layout: &DataLayout, dir: &NormalizedPath, found: &mut Vec<String>) -> Result<()> {
    let native = dir.to_native();
    let entries = fs::read_dir(&native).map_err(|e| cvdata_fs::Error::io(&native, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| cvdata_fs::Error::io(&native, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }

        let path = dir.join(&name);
        let relative = layout.relative(&path);
        if layout.is_internal(&relative) {
            continue;
        }

        let file_type = entry.file_type().map_err(|e| cvdata_fs::Error::io(&native, e))?;
        if file_type.is_dir() {
            walk(layout, &path, found)?;
        } else if file_type.is_file() && path.extension() == Some("json") {
            found.push(relative);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn skips_internal_and_hidden_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        for file in [
            "base-cv.json",
            "data-index.json",
            "notes.txt",
            ".base-cv.json.42.tmp",
            "backups/base-cv.json.backup.3.0.0.1",
            "optimized/base-cv-optimized.json",
        ] {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "{}").unwrap();
        }

        let layout = DataLayout::new(NormalizedPath::new(root));
        assert_eq!(
            list_documents(&layout).unwrap(),
            vec!["base-cv.json", "optimized/base-cv-optimized.json"]
        );
    }

    #[test]
    fn non_utf8_document_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.json"), b"{\"\xff\xfe\"}").unwrap();

        let layout = DataLayout::new(NormalizedPath::new(dir.path()));
        match read_document(&layout, "broken.json") {
            Err(Error::Parse { file, .. }) => assert_eq!(file, "broken.json"),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }
}
