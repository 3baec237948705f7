use cvdata_fs::{NormalizedPath, io};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_write_atomic_creates_file() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("base-cv.json"));

    io::write_atomic(&path, b"{}").unwrap();

    let content = fs::read_to_string(path.to_native()).unwrap();
    assert_eq!(content, "{}");
}

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("base-cv.json");
    fs::write(&file_path, "original").unwrap();

    let path = NormalizedPath::new(&file_path);
    io::write_atomic(&path, b"updated").unwrap();

    let content = fs::read_to_string(&file_path).unwrap();
    assert_eq!(content, "updated");
}

#[test]
fn test_write_atomic_creates_parent_dirs() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("optimized/nested/base-cv.json"));

    io::write_atomic(&path, b"{}").unwrap();

    assert!(path.exists());
}

#[test]
fn test_write_atomic_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("data-index.json"));

    io::write_atomic(&path, b"{}").unwrap();

    let names: Vec<String> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["data-index.json".to_string()]);
}

#[test]
fn test_failed_write_removes_staging_file() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("report.json")).unwrap();
    let path = NormalizedPath::new(temp.path().join("report.json"));

    let result = io::write_atomic(&path, b"{}");

    assert!(matches!(result, Err(cvdata_fs::Error::Io { .. })));
    let names: Vec<String> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["report.json".to_string()]);
}

#[test]
fn test_json_round_trip_is_pretty() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("report.json"));
    let value = json!({"overall": 91.5, "errors": []});

    io::write_json(&path, &value).unwrap();

    let raw = fs::read_to_string(path.to_native()).unwrap();
    assert!(raw.contains('\n'));
    assert!(raw.ends_with('\n'));
    let back: serde_json::Value = io::read_json(&path).unwrap();
    assert_eq!(back, value);
}

#[test]
fn test_read_json_reports_parse_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("broken.json");
    fs::write(&file_path, "{ not json").unwrap();

    let result: cvdata_fs::Result<serde_json::Value> =
        io::read_json(&NormalizedPath::new(&file_path));

    match result {
        Err(cvdata_fs::Error::Parse { format, .. }) => assert_eq!(format, "JSON"),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_read_text_missing_file() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("missing.json"));
    assert!(matches!(io::read_text(&path), Err(cvdata_fs::Error::Io { .. })));
}
