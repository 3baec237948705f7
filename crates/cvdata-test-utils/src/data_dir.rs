//! [`TestDataDir`] builder for toolkit test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use cvdata_fs::{DataLayout, NormalizedPath};
use serde_json::Value;
use tempfile::TempDir;

use crate::fixtures;

/// A temporary project directory holding a `data/` folder.
///
/// # Example
///
/// ```rust,no_run
/// use cvdata_test_utils::TestDataDir;
///
/// let dir = TestDataDir::new().with_v3_0_cv().with_activity();
/// dir.assert_file_exists("base-cv.json");
/// ```
pub struct TestDataDir {
    temp_dir: TempDir,
}

impl Default for TestDataDir {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDataDir {
    /// Create a project directory with an empty `data/` folder.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("data")).unwrap();
        Self { temp_dir }
    }

    /// The project directory (where `cvdata.toml` lives).
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.root().join("data")
    }

    /// Layout over the data directory.
    pub fn layout(&self) -> DataLayout {
        DataLayout::new(NormalizedPath::new(self.data_dir()))
    }

    /// Absolute path of a data-relative file.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.data_dir().join(relative)
    }

    /// Write `value` as pretty JSON under the data directory.
    pub fn write_json(&self, relative: &str, value: &Value) {
        let content = serde_json::to_string_pretty(value).unwrap();
        self.write_raw(relative, &format!("{content}\n"));
    }

    /// Write raw text under the data directory, creating parents.
    pub fn write_raw(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
    }

    /// Parse a data-relative JSON file.
    pub fn read_json(&self, relative: &str) -> Value {
        let path = self.path(relative);
        let content = fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()));
        serde_json::from_str(&content)
            .unwrap_or_else(|e| panic!("Invalid JSON in {}: {e}", path.display()))
    }

    pub fn with_document(self, relative: &str, value: &Value) -> Self {
        self.write_json(relative, value);
        self
    }

    pub fn with_v3_0_cv(self) -> Self {
        self.with_document("base-cv.json", &fixtures::cv_v3_0())
    }

    pub fn with_v3_1_cv(self) -> Self {
        self.with_document("base-cv.json", &fixtures::cv_v3_1())
    }

    pub fn with_v4_cv(self) -> Self {
        self.with_document("base-cv.json", &fixtures::cv_v4_0())
    }

    pub fn with_activity(self) -> Self {
        self.with_document("activity-summary.json", &fixtures::activity_summary())
    }

    pub fn with_enhancements(self) -> Self {
        self.with_document("ai-enhancements.json", &fixtures::ai_enhancements())
    }

    pub fn with_protection(self) -> Self {
        self.with_document("protected-content.json", &fixtures::protected_content())
    }

    /// Current CV plus the three companion documents.
    pub fn with_full_set(self) -> Self {
        self.with_v4_cv()
            .with_activity()
            .with_enhancements()
            .with_protection()
    }

    /// Write `cvdata.toml` in the project directory.
    pub fn with_settings(self, toml: &str) -> Self {
        fs::write(self.root().join("cvdata.toml"), toml).unwrap();
        self
    }

    /// Assert that `relative` exists under the data directory.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, relative: &str) {
        let path = self.path(relative);
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }

    /// Assert that `relative` does **not** exist under the data directory.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, relative: &str) {
        let path = self.path(relative);
        assert!(
            !path.exists(),
            "Expected file NOT to exist: {}",
            path.display()
        );
    }
}
