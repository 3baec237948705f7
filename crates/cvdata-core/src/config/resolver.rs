//! Layered settings resolution
//!
//! Layers, later overriding earlier:
//! 1. Built-in defaults
//! 2. `cvdata.toml` (or an explicit `--config` file)
//! 3. `cvdata.local.toml` next to it

use cvdata_fs::{ConfigStore, NormalizedPath};
use serde::Deserialize;

use super::settings::Settings;
use crate::{Error, Result};

/// Shared settings file name
pub const SETTINGS_FILE: &str = "cvdata.toml";

/// Untracked per-machine overrides
pub const LOCAL_SETTINGS_FILE: &str = "cvdata.local.toml";

/// Resolves [`Settings`] from the files in a project directory.
pub struct SettingsResolver {
    root: NormalizedPath,
    explicit: Option<NormalizedPath>,
}

impl SettingsResolver {
    /// Resolver looking for settings files in `root`.
    pub fn new(root: NormalizedPath) -> Self {
        Self {
            root,
            explicit: None,
        }
    }

    /// Use `path` instead of `<root>/cvdata.toml` for layer 2.
    ///
    /// The local override is then looked up next to `path`.
    pub fn with_config_file(mut self, path: NormalizedPath) -> Self {
        self.explicit = Some(path);
        self
    }

    fn settings_path(&self) -> NormalizedPath {
        self.explicit
            .clone()
            .unwrap_or_else(|| self.root.join(SETTINGS_FILE))
    }

    fn local_path(&self) -> NormalizedPath {
        self.settings_path()
            .parent()
            .unwrap_or_else(|| self.root.clone())
            .join(LOCAL_SETTINGS_FILE)
    }

    /// Merge every present layer into one [`Settings`].
    ///
    /// A missing explicit `--config` file is an error; missing implicit
    /// layers are skipped.
    pub fn resolve(&self) -> Result<Settings> {
        let store = ConfigStore::new();
        let mut merged = toml::Value::Table(toml::Table::new());

        let settings_path = self.settings_path();
        if settings_path.is_file() {
            tracing::debug!(path = %settings_path, "loading settings");
            let layer: toml::Value = store.load(&settings_path)?;
            deep_merge(&mut merged, layer);
        } else if self.explicit.is_some() {
            return Err(Error::InvalidConfig {
                path: settings_path.to_native(),
                message: "file does not exist".to_string(),
            });
        }

        let local_path = self.local_path();
        if local_path.is_file() {
            tracing::debug!(path = %local_path, "loading local overrides");
            let layer: toml::Value = store.load(&local_path)?;
            deep_merge(&mut merged, layer);
        }

        Settings::deserialize(merged).map_err(|e| Error::InvalidConfig {
            path: settings_path.to_native(),
            message: e.to_string(),
        })
    }

    /// Directory the settings are resolved from.
    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// Check if a shared settings file exists
    pub fn has_settings(&self) -> bool {
        self.settings_path().is_file()
    }

    /// Check if local overrides exist
    pub fn has_local_overrides(&self) -> bool {
        self.local_path().is_file()
    }
}

fn deep_merge(base: &mut toml::Value, other: toml::Value) {
    match (base, other) {
        (toml::Value::Table(base_map), toml::Value::Table(other_map)) => {
            for (key, other_val) in other_map {
                match base_map.get_mut(&key) {
                    Some(base_val) => deep_merge(base_val, other_val),
                    None => {
                        base_map.insert(key, other_val);
                    }
                }
            }
        }
        (base, other) => *base = other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn resolve_returns_defaults_when_no_config_exists() {
        let temp_dir = TempDir::new().unwrap();
        let resolver = SettingsResolver::new(NormalizedPath::new(temp_dir.path()));

        assert!(!resolver.has_settings());
        assert!(!resolver.has_local_overrides());
        assert_eq!(resolver.resolve().unwrap(), Settings::default());
    }

    #[test]
    fn local_overrides_win_per_key() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(SETTINGS_FILE),
            "data_dir = \"cv\"\n[backup]\nretention_days = 10\nkeep_files = true\n",
        )
        .unwrap();
        std::fs::write(
            temp_dir.path().join(LOCAL_SETTINGS_FILE),
            "[backup]\nretention_days = 3\n",
        )
        .unwrap();

        let settings = SettingsResolver::new(NormalizedPath::new(temp_dir.path()))
            .resolve()
            .unwrap();

        assert_eq!(settings.data_dir, "cv");
        assert_eq!(settings.backup.retention_days, 3);
        assert!(settings.backup.keep_files);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let root = NormalizedPath::new(temp_dir.path());
        let resolver = SettingsResolver::new(root.clone()).with_config_file(root.join("nope.toml"));

        assert!(matches!(resolver.resolve(), Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn wrong_type_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(SETTINGS_FILE),
            "[backup]\nretention_days = \"soon\"\n",
        )
        .unwrap();

        let result = SettingsResolver::new(NormalizedPath::new(temp_dir.path())).resolve();
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }
}
