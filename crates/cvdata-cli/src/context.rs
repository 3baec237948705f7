//! Project context resolution
//!
//! Every command runs against a project directory (where `cvdata.toml`
//! lives) and a data directory inside it.

use std::path::{Path, PathBuf};

use cvdata_core::config::{Settings, SettingsResolver};
use cvdata_fs::{DataLayout, NormalizedPath};

use crate::error::Result;

/// Resolved settings and data layout for one invocation.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub settings: Settings,
    pub layout: DataLayout,
}

impl CliContext {
    /// Resolve settings under `project`, then open the data directory.
    ///
    /// `data_dir` overrides the configured `data_dir`; relative paths are
    /// taken from `project`. The data directory must exist.
    pub fn load(project: &Path, data_dir: Option<&Path>, config: Option<&Path>) -> Result<Self> {
        let mut resolver = SettingsResolver::new(NormalizedPath::new(project));
        if let Some(config) = config {
            resolver = resolver.with_config_file(NormalizedPath::new(absolute(project, config)));
        }
        let settings = resolver.resolve()?;

        let data_root = match data_dir {
            Some(dir) => absolute(project, dir),
            None => absolute(project, Path::new(&settings.data_dir)),
        };
        tracing::debug!(data_dir = %data_root.display(), "resolved data directory");
        let layout = DataLayout::open(NormalizedPath::new(&data_root))?;

        Ok(Self { settings, layout })
    }
}

fn absolute(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvdata_test_utils::TestDataDir;

    #[test]
    fn test_defaults_to_data_folder() {
        let dir = TestDataDir::new();
        let ctx = CliContext::load(dir.root(), None, None).unwrap();
        assert_eq!(ctx.layout, dir.layout());
        assert_eq!(ctx.settings, Settings::default());
    }

    #[test]
    fn test_configured_data_dir_is_used() {
        let dir = TestDataDir::new().with_settings("data_dir = \"records\"\n");
        std::fs::create_dir_all(dir.root().join("records")).unwrap();

        let ctx = CliContext::load(dir.root(), None, None).unwrap();

        assert_eq!(
            ctx.layout,
            DataLayout::new(NormalizedPath::new(dir.root().join("records")))
        );
    }

    #[test]
    fn test_missing_data_dir_is_an_error() {
        let dir = TestDataDir::new();
        let result = CliContext::load(dir.root(), Some(Path::new("nowhere")), None);
        assert!(result.is_err());
    }
}
