//! Settings schema

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Data directory, relative to the settings file's directory
    pub data_dir: String,
    pub backup: BackupSettings,
    pub sync: SyncSettings,
    pub orchestrator: OrchestratorSettings,
    pub monitor: MonitorSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            backup: BackupSettings::default(),
            sync: SyncSettings::default(),
            orchestrator: OrchestratorSettings::default(),
            monitor: MonitorSettings::default(),
        }
    }
}

/// `[backup]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupSettings {
    /// Snapshots older than this are swept by retention cleanup
    pub retention_days: u32,
    /// Keep snapshot files on disk when their registry entries expire
    pub keep_files: bool,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            retention_days: 30,
            keep_files: false,
        }
    }
}

impl BackupSettings {
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.retention_days))
    }
}

/// `[sync]` section: cadence of each scheduler tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub critical_interval_secs: u64,
    pub normal_interval_secs: u64,
    pub background_interval_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            critical_interval_secs: 30,
            normal_interval_secs: 300,
            background_interval_secs: 3600,
        }
    }
}

impl SyncSettings {
    pub fn critical_interval(&self) -> Duration {
        Duration::from_secs(self.critical_interval_secs)
    }

    pub fn normal_interval(&self) -> Duration {
        Duration::from_secs(self.normal_interval_secs)
    }

    pub fn background_interval(&self) -> Duration {
        Duration::from_secs(self.background_interval_secs)
    }
}

/// `[orchestrator]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Run later stages after a stage fails
    pub continue_on_error: bool,
    /// Minimum health score for the pipeline to pass
    pub health_threshold: f64,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            continue_on_error: true,
            health_threshold: 70.0,
        }
    }
}

/// `[monitor]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Age in days at which a document's freshness reaches zero
    pub stale_after_days: u32,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            stale_after_days: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
[backup]
keep_files = true
"#,
        )
        .unwrap();

        assert!(settings.backup.keep_files);
        assert_eq!(settings.backup.retention_days, 30);
        assert_eq!(settings.data_dir, "data");
        assert_eq!(settings.sync.critical_interval(), Duration::from_secs(30));
    }

    #[test]
    fn empty_document_is_default() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }
}
