//! Toolkit settings
//!
//! Settings come from `cvdata.toml` with an optional `cvdata.local.toml`
//! layered on top. Every key has a default, so an absent file is valid.

mod resolver;
mod settings;

pub use resolver::{LOCAL_SETTINGS_FILE, SETTINGS_FILE, SettingsResolver};
pub use settings::{BackupSettings, MonitorSettings, OrchestratorSettings, Settings, SyncSettings};
