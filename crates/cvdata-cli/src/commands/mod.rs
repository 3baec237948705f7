//! Command implementations for cvdata-cli

pub mod backup;
pub mod migrate;
pub mod monitor;
pub mod pipeline;
pub mod sync;
pub mod validate;

pub use backup::{run_backup_cleanup, run_backup_create, run_backup_list, run_backup_restore};
pub use migrate::{run_migrate, run_rollback};
pub use monitor::run_monitor;
pub use pipeline::run_pipeline;
pub use sync::{run_sync_detect, run_sync_index, run_sync_run, run_sync_watch};
pub use validate::run_validate;
