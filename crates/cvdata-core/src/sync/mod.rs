//! Change synchronization
//!
//! The sync index fingerprints every document under the data root. Drift
//! against the saved index is processed critical-first: caches are
//! refreshed through [`SyncHooks`], derived files from the
//! [`DependencyMap`] are marked pending, and a [`SyncScheduler`] sweeps
//! pending entries per priority tier.

mod cascade;
mod changes;
mod engine;
mod index;
mod scheduler;

pub use cascade::{DependencyMap, HookEvent, HookLog, SyncHooks};
pub use changes::{Change, ChangeKind, Drift, detect_data_changes, scan_drift};
pub use engine::{ProcessSummary, SyncEngine, SyncPerformanceReport, WatchSummary};
pub use index::{Priority, SyncIndex, SyncIndexEntry, SyncStatus, fingerprint};
pub(crate) use index::modified_at;
pub use scheduler::{SyncScheduler, Tier, TierSweep};
