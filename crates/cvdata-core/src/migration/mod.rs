//! Schema migrations
//!
//! A [`MigrationStrategy`] walks a document one edge of the version graph,
//! `from -> to`, through an ordered list of [`Transformation`]s and then
//! checks its post-conditions. The [`MigrationRegistry`] holds every known
//! edge (forward and rollback) and routes between versions; the
//! [`MigrationEngine`] applies routes to files on disk with a backup taken
//! first.

mod builtin;
mod engine;
mod registry;
mod transform;

pub use engine::{
    FileResult, FileStatus, MigrateOptions, MigrationEngine, MigrationOutcome, MigrationReport,
};
pub use registry::MigrationRegistry;
pub use transform::{
    MigrationStrategy, StepKey, Transformation, Validation, ValueTransform, apply_strategy,
};
