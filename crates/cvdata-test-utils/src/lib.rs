//! Shared test utilities for the cvdata workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`fixtures`] - realistic documents at every supported schema version
//! - [`data_dir`] - [`TestDataDir`](data_dir::TestDataDir) builder for a
//!   project directory with a seeded `data/` folder

pub mod data_dir;
pub mod fixtures;

pub use data_dir::TestDataDir;
