//! Filesystem layer for the CV data toolkit
//!
//! Provides checksums, normalized paths, the data-directory layout and
//! atomic, locked I/O used by every other crate in the workspace.

pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod layout;
pub mod path;

pub use config::ConfigStore;
pub use constants::DataFile;
pub use error::{Error, Result};
pub use layout::DataLayout;
pub use path::NormalizedPath;
