//! Filesystem primitives for agmd
//!
//! Provides normalized paths, atomic writes, checksums, the well-known file
//! names agmd manages, ignore-list editing and project-root discovery.

pub mod checksum;
pub mod constants;
pub mod error;
pub mod ignore;
pub mod io;
pub mod layout;
pub mod path;

pub use constants::AgmdPath;
pub use error::{Error, Result};
pub use layout::find_project_root;
pub use path::NormalizedPath;
