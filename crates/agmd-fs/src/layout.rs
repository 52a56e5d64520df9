//! Project root discovery

use crate::{AgmdPath, NormalizedPath};
use std::path::Path;

/// Find the project root for `start`.
///
/// Walks up from `start` looking for a `.git` entry and falls back to `start`
/// itself when no ancestor is a git checkout.
pub fn find_project_root(start: &Path) -> NormalizedPath {
    let found = start
        .ancestors()
        .find(|candidate| candidate.join(AgmdPath::GitDir.as_str()).exists());

    match found {
        Some(root) => {
            tracing::debug!(root = %root.display(), "Found project root");
            NormalizedPath::new(root)
        }
        None => NormalizedPath::new(start),
    }
}
