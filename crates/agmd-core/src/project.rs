//! Project-relative entry paths

use agmd_fs::NormalizedPath;

use crate::{Error, Result};

/// Normalize a user-supplied path to its manifest key.
///
/// Relative paths are taken relative to the project root. The result uses
/// forward slashes and is `.` for the root itself.
///
/// # Errors
///
/// Returns `Error::PathOutsideProject` if the path resolves outside `root`.
pub fn normalize_entry_path(raw: &str, root: &NormalizedPath) -> Result<String> {
    let raw = raw.trim();
    let candidate = NormalizedPath::new(raw);
    let resolved = if candidate.is_absolute() {
        candidate
    } else {
        root.join(raw)
    };

    resolved
        .strip_root(root)
        .ok_or_else(|| Error::PathOutsideProject {
            path: raw.to_string(),
            root: root.to_native(),
        })
}

/// Directory an entry's files are written to.
pub fn entry_dir(root: &NormalizedPath, key: &str) -> Result<NormalizedPath> {
    let dir = root.join(key);
    if NormalizedPath::new(key).is_absolute() || dir.strip_root(root).is_none() {
        return Err(Error::PathOutsideProject {
            path: key.to_string(),
            root: root.to_native(),
        });
    }
    Ok(dir)
}
