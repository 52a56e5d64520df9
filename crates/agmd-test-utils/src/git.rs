//! Fake git repository marker.

use std::fs;
use std::path::Path;

/// Creates a minimal `.git` directory without initialising a real repository.
///
/// agmd only looks for the `.git` marker when locating the project root, so
/// no object store is needed.
///
/// # Panics
/// Panics if the filesystem operations fail.
pub fn fake_git_dir(path: &Path) {
    fs::create_dir_all(path.join(".git/refs/heads"))
        .unwrap_or_else(|e| panic!("fake_git_dir: failed to create .git: {e}"));
    fs::write(path.join(".git/HEAD"), "ref: refs/heads/main\n")
        .unwrap_or_else(|e| panic!("fake_git_dir: failed to write HEAD: {e}"));
}
