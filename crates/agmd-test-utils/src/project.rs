//! [`TestProject`] builder for agmd test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::git::fake_git_dir;

/// A temporary project directory with helpers for setup and assertions.
///
/// # Example
///
/// ```rust,no_run
/// use agmd_test_utils::TestProject;
///
/// let project = TestProject::with_git();
/// project.write("docs/AGENTS.md", "# Docs\n");
/// project.assert_file_contains("docs/AGENTS.md", "Docs");
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new()
                .unwrap_or_else(|e| panic!("TestProject::new: failed to create tempdir: {e}")),
        }
    }

    /// Create a temporary directory carrying a fake `.git` marker.
    pub fn with_git() -> Self {
        let project = Self::new();
        fake_git_dir(project.root());
        project
    }

    /// Root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `relative` inside the project.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("failed to create {}: {e}", parent.display()));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
        path
    }

    /// Create the directory `relative` and its parents.
    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(&path)
            .unwrap_or_else(|e| panic!("failed to create {}: {e}", path.display()));
        path
    }

    /// Read `relative` as UTF-8.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read(&self, relative: &str) -> String {
        let path = self.path(relative);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("could not read {}: {e}", path.display()))
    }

    /// Whether `relative` exists.
    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }

    /// Write `agmd.yml` at the project root.
    pub fn write_manifest(&self, yaml: &str) -> PathBuf {
        self.write("agmd.yml", yaml)
    }

    /// Assert that `relative` exists.
    pub fn assert_file_exists(&self, relative: &str) {
        let path = self.path(relative);
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }

    /// Assert that `relative` does **not** exist.
    pub fn assert_file_not_exists(&self, relative: &str) {
        let path = self.path(relative);
        assert!(
            !path.exists(),
            "Expected file NOT to exist: {}",
            path.display()
        );
    }

    /// Assert that the file at `relative` contains `content`.
    pub fn assert_file_contains(&self, relative: &str, content: &str) {
        let file_content = self.read(relative);
        assert!(
            file_content.contains(content),
            "File {relative} does not contain expected content.\nExpected: {content}\nActual: {file_content}"
        );
    }
}
