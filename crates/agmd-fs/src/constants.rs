//! Well-known file and directory names managed by agmd.

use std::path::Path;

/// Files and directories agmd reads or writes inside a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgmdPath {
    /// The manifest at the project root
    Manifest,
    /// The composed instructions file, one per tracked path
    Composed,
    /// The user-owned local override next to each composed file
    LocalOverride,
    /// Module storage directory next to each composed file
    ModulesDir,
    /// The ignore list at the project root
    GitIgnore,
    /// The `.git` directory marking the project root
    GitDir,
}

impl AgmdPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manifest => "agmd.yml",
            Self::Composed => "AGENTS.md",
            Self::LocalOverride => "AGENTS.local.md",
            Self::ModulesDir => ".agmd",
            Self::GitIgnore => ".gitignore",
            Self::GitDir => ".git",
        }
    }
}

/// Ignore-list rules `init` guarantees are present.
pub const IGNORE_RULES: [&str; 2] = ["AGENTS.md", "**/.agmd/"];

impl AsRef<Path> for AgmdPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for AgmdPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for AgmdPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
