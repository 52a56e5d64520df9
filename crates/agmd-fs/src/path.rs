//! Normalized path handling for manifest keys and I/O

use std::path::{Path, PathBuf};

/// A path normalized to forward slashes with `.`/`..` segments resolved
/// lexically.
///
/// Manifest entry paths are stored as root-relative keys (`.` for the project
/// root), so every comparison between a configured path and the project root
/// goes through this type rather than through `std::path` string formatting.
/// Resolution is purely lexical: symlinks are not followed and the path does
/// not need to exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: clean(&path_str.replace('\\', "/")),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a (possibly multi-segment) relative path.
    ///
    /// The result is cleaned, so `..` in `segment` may climb out of `self`.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        Self {
            inner: clean(&format!("{}/{}", self.inner, segment)),
        }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        match self.inner.rfind('/') {
            Some(0) if self.inner.len() > 1 => Some(Self {
                inner: "/".to_string(),
            }),
            Some(idx) if idx > 0 => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        match self.inner.rsplit('/').next() {
            Some("") | Some(".") | Some("..") | None => None,
            Some(name) => Some(name),
        }
    }

    pub fn is_absolute(&self) -> bool {
        self.inner.starts_with('/') || has_drive_prefix(&self.inner)
    }

    /// Express this path relative to `root`.
    ///
    /// Returns `"."` when both are equal and `None` when `self` is not inside
    /// `root`.
    pub fn strip_root(&self, root: &NormalizedPath) -> Option<String> {
        if self.inner == root.inner {
            return Some(".".to_string());
        }
        let prefix = if root.inner.ends_with('/') {
            root.inner.clone()
        } else {
            format!("{}/", root.inner)
        };
        self.inner
            .strip_prefix(&prefix)
            .filter(|rest| !rest.is_empty())
            .map(str::to_string)
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }
}

/// Resolve `.`, `..` and repeated separators without touching the filesystem.
fn clean(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                // `/..` is `/`
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}
