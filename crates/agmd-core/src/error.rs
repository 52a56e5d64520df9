//! Error types for agmd-core

use std::fmt;
use std::path::PathBuf;

use crate::fetch::FetchError;

/// Result type for agmd-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in agmd-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A source reference could not be parsed or conflicts with another
    #[error("Invalid source reference '{input}': {reason}")]
    InvalidSourceRef { input: String, reason: String },

    /// The manifest file does not exist
    #[error("Missing manifest: {path}. Run `agmd init` first.")]
    ManifestMissing { path: PathBuf },

    /// The manifest exists but does not match the schema
    #[error("Invalid manifest {path} at `{pointer}`: {message}")]
    ManifestCorrupt {
        path: PathBuf,
        pointer: String,
        message: String,
    },

    /// A remote fetch failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Init found a shared file to migrate but the override already exists
    #[error("Refusing to rename {shared}: {path} already exists")]
    OverrideAlreadyExists { path: PathBuf, shared: PathBuf },

    /// A configured path resolves outside the project
    #[error("Path '{path}' must be within the project root '{root}'")]
    PathOutsideProject { path: String, root: PathBuf },

    /// An `init --map` argument is malformed
    #[error("Invalid mapping '{mapping}': {reason}")]
    InvalidMapping { mapping: String, reason: String },

    /// Filesystem error from agmd-fs
    #[error(transparent)]
    Fs(#[from] agmd_fs::Error),

    /// YAML serialization error
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub(crate) fn invalid_source(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSourceRef {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// The report category for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSourceRef { .. } => ErrorKind::InvalidSourceRef,
            Self::ManifestMissing { .. } => ErrorKind::ManifestMissing,
            Self::ManifestCorrupt { .. } => ErrorKind::ManifestCorrupt,
            Self::Fetch(e) => e.kind(),
            Self::OverrideAlreadyExists { .. } => ErrorKind::OverrideAlreadyExists,
            Self::PathOutsideProject { .. } => ErrorKind::PathOutsideProject,
            Self::InvalidMapping { .. } => ErrorKind::InvalidMapping,
            Self::Fs(_) | Self::Yaml(_) => ErrorKind::Io,
        }
    }
}

/// Error categories, as shown in the sync summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidSourceRef,
    ManifestMissing,
    ManifestCorrupt,
    SourceNotFound,
    SourceUnreachable,
    SourceForbidden,
    SourceTreeTooLarge,
    OverrideAlreadyExists,
    PathOutsideProject,
    InvalidMapping,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidSourceRef => "InvalidSourceRef",
            Self::ManifestMissing => "ManifestMissing",
            Self::ManifestCorrupt => "ManifestCorrupt",
            Self::SourceNotFound => "SourceNotFound",
            Self::SourceUnreachable => "SourceUnreachable",
            Self::SourceForbidden => "SourceForbidden",
            Self::SourceTreeTooLarge => "SourceTreeTooLarge",
            Self::OverrideAlreadyExists => "OverrideAlreadyExists",
            Self::PathOutsideProject => "PathOutsideProject",
            Self::InvalidMapping => "InvalidMapping",
            Self::Io => "Io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
