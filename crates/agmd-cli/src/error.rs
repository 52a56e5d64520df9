//! Error types for agmd-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from agmd-core
    #[error(transparent)]
    Core(#[from] agmd_core::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Sync finished but some entries failed
    #[error("{failed} of {total} path(s) failed to sync")]
    SyncFailed { failed: usize, total: usize },
}

impl From<agmd_core::FetchError> for CliError {
    fn from(error: agmd_core::FetchError) -> Self {
        Self::Core(error.into())
    }
}
