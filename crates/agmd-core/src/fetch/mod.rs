//! Content fetching
//!
//! [`ContentFetcher`] is the seam between the sync engine and the network.
//! [`GitHubFetcher`] talks to the GitHub REST API, [`CachingFetcher`] memoizes
//! any fetcher for the length of one sync run and [`MemoryFetcher`] serves
//! canned content for offline use.

mod cache;
mod github;
mod memory;
mod retry;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::ErrorKind;
use crate::source::SourceLocation;

pub use cache::CachingFetcher;
pub use github::{DEFAULT_API_URL, DEFAULT_TIMEOUT, GitHubConfig, GitHubFetcher};
pub use memory::MemoryFetcher;
pub use retry::{RetryPolicy, retry_transient};

/// Files under a module source, keyed by path relative to the source root.
pub type FileTree = BTreeMap<String, Vec<u8>>;

/// Result type for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Why a fetch failed.
///
/// Cloneable so one failure can be shared by every caller of a cached fetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Source not found: {0}")]
    NotFound(String),

    #[error("Source unreachable: {0}")]
    Unreachable(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Source tree too large: {0}")]
    TreeTooLarge(String),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::SourceNotFound,
            Self::Unreachable(_) => ErrorKind::SourceUnreachable,
            Self::Forbidden(_) => ErrorKind::SourceForbidden,
            Self::TreeTooLarge(_) => ErrorKind::SourceTreeTooLarge,
        }
    }

    /// Only transport-level failures are worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

/// Ceilings applied while fetching a module tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeLimits {
    pub max_files: usize,
    pub max_bytes: u64,
}

impl Default for TreeLimits {
    fn default() -> Self {
        Self {
            max_files: 500,
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

impl TreeLimits {
    /// Fail with `TreeTooLarge` once `files` or `bytes` exceeds a ceiling.
    pub fn check(&self, location: &SourceLocation, files: usize, bytes: u64) -> FetchResult<()> {
        if files > self.max_files {
            return Err(FetchError::TreeTooLarge(format!(
                "{} has more than {} files",
                location, self.max_files
            )));
        }
        if bytes > self.max_bytes {
            return Err(FetchError::TreeTooLarge(format!(
                "{} is larger than {} bytes",
                location, self.max_bytes
            )));
        }
        Ok(())
    }
}

/// Retrieves instruction files and module trees from a remote source.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the `AGENTS.md` at the location (file name matched
    /// case-insensitively).
    async fn fetch_file(&self, location: &SourceLocation) -> FetchResult<Vec<u8>>;

    /// Fetch every file under the location.
    async fn fetch_tree(
        &self,
        location: &SourceLocation,
        limits: TreeLimits,
    ) -> FetchResult<FileTree>;
}

#[async_trait]
impl<T: ContentFetcher + ?Sized> ContentFetcher for Arc<T> {
    async fn fetch_file(&self, location: &SourceLocation) -> FetchResult<Vec<u8>> {
        (**self).fetch_file(location).await
    }

    async fn fetch_tree(
        &self,
        location: &SourceLocation,
        limits: TreeLimits,
    ) -> FetchResult<FileTree> {
        (**self).fetch_tree(location, limits).await
    }
}

#[async_trait]
impl<'a, T: ContentFetcher + ?Sized> ContentFetcher for &'a T {
    async fn fetch_file(&self, location: &SourceLocation) -> FetchResult<Vec<u8>> {
        (**self).fetch_file(location).await
    }

    async fn fetch_tree(
        &self,
        location: &SourceLocation,
        limits: TreeLimits,
    ) -> FetchResult<FileTree> {
        (**self).fetch_tree(location, limits).await
    }
}
