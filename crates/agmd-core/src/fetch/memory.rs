//! In-memory fetcher

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{ContentFetcher, FetchError, FetchResult, FileTree, TreeLimits};
use crate::source::SourceLocation;

/// Serves canned content keyed by [`SourceLocation`].
///
/// Unknown locations fail with `FetchError::NotFound`. Every call is counted,
/// which lets callers verify how often the network would have been hit.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    files: HashMap<SourceLocation, FetchResult<Vec<u8>>>,
    trees: HashMap<SourceLocation, FetchResult<FileTree>>,
    calls: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` as the location's `AGENTS.md`.
    pub fn with_file(mut self, location: SourceLocation, content: impl Into<Vec<u8>>) -> Self {
        self.files.insert(location, Ok(content.into()));
        self
    }

    /// Serve `files` as the location's module tree.
    pub fn with_tree<I, P, C>(mut self, location: SourceLocation, files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<Vec<u8>>,
    {
        let tree = files
            .into_iter()
            .map(|(path, content)| (path.into(), content.into()))
            .collect();
        self.trees.insert(location, Ok(tree));
        self
    }

    /// Fail both file and tree fetches for the location with `error`.
    pub fn with_error(mut self, location: SourceLocation, error: FetchError) -> Self {
        self.files.insert(location.clone(), Err(error.clone()));
        self.trees.insert(location, Err(error));
        self
    }

    /// Number of fetches served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentFetcher for MemoryFetcher {
    async fn fetch_file(&self, location: &SourceLocation) -> FetchResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.files
            .get(location)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::NotFound(format!("no AGENTS.md in {}", location))))
    }

    async fn fetch_tree(
        &self,
        location: &SourceLocation,
        limits: TreeLimits,
    ) -> FetchResult<FileTree> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let tree = self
            .trees
            .get(location)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::NotFound(format!("no files under {}", location))))?;

        let bytes = tree.values().map(|content| content.len() as u64).sum();
        limits.check(location, tree.len(), bytes)?;
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_registered_content_and_counts_calls() {
        let location = SourceLocation::new("o", "r");
        let fetcher = MemoryFetcher::new().with_file(location.clone(), "# hi\n");

        assert_eq!(fetcher.fetch_file(&location).await, Ok(b"# hi\n".to_vec()));
        assert!(matches!(
            fetcher.fetch_file(&SourceLocation::new("o", "missing")).await,
            Err(FetchError::NotFound(_))
        ));
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn tree_respects_limits() {
        let location = SourceLocation::new("o", "r");
        let fetcher = MemoryFetcher::new().with_tree(
            location.clone(),
            [("a.md", "aaaa"), ("b/c.md", "cccc")],
        );
        let tight = TreeLimits {
            max_files: 1,
            ..TreeLimits::default()
        };

        assert_eq!(
            fetcher
                .fetch_tree(&location, TreeLimits::default())
                .await
                .unwrap()
                .len(),
            2
        );
        assert!(matches!(
            fetcher.fetch_tree(&location, tight).await,
            Err(FetchError::TreeTooLarge(_))
        ));
    }
}
