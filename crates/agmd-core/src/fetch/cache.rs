//! Per-run fetch memoization

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::{ContentFetcher, FetchResult, FileTree, TreeLimits};
use crate::source::SourceLocation;

type Slot<T> = Arc<OnceCell<FetchResult<T>>>;

/// Memoizes another fetcher's results, failures included.
///
/// Keys are the full [`SourceLocation`] (plus the limits for trees).
/// Concurrent callers asking for the same key wait on a single underlying
/// fetch.
#[derive(Debug)]
pub struct CachingFetcher<F> {
    inner: F,
    files: Mutex<HashMap<SourceLocation, Slot<Vec<u8>>>>,
    trees: Mutex<HashMap<(SourceLocation, TreeLimits), Slot<FileTree>>>,
}

impl<F: ContentFetcher> CachingFetcher<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            files: Mutex::new(HashMap::new()),
            trees: Mutex::new(HashMap::new()),
        }
    }
}

fn slot<K: Eq + Hash, T>(map: &Mutex<HashMap<K, Slot<T>>>, key: K) -> Slot<T> {
    map.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(key)
        .or_default()
        .clone()
}

#[async_trait]
impl<F: ContentFetcher> ContentFetcher for CachingFetcher<F> {
    async fn fetch_file(&self, location: &SourceLocation) -> FetchResult<Vec<u8>> {
        let cell = slot(&self.files, location.clone());
        cell.get_or_init(|| self.inner.fetch_file(location))
            .await
            .clone()
    }

    async fn fetch_tree(
        &self,
        location: &SourceLocation,
        limits: TreeLimits,
    ) -> FetchResult<FileTree> {
        let cell = slot(&self.trees, (location.clone(), limits));
        cell.get_or_init(|| self.inner.fetch_tree(location, limits))
            .await
            .clone()
    }
}
