//! GitHub REST API client
//!
//! Directory listings come from the contents API
//! (`/repos/{owner}/{repo}/contents/{path}?ref={ref}`), file bytes from each
//! entry's `download_url`. When a location has no explicit ref the
//! repository's default branch is looked up once and remembered.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use super::{
    ContentFetcher, FetchError, FetchResult, FileTree, RetryPolicy, TreeLimits, retry_transient,
};
use crate::source::SourceLocation;

/// Public GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

const INSTRUCTIONS_FILE: &str = "AGENTS.md";
const USER_AGENT: &str = concat!("agmd/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`GitHubFetcher`].
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_url: String,
    /// Sent as a bearer token when present
    pub token: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ContentEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: u64,
    download_url: Option<String>,
}

/// The contents API returns a list for directories and an object for files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsPayload {
    Listing(Vec<ContentEntry>),
    Single(ContentEntry),
}

impl ContentsPayload {
    fn into_entries(self) -> Vec<ContentEntry> {
        match self {
            Self::Listing(entries) => entries,
            Self::Single(entry) => vec![entry],
        }
    }
}

#[derive(Debug, Deserialize)]
struct RepositoryInfo {
    default_branch: String,
}

/// [`ContentFetcher`] backed by the GitHub REST API.
#[derive(Debug)]
pub struct GitHubFetcher {
    client: Client,
    api_url: Url,
    token: Option<String>,
    retry: RetryPolicy,
    default_branches: Mutex<HashMap<(String, String), String>>,
}

impl GitHubFetcher {
    /// Build a fetcher.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Unreachable` if the API URL is not an absolute
    /// URL or the HTTP client cannot be constructed.
    pub fn new(config: GitHubConfig) -> FetchResult<Self> {
        let api_url = Url::parse(&config.api_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                FetchError::Unreachable(format!("invalid API URL '{}'", config.api_url))
            })?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Unreachable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url,
            token: config.token.filter(|t| !t.trim().is_empty()),
            retry: config.retry,
            default_branches: Mutex::new(HashMap::new()),
        })
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn contents_url(&self, owner: &str, repo: &str, path: &str, reference: &str) -> Url {
        let mut url = self.endpoint(
            ["repos", owner, repo, "contents"]
                .into_iter()
                .chain(path.split('/').filter(|s| !s.is_empty())),
        );
        url.query_pairs_mut().append_pair("ref", reference);
        url
    }

    async fn get(&self, url: &Url, accept: &str) -> FetchResult<reqwest::Response> {
        retry_transient(&self.retry, url.as_str(), || async {
            let mut request = self
                .client
                .get(url.clone())
                .header(reqwest::header::ACCEPT, accept);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }
            match request.send().await {
                Ok(response) if response.status().is_success() => Ok(response),
                Ok(response) => Err(classify_status(response.status(), url.as_str())),
                Err(e) => Err(classify_transport(&e, url.as_str())),
            }
        })
        .await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &Url) -> FetchResult<T> {
        let response = self.get(url, "application/vnd.github+json").await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| classify_transport(&e, url.as_str()))?;
        serde_json::from_slice(&body)
            .map_err(|e| FetchError::Unreachable(format!("invalid response from {}: {}", url, e)))
    }

    async fn download(&self, url: &str) -> FetchResult<Vec<u8>> {
        let url = Url::parse(url)
            .map_err(|e| FetchError::Unreachable(format!("invalid download URL '{}': {}", url, e)))?;
        let response = self.get(&url, "*/*").await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_transport(&e, url.as_str()))?;
        Ok(bytes.to_vec())
    }

    async fn resolve_reference(&self, location: &SourceLocation) -> FetchResult<String> {
        if let Some(reference) = &location.reference {
            return Ok(reference.clone());
        }

        let key = (location.owner.clone(), location.repo.clone());
        if let Some(branch) = self.cached_branch(&key) {
            return Ok(branch);
        }

        let url = self.endpoint(["repos", location.owner.as_str(), location.repo.as_str()]);
        let info: RepositoryInfo = self.get_json(&url).await?;
        tracing::debug!(
            owner = %location.owner,
            repo = %location.repo,
            branch = %info.default_branch,
            "Resolved default branch"
        );
        self.default_branches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, info.default_branch.clone());
        Ok(info.default_branch)
    }

    fn cached_branch(&self, key: &(String, String)) -> Option<String> {
        self.default_branches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    async fn list(
        &self,
        location: &SourceLocation,
        path: &str,
        reference: &str,
    ) -> FetchResult<Vec<ContentEntry>> {
        let url = self.contents_url(&location.owner, &location.repo, path, reference);
        let payload: ContentsPayload = self.get_json(&url).await?;
        Ok(payload.into_entries())
    }
}

#[async_trait]
impl ContentFetcher for GitHubFetcher {
    async fn fetch_file(&self, location: &SourceLocation) -> FetchResult<Vec<u8>> {
        let reference = self.resolve_reference(location).await?;
        let root = location.subpath.as_deref().unwrap_or_default();

        let entries = self.list(location, root, &reference).await?;
        let instructions = entries
            .into_iter()
            .find(|e| e.kind == "file" && e.name.eq_ignore_ascii_case(INSTRUCTIONS_FILE))
            .ok_or_else(|| {
                FetchError::NotFound(format!("no {} in {}", INSTRUCTIONS_FILE, location))
            })?;
        let download_url = instructions.download_url.ok_or_else(|| {
            FetchError::NotFound(format!("{} in {} is not downloadable", instructions.path, location))
        })?;

        let content = self.download(&download_url).await?;
        tracing::debug!(source = %location, bytes = content.len(), "Fetched instructions");
        Ok(content)
    }

    async fn fetch_tree(
        &self,
        location: &SourceLocation,
        limits: TreeLimits,
    ) -> FetchResult<FileTree> {
        let reference = self.resolve_reference(location).await?;
        let root = location.subpath.clone().unwrap_or_default();

        let mut pending = VecDeque::from([root.clone()]);
        let mut files = Vec::new();
        let mut total_bytes = 0u64;

        while let Some(directory) = pending.pop_front() {
            for entry in self.list(location, &directory, &reference).await? {
                match entry.kind.as_str() {
                    "dir" => pending.push_back(entry.path),
                    "file" => {
                        let Some(download_url) = entry.download_url else {
                            continue;
                        };
                        total_bytes += entry.size;
                        let relative = relative_to(&root, &entry.path, &entry.name);
                        files.push((relative, download_url));
                        limits.check(location, files.len(), total_bytes)?;
                    }
                    // Submodules and symlinks are not followed
                    _ => {}
                }
            }
        }

        if files.is_empty() {
            return Err(FetchError::NotFound(format!("no files under {}", location)));
        }

        let mut tree = FileTree::new();
        let mut downloaded = 0u64;
        for (relative, download_url) in files {
            let bytes = self.download(&download_url).await?;
            downloaded += bytes.len() as u64;
            limits.check(location, tree.len() + 1, downloaded)?;
            tree.insert(relative, bytes);
        }

        tracing::debug!(
            source = %location,
            files = tree.len(),
            bytes = downloaded,
            "Fetched module tree"
        );
        Ok(tree)
    }
}

/// Path of `entry_path` relative to the module root.
fn relative_to(root: &str, entry_path: &str, name: &str) -> String {
    let root = root.trim_matches('/');
    if root.is_empty() {
        return entry_path.to_string();
    }
    match entry_path.strip_prefix(root) {
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/').to_string(),
        // The location named a single file rather than a directory
        _ => name.to_string(),
    }
}

fn classify_status(status: StatusCode, url: &str) -> FetchError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            FetchError::Forbidden(format!("{} returned {}", url, status))
        }
        s if s.is_server_error() => FetchError::Unreachable(format!("{} returned {}", url, status)),
        _ => FetchError::NotFound(format!("{} returned {}", url, status)),
    }
}

fn classify_transport(error: &reqwest::Error, url: &str) -> FetchError {
    if error.is_timeout() {
        FetchError::Unreachable(format!("request to {} timed out", url))
    } else {
        FetchError::Unreachable(format!("request to {} failed: {}", url, error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn fetcher(api_url: &str) -> GitHubFetcher {
        GitHubFetcher::new(GitHubConfig {
            api_url: api_url.to_string(),
            ..GitHubConfig::default()
        })
        .unwrap()
    }

    #[rstest]
    #[case(StatusCode::NOT_FOUND, FetchError::NotFound(String::new()))]
    #[case(StatusCode::UNAUTHORIZED, FetchError::Forbidden(String::new()))]
    #[case(StatusCode::FORBIDDEN, FetchError::Forbidden(String::new()))]
    #[case(StatusCode::TOO_MANY_REQUESTS, FetchError::Forbidden(String::new()))]
    #[case(StatusCode::BAD_GATEWAY, FetchError::Unreachable(String::new()))]
    #[case(StatusCode::SERVICE_UNAVAILABLE, FetchError::Unreachable(String::new()))]
    fn status_codes_map_to_error_kinds(#[case] status: StatusCode, #[case] expected: FetchError) {
        assert_eq!(classify_status(status, "https://x").kind(), expected.kind());
    }

    #[test]
    fn contents_url_encodes_segments_and_ref() {
        let github = fetcher("https://api.github.com/");
        let url = github.contents_url("owner", "repo", "docs/my agents", "feature/x");

        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/owner/repo/contents/docs/my%20agents?ref=feature%2Fx"
        );
    }

    #[test]
    fn contents_url_for_repository_root() {
        let github = fetcher("http://localhost:8080/api/v3");
        let url = github.contents_url("o", "r", "", "main");

        assert_eq!(url.as_str(), "http://localhost:8080/api/v3/repos/o/r/contents?ref=main");
    }

    #[test]
    fn rejects_relative_api_url() {
        let err = GitHubFetcher::new(GitHubConfig {
            api_url: "not a url".to_string(),
            ..GitHubConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, FetchError::Unreachable(_)));
    }

    #[rstest]
    #[case("", "docs/a.md", "a.md", "docs/a.md")]
    #[case("docs", "docs/a.md", "a.md", "a.md")]
    #[case("docs/", "docs/nested/b.md", "b.md", "nested/b.md")]
    #[case("docs", "docs-old/a.md", "a.md", "a.md")]
    #[case("docs/AGENTS.md", "docs/AGENTS.md", "AGENTS.md", "AGENTS.md")]
    fn relative_paths_are_rooted_at_module(
        #[case] root: &str,
        #[case] entry_path: &str,
        #[case] name: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(relative_to(root, entry_path, name), expected);
    }

    #[test]
    fn contents_payload_accepts_listing_and_single_file() {
        let listing: ContentsPayload = serde_json::from_str(
            r#"[{"name":"AGENTS.md","path":"AGENTS.md","type":"file","size":3,
                 "download_url":"https://raw.example/AGENTS.md"},
                {"name":"docs","path":"docs","type":"dir","download_url":null}]"#,
        )
        .unwrap();
        let single: ContentsPayload = serde_json::from_str(
            r#"{"name":"a.md","path":"docs/a.md","type":"file","size":1,
                "download_url":"https://raw.example/docs/a.md","encoding":"base64"}"#,
        )
        .unwrap();

        assert_eq!(listing.into_entries().len(), 2);
        assert_eq!(single.into_entries()[0].path, "docs/a.md");
    }
}
