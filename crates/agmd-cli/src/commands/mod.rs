//! Command implementations for agmd-cli

pub mod add;
pub mod init;
pub mod sync;

use std::path::Path;
use std::time::Duration;

use agmd_core::{GitHubConfig, RetryPolicy, SyncOptions, TreeLimits};
use agmd_fs::{NormalizedPath, find_project_root};

use crate::cli::Cli;

pub use add::run_add;
pub use init::run_init;
pub use sync::run_sync;

/// Network and concurrency settings shared by commands that sync.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub github: GitHubConfig,
    pub sync: SyncOptions,
}

impl FetchSettings {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            github: GitHubConfig {
                api_url: cli.api_url.clone(),
                token: cli.github_token.clone(),
                timeout: Duration::from_secs(cli.timeout.max(1)),
                retry: RetryPolicy {
                    max_elapsed: Duration::from_secs(cli.retry_window),
                    ..RetryPolicy::default()
                },
            },
            sync: SyncOptions {
                concurrency: cli.jobs.max(1),
                tree_limits: TreeLimits::default(),
            },
        }
    }
}

/// The project root for `cwd`: the nearest ancestor with `.git`, else `cwd`.
pub fn project_root(cwd: &Path) -> NormalizedPath {
    find_project_root(cwd)
}
