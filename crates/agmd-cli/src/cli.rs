//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};

/// agmd - Compose AGENTS.md files from remote sources and local overrides
#[derive(Parser, Debug)]
#[command(name = "agmd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Maximum number of concurrent fetches
    #[arg(long, global = true, default_value_t = 8, value_name = "N")]
    pub jobs: usize,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 20, value_name = "SECS")]
    pub timeout: u64,

    /// How long to keep retrying transient failures, in seconds (0 disables)
    #[arg(long, global = true, default_value_t = 10, value_name = "SECS")]
    pub retry_window: u64,

    /// GitHub token for private repositories and higher rate limits
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub API base URL
    #[arg(
        long,
        global = true,
        env = "AGMD_GITHUB_API_URL",
        default_value = agmd_core::fetch::DEFAULT_API_URL
    )]
    pub api_url: String,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create agmd.yml and prepare the project
    ///
    /// Adds AGENTS.md and **/.agmd/ to .gitignore and renames existing
    /// AGENTS.md files to AGENTS.local.md.
    ///
    /// Examples:
    ///   agmd init
    ///   agmd init -m .=owner/repo -m docs=owner/repo/docs
    Init {
        /// Seed the manifest with PATH=SOURCE (repeatable)
        #[arg(short, long = "map", value_name = "PATH=SOURCE")]
        map: Vec<String>,
    },

    /// Track a source for a path and sync
    ///
    /// Examples:
    ///   agmd add owner/repo
    ///   agmd add owner/repo/tree/main/agents --path docs --module
    Add {
        /// Source reference (owner/repo[/subpath] or owner/repo/tree/<ref>[/subpath])
        source: String,

        /// Project path whose AGENTS.md receives the source
        #[arg(long, default_value = ".")]
        path: String,

        /// Also download the files next to the source's AGENTS.md into .agmd/
        #[arg(long)]
        module: bool,

        /// Branch, tag or commit to fetch instead of the default branch
        #[arg(long = "ref", value_name = "REF")]
        reference: Option<String>,

        /// Only update agmd.yml
        #[arg(long)]
        no_sync: bool,
    },

    /// Regenerate every AGENTS.md listed in agmd.yml
    Sync,
}
