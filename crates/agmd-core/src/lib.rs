//! Core of agmd
//!
//! agmd composes each tracked directory's `AGENTS.md` from instruction files
//! fetched from remote repositories plus the directory's own
//! `AGENTS.local.md`, as listed in the project's `agmd.yml`.
//!
//! # Architecture
//!
//! Data flows one way:
//!
//! ```text
//! manifest ──> source ──> fetch ──> compose ──> filesystem
//!                 (sync::SyncEngine drives every entry)
//! ```
//!
//! - [`manifest`]: load, validate, edit and save `agmd.yml`
//! - [`source`]: parse source references into fetchable locations
//! - [`fetch`]: the [`ContentFetcher`] seam, the GitHub client and the cache
//! - [`compose`]: render a composed document
//! - [`sync`]: run a whole manifest and report per-entry outcomes
//! - [`init`]: one-time project bootstrapping

pub mod compose;
pub mod error;
pub mod fetch;
pub mod init;
pub mod manifest;
pub mod project;
pub mod source;
pub mod sync;

pub use compose::{Fragment, compose, is_composed_document};
pub use error::{Error, ErrorKind, Result};
pub use fetch::{
    CachingFetcher, ContentFetcher, FetchError, FileTree, GitHubConfig, GitHubFetcher,
    MemoryFetcher, RetryPolicy, TreeLimits,
};
#[cfg(any(test, feature = "test-export-mocks"))]
pub use fetch::MockContentFetcher;
pub use init::{InitOptions, InitReport, Migration, initialize};
pub use manifest::{AddOutcome, Manifest, ManifestEntry, SourceRef};
pub use project::normalize_entry_path;
pub use source::{SourceLocation, SourceSpec};
pub use sync::{EntryReport, EntryState, SourceFailure, SyncEngine, SyncOptions, SyncReport};
