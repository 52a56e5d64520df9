//! Shared test fixtures for the agmd workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`]: a fake `.git` marker for project root detection
//! - [`project`]: [`TestProject`] builder for agmd project layouts

pub mod git;
pub mod project;

pub use git::fake_git_dir;
pub use project::TestProject;
