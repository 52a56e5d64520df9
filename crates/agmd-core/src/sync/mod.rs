//! Sync of manifest entries to `AGENTS.md` files
//!
//! - **engine**: resolve, fetch, compose and write every entry
//! - **modules**: staged rebuilds of `.agmd/` module directories
//! - **report**: per-entry outcomes

mod engine;
mod modules;
mod report;

pub use engine::{SyncEngine, SyncOptions};
pub use report::{EntryReport, EntryState, SourceFailure, SyncReport, WrittenDocument};
