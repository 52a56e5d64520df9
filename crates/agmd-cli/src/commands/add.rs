//! Add command implementation

use std::path::Path;

use colored::Colorize;

use agmd_core::{AddOutcome, Manifest, SourceRef, normalize_entry_path};
use agmd_fs::AgmdPath;

use super::sync::{check_report, print_report, sync_manifest};
use super::{FetchSettings, project_root};
use crate::error::Result;

/// Arguments of `agmd add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddArgs {
    pub source: String,
    pub path: String,
    pub module: bool,
    pub reference: Option<String>,
    pub no_sync: bool,
}

/// Run the add command
///
/// Records the source in `agmd.yml`, then syncs the whole manifest unless
/// `--no-sync` was given.
pub fn run_add(cwd: &Path, args: &AddArgs, settings: &FetchSettings) -> Result<()> {
    let root = project_root(cwd);
    let manifest_path = root.join(AgmdPath::Manifest.as_str());
    let mut manifest = Manifest::load(&manifest_path)?;

    let key = normalize_entry_path(&args.path, &root)?;
    let source = SourceRef::new(args.source.trim())
        .module(args.module)
        .reference(args.reference.clone());
    let outcome = manifest.add_source(&key, source)?;

    match outcome {
        AddOutcome::Unchanged => {
            println!(
                "{} {} already tracked for {}",
                "=>".blue().bold(),
                args.source.trim().cyan(),
                key.cyan()
            );
        }
        AddOutcome::Added | AddOutcome::Updated => {
            manifest.save(&manifest_path)?;
            let verb = if outcome == AddOutcome::Added {
                "Added"
            } else {
                "Updated"
            };
            println!(
                "{} {} {} for {}",
                "OK".green().bold(),
                verb,
                args.source.trim().cyan(),
                key.cyan()
            );
        }
    }

    if args.no_sync {
        return Ok(());
    }

    println!("{} Syncing {} path(s)...", "=>".blue().bold(), manifest.entries().len());
    let report = sync_manifest(&root, &manifest, settings)?;
    print_report(&report);
    check_report(&report)
}
