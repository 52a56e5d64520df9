//! Sync command implementation

use std::path::Path;

use colored::Colorize;

use agmd_core::{EntryReport, EntryState, GitHubFetcher, Manifest, SyncEngine, SyncReport};
use agmd_fs::{AgmdPath, NormalizedPath};

use super::{FetchSettings, project_root};
use crate::error::{CliError, Result};

/// Run the sync command
///
/// Regenerates every `AGENTS.md` in the manifest. Fails when any entry
/// failed, after printing the full summary.
pub fn run_sync(cwd: &Path, settings: &FetchSettings) -> Result<()> {
    let root = project_root(cwd);
    let manifest = Manifest::load(&root.join(AgmdPath::Manifest.as_str()))?;

    if manifest.is_empty() {
        println!("No paths configured in {}.", AgmdPath::Manifest.as_str().cyan());
        return Ok(());
    }

    println!(
        "{} Syncing {} path(s)...",
        "=>".blue().bold(),
        manifest.entries().len()
    );
    let report = sync_manifest(&root, &manifest, settings)?;
    print_report(&report);
    check_report(&report)
}

/// Sync `manifest` with the GitHub fetcher on a fresh runtime.
pub fn sync_manifest(
    root: &NormalizedPath,
    manifest: &Manifest,
    settings: &FetchSettings,
) -> Result<SyncReport> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let fetcher = GitHubFetcher::new(settings.github.clone())?;
        let engine = SyncEngine::new(root.clone(), fetcher, settings.sync);
        Ok::<_, CliError>(engine.run(manifest).await)
    })
}

/// Print one line per entry plus any failures.
pub fn print_report(report: &SyncReport) {
    for entry in &report.entries {
        print_entry(entry);
    }
    println!();
    if report.has_failures() {
        println!(
            "{} {} written, {} failed",
            "FAILED".red().bold(),
            report.written_count(),
            report.failed_count()
        );
    } else {
        println!("{} {} written", "OK".green().bold(), report.written_count());
    }
}

fn print_entry(entry: &EntryReport) {
    match (&entry.state, &entry.written) {
        (EntryState::Written, Some(written)) => {
            let status = if written.unchanged {
                "Unchanged".dimmed()
            } else {
                "Refreshed".green()
            };
            println!("   {} {}", status, written.file);
            if let Some(modules_dir) = &written.modules_dir {
                println!(
                    "   {} {} ({} file(s))",
                    "Rebuilt".green(),
                    modules_dir,
                    written.module_files
                );
            }
        }
        (state, _) => {
            println!("   {} {} [{}]", "Failed".red(), entry.path.cyan(), state);
            for failure in &entry.failures {
                let source = failure.source.as_deref().unwrap_or("-");
                println!("      {} {}: {}", "!".red(), source.yellow(), failure.message);
            }
        }
    }
}

/// Turn a report with failures into an error for the exit status.
pub fn check_report(report: &SyncReport) -> Result<()> {
    if report.has_failures() {
        return Err(CliError::SyncFailed {
            failed: report.failed_count(),
            total: report.entries.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agmd_core::{ErrorKind, SourceFailure};

    fn failed_entry() -> EntryReport {
        EntryReport {
            path: "docs".to_string(),
            state: EntryState::Failed(ErrorKind::SourceNotFound),
            failures: vec![SourceFailure {
                source: Some("o/r".to_string()),
                kind: ErrorKind::SourceNotFound,
                message: "gone".to_string(),
            }],
            written: None,
        }
    }

    #[test]
    fn report_with_failures_is_an_error() {
        let report = SyncReport {
            entries: vec![failed_entry()],
        };

        let err = check_report(&report).unwrap_err();
        assert_eq!(err.to_string(), "1 of 1 path(s) failed to sync");
    }

    #[test]
    fn empty_report_is_ok() {
        assert!(check_report(&SyncReport::default()).is_ok());
    }
}
