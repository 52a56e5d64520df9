//! Init command implementation

use std::path::Path;

use colored::Colorize;

use agmd_core::{InitOptions, initialize};

use super::project_root;
use crate::error::Result;

/// Run the init command
///
/// Creates `agmd.yml` if missing, ensures the ignore rules and migrates
/// shared `AGENTS.md` files to `AGENTS.local.md`.
pub fn run_init(cwd: &Path, mappings: &[String]) -> Result<()> {
    let root = project_root(cwd);
    println!("{} Initializing agmd in {}", "=>".blue().bold(), root.as_str().cyan());

    let report = initialize(
        &root,
        &InitOptions {
            mappings: mappings.to_vec(),
        },
    )?;

    if report.manifest_created {
        println!("   {} {}", "Created".green(), report.manifest);
    } else {
        println!("   {} existing {}", "Kept".dimmed(), report.manifest);
        if report.mappings_ignored {
            println!(
                "   {} --map ignored because the manifest already exists; use {}",
                "!".yellow(),
                "agmd add".cyan()
            );
        }
    }

    if report.ignore_rules_added.is_empty() {
        println!("   {} {} already up to date", "Kept".dimmed(), report.ignore_file);
    } else {
        println!(
            "   {} {} ({})",
            "Updated".green(),
            report.ignore_file,
            report.ignore_rules_added.join(", ")
        );
    }

    for migration in &report.renamed {
        println!(
            "   {} {} -> {}",
            "Renamed".green(),
            migration.from,
            migration.to
        );
    }
    println!(
        "{} Renamed {} AGENTS.md file(s) to AGENTS.local.md",
        "OK".green().bold(),
        report.renamed.len()
    );
    Ok(())
}
