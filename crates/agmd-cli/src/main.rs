//! agmd CLI
//!
//! Composes AGENTS.md files from remote sources listed in agmd.yml and each
//! directory's AGENTS.local.md.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use commands::FetchSettings;
use commands::add::AddArgs;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    tracing::debug!("Verbose mode enabled");

    let settings = FetchSettings::from_cli(&cli);
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { map } => commands::run_init(&cwd, &map),
        Commands::Add {
            source,
            path,
            module,
            reference,
            no_sync,
        } => commands::run_add(
            &cwd,
            &AddArgs {
                source,
                path,
                module,
                reference,
                no_sync,
            },
            &settings,
        ),
        Commands::Sync => commands::run_sync(&cwd, &settings),
    }
}
