//! Subly CLI - Subscription detection for bank statements
//!
//! Usage:
//!   subly scan --file statement.csv      Find subscriptions in a statement
//!   subly extract "NETFLIX.COM"          Test service name extraction
//!   subly next --start 2024-01-31        Project the next payment date
//!   subly rules                          Show which rules are in effect

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Scan {
            file,
            format,
            delimiter,
            debits_negative,
            today,
            json,
        } => {
            let rules = commands::load_rules(cli.rules.as_deref())?;
            let options = commands::ScanOptions {
                format: format.as_deref(),
                delimiter: delimiter.as_deref(),
                debits_negative,
                today: today.as_deref(),
                json,
            };
            commands::cmd_scan(&rules, &file, &options)
        }
        Commands::Extract { descriptions } => {
            let rules = commands::load_rules(cli.rules.as_deref())?;
            commands::cmd_extract(&rules, &descriptions)
        }
        Commands::Next {
            start,
            cycle,
            today,
        } => commands::cmd_next(&start, &cycle, today.as_deref()),
        Commands::Rules { path, dump } => {
            if dump {
                commands::cmd_rules_dump()
            } else if path {
                commands::cmd_rules_path()
            } else {
                let rules = commands::load_rules(cli.rules.as_deref())?;
                commands::cmd_rules_show(&rules)
            }
        }
    }
}
