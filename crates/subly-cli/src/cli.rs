//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Subly - Find the subscriptions hiding in your bank statements
#[derive(Parser)]
#[command(name = "subly")]
#[command(about = "Detects recurring subscriptions in exported bank statements", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Rules file (defaults to the data-dir override, then built-in rules)
    #[arg(long, global = true)]
    pub rules: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a statement or subscription list for subscriptions
    Scan {
        /// CSV/TSV file to scan
        #[arg(short, long)]
        file: PathBuf,

        /// File shape: bank, subscriptions (auto-detected if not specified)
        #[arg(long)]
        format: Option<String>,

        /// Column delimiter: ',', ';' or tab (sniffed if not specified)
        #[arg(short, long)]
        delimiter: Option<String>,

        /// Outgoing payments are negative numbers in this file
        #[arg(long)]
        debits_negative: bool,

        /// Project next payments from this date instead of today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,

        /// Print candidates as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how descriptions are turned into service names
    Extract {
        /// Bank transaction descriptions to test
        #[arg(required = true)]
        descriptions: Vec<String>,
    },

    /// Project the next payment date of a subscription
    Next {
        /// First payment date
        #[arg(short, long)]
        start: String,

        /// Billing cycle: monthly, yearly
        #[arg(short, long, default_value = "monthly")]
        cycle: String,

        /// Project from this date instead of today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },

    /// Show which detection rules are in effect
    Rules {
        /// Print only the override file location
        #[arg(long)]
        path: bool,

        /// Print the built-in rules file (a starting point for an override)
        #[arg(long, conflicts_with = "path")]
        dump: bool,
    },
}
