//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `scan` - Run the detection pipeline over a file
//! - `extract` - Explain service name extraction for descriptions
//! - `next` - Next payment projection
//! - `rules` - Rules file location and summary

pub mod extract;
pub mod next;
pub mod rules;
pub mod scan;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use subly_core::Rules;

// Re-export command functions for main.rs
pub use extract::*;
pub use next::*;
pub use rules::*;
pub use scan::*;

/// Load detection rules: `--rules` path, data-dir override, or built-in
pub fn load_rules(path: Option<&Path>) -> Result<Rules> {
    let rules = match path {
        Some(path) => Rules::load(Some(path))
            .with_context(|| format!("Failed to load rules from {}", path.display()))?,
        None => Rules::load(None).context("Failed to load rules")?,
    };
    tracing::debug!("Using rules from {}", rules.source());
    Ok(rules)
}

/// Parse a `--today`-style date argument, defaulting to the local date
pub fn resolve_today(today: Option<&str>) -> Result<NaiveDate> {
    match today {
        Some(s) => parse_day(s),
        None => Ok(Local::now().date_naive()),
    }
}

/// Parse a date argument in any format the importer accepts
pub fn parse_day(s: &str) -> Result<NaiveDate> {
    subly_core::import::parse_date(s)
        .ok_or_else(|| anyhow::anyhow!("Invalid date: {} (expected YYYY-MM-DD)", s))
}

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
