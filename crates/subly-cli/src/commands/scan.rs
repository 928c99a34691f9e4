//! Scan command implementation

use std::path::Path;

use anyhow::{Context, Result};
use subly_core::{
    process_file, AmountSign, CandidateSubscription, Diagnostic, ImportFormat, ImportReport,
    LoadOptions, Rules,
};

use super::{resolve_today, truncate};

/// Raw `scan` arguments as given on the command line
#[derive(Debug, Default)]
pub struct ScanOptions<'a> {
    pub format: Option<&'a str>,
    pub delimiter: Option<&'a str>,
    pub debits_negative: bool,
    pub today: Option<&'a str>,
    pub json: bool,
}

impl ScanOptions<'_> {
    /// Validate the arguments into pipeline options
    pub fn load_options(&self) -> Result<LoadOptions> {
        let format = self
            .format
            .map(|f| f.parse::<ImportFormat>().map_err(|e| anyhow::anyhow!(e)))
            .transpose()?;
        let delimiter = self.delimiter.map(parse_delimiter).transpose()?;
        let amount_sign = if self.debits_negative {
            AmountSign::DebitsNegative
        } else {
            AmountSign::DebitsPositive
        };

        Ok(LoadOptions {
            format,
            delimiter,
            amount_sign,
        })
    }
}

/// Accepts a single ASCII character, or `tab` / `\t`
pub fn parse_delimiter(s: &str) -> Result<u8> {
    match s {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Ok(c as u8),
                _ => anyhow::bail!("Invalid delimiter: {:?} (expected one character)", s),
            }
        }
    }
}

pub fn cmd_scan(rules: &Rules, file: &Path, options: &ScanOptions) -> Result<()> {
    let load_options = options.load_options()?;
    let today = resolve_today(options.today)?;

    let report = process_file(file, &load_options, rules, today)
        .with_context(|| format!("Failed to scan {}", file.display()))?;

    if options.json {
        let json = serde_json::to_string_pretty(&report_json(&report))
            .context("Failed to serialize report")?;
        println!("{}", json);
        return Ok(());
    }

    println!(
        "📥 Scanned {} ({}, delimiter {:?})",
        file.display(),
        report.format,
        report.delimiter
    );
    print_report(&report);

    Ok(())
}

/// Machine-readable report: candidates plus every diagnostic
pub fn report_json(report: &ImportReport) -> serde_json::Value {
    let diagnostics: Vec<String> = report.diagnostics.iter().map(|d| d.to_string()).collect();
    serde_json::json!({
        "format": report.format.as_str(),
        "rows_read": report.rows_read,
        "candidates": report.candidates,
        "diagnostics": diagnostics,
        "found_nothing": report.found_nothing(),
    })
}

fn print_report(report: &ImportReport) {
    println!("   Rows read: {}", report.rows_read);

    for diagnostic in &report.diagnostics {
        if let Diagnostic::SkippedRow { .. } = diagnostic {
            println!("   ⚠️  {}", diagnostic);
        }
    }

    if report.found_nothing() {
        println!();
        println!("No recurring payments found in this file.");
        return;
    }

    println!();
    println!("📋 Candidate Subscriptions");
    println!("   ─────────────────────────────────────────────────────────────");
    for candidate in &report.candidates {
        println!("   {}", format_candidate(candidate));
    }
    println!();
    println!("   {} candidate(s)", report.candidates.len());
}

/// One table row for a candidate
pub fn format_candidate(candidate: &CandidateSubscription) -> String {
    let next = candidate
        .next_payment
        .map(|d| d.to_string())
        .unwrap_or_else(|| "?".to_string());
    format!(
        "{:24} │ {:>10}/{:<7} │ {:13} │ next {}",
        truncate(&candidate.name, 24),
        candidate.price.to_string(),
        candidate.billing_cycle.as_str(),
        candidate.category.as_str(),
        next
    )
}
