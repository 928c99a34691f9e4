//! Candidate subscription assembly and the import pipeline entry points

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::detect::{detect_services, DetectedService};
use crate::error::{Result, RowError};
use crate::extract::title_case;
use crate::import::{load, parse_optional_date, parse_transaction, LoadOptions, RawRecords};
use crate::models::{
    BillingCycle, CandidateSubscription, Diagnostic, ImportFormat, ImportReport, ParsedTransaction,
    RawListing,
};
use crate::recurrence::project;
use crate::rules::Rules;

/// Provenance note attached to every candidate
pub fn provenance_note(format: ImportFormat, name: &str) -> String {
    format!("Imported from {} - {}", format.label(), name)
}

/// Turn detected services into candidates
pub fn assemble(
    detected: Vec<DetectedService>,
    format: ImportFormat,
    rules: &Rules,
    today: NaiveDate,
) -> Vec<CandidateSubscription> {
    detected
        .into_iter()
        .map(|service| CandidateSubscription {
            category: rules.classifier.classify(&service.name),
            next_payment: service
                .start_date
                .map(|start| project(start, service.billing_cycle, today)),
            notes: provenance_note(format, &service.name),
            price: service.price,
            billing_cycle: service.billing_cycle,
            start_date: service.start_date,
            name: service.name,
        })
        .collect()
}

/// A subscription-list row is a candidate as it stands. Rows with a
/// non-positive price are dropped.
pub fn listing_candidate(
    listing: &RawListing,
    rules: &Rules,
    today: NaiveDate,
) -> std::result::Result<Option<CandidateSubscription>, RowError> {
    if listing.price <= Decimal::ZERO {
        return Ok(None);
    }

    let name = title_case(listing.name.trim());
    let billing_cycle = BillingCycle::from_frequency(&listing.frequency);
    let start_date = parse_optional_date(&listing.start_date)?;

    Ok(Some(CandidateSubscription {
        category: rules.classifier.classify(&name),
        price: listing.price,
        billing_cycle,
        next_payment: start_date.map(|start| project(start, billing_cycle, today)),
        start_date,
        notes: provenance_note(ImportFormat::SubscriptionList, &name),
        name,
    }))
}

/// Run the whole pipeline over one file's contents
pub fn process<R: Read>(
    reader: R,
    options: &LoadOptions,
    rules: &Rules,
    today: NaiveDate,
) -> Result<ImportReport> {
    let loaded = load(reader, options)?;
    let mut diagnostics = loaded.diagnostics;

    let candidates = match loaded.records {
        RawRecords::Transactions(rows) => {
            let mut transactions: Vec<ParsedTransaction> = Vec::with_capacity(rows.len());
            for raw in &rows {
                match parse_transaction(raw) {
                    Ok(Some(tx)) => transactions.push(tx),
                    Ok(None) => {}
                    Err(error) => {
                        debug!("Skipping line {}: {}", raw.line, error);
                        diagnostics.push(Diagnostic::SkippedRow {
                            line: raw.line,
                            error,
                        });
                    }
                }
            }
            let detected = detect_services(&transactions, rules);
            assemble(detected, loaded.format, rules, today)
        }
        RawRecords::Listings(rows) => {
            let mut candidates = Vec::with_capacity(rows.len());
            for listing in &rows {
                match listing_candidate(listing, rules, today) {
                    Ok(Some(candidate)) => candidates.push(candidate),
                    Ok(None) => {}
                    Err(error) => {
                        debug!("Skipping line {}: {}", listing.line, error);
                        diagnostics.push(Diagnostic::SkippedRow {
                            line: listing.line,
                            error,
                        });
                    }
                }
            }
            candidates
        }
    };

    // Rows can be skipped at load time and again at parse time
    diagnostics.sort_by_key(|d| match d {
        Diagnostic::SkippedRow { line, .. } => *line,
        Diagnostic::NoCandidates => u64::MAX,
    });

    if candidates.is_empty() {
        diagnostics.push(Diagnostic::NoCandidates);
    }

    info!(
        "Processed {} ({} rows, {} skipped): {} candidate(s)",
        loaded.format.label(),
        loaded.rows_read,
        diagnostics.len() - usize::from(candidates.is_empty()),
        candidates.len()
    );

    Ok(ImportReport {
        format: loaded.format,
        delimiter: loaded.delimiter as char,
        rows_read: loaded.rows_read,
        candidates,
        diagnostics,
    })
}

/// Open a file and run [`process`] over it
pub fn process_file(
    path: &Path,
    options: &LoadOptions,
    rules: &Rules,
    today: NaiveDate,
) -> Result<ImportReport> {
    let file = File::open(path)?;
    process(BufReader::new(file), options, rules, today)
}
