//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use subly_core::{BillingCycle, CandidateSubscription, Category, ImportFormat, LoadOptions, Rules};
use tempfile::TempDir;

use crate::commands::{self, truncate, ScanOptions};

fn rules() -> Rules {
    Rules::embedded().unwrap()
}

/// Write a statement into a temp dir, returning (dir guard, path)
fn write_statement(content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("statement.csv");
    fs::write(&path, content).unwrap();
    (dir, path)
}

fn netflix_statement() -> &'static str {
    "Datum;Popis;Částka\n\
     15.01.2024;NETFLIX.COM;259,00\n\
     14.02.2024;NETFLIX.COM;259,00\n\
     15.03.2024;NETFLIX.COM;259,00\n"
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("Netflix", 10), "Netflix");
    assert_eq!(truncate("Adobe Creative Cloud", 10), "Adobe C...");
    // Counts characters, not bytes
    assert_eq!(truncate("Předplatné Čeština", 8), "Předp...");
}

#[test]
fn test_parse_day() {
    assert_eq!(
        commands::parse_day("2024-01-31").unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    );
    assert_eq!(
        commands::parse_day("31.1.2024").unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    );
    assert!(commands::parse_day("tomorrow").is_err());
}

#[test]
fn test_parse_delimiter() {
    assert_eq!(commands::parse_delimiter(";").unwrap(), b';');
    assert_eq!(commands::parse_delimiter("tab").unwrap(), b'\t');
    assert_eq!(commands::parse_delimiter("\\t").unwrap(), b'\t');
    assert!(commands::parse_delimiter(";;").is_err());
    assert!(commands::parse_delimiter("č").is_err());
}

#[test]
fn test_scan_options() {
    let options = ScanOptions {
        format: Some("subscriptions"),
        delimiter: Some(","),
        debits_negative: true,
        ..Default::default()
    };
    let load = options.load_options().unwrap();
    assert_eq!(load.format, Some(ImportFormat::SubscriptionList));
    assert_eq!(load.delimiter, Some(b','));
    assert_eq!(load.amount_sign, subly_core::AmountSign::DebitsNegative);

    let bad = ScanOptions {
        format: Some("xml"),
        ..Default::default()
    };
    assert!(bad.load_options().is_err());
}

#[test]
fn test_format_candidate() {
    let candidate = CandidateSubscription {
        name: "Netflix".into(),
        price: Decimal::new(259, 0),
        billing_cycle: BillingCycle::Monthly,
        category: Category::Entertainment,
        start_date: None,
        next_payment: None,
        notes: "Imported from bank statement - Netflix".into(),
    };
    let row = commands::format_candidate(&candidate);
    assert!(row.starts_with("Netflix"));
    assert!(row.contains("259/Monthly"));
    assert!(row.contains("Entertainment"));
    assert!(row.ends_with("next ?"));
}

// ========== Scan Command Tests ==========

#[test]
fn test_cmd_scan() {
    let (_dir, path) = write_statement(netflix_statement());
    let options = ScanOptions {
        today: Some("2024-03-20"),
        ..Default::default()
    };
    assert!(commands::cmd_scan(&rules(), &path, &options).is_ok());
}

#[test]
fn test_cmd_scan_json() {
    let (_dir, path) = write_statement(netflix_statement());
    let options = ScanOptions {
        today: Some("2024-03-20"),
        json: true,
        ..Default::default()
    };
    assert!(commands::cmd_scan(&rules(), &path, &options).is_ok());
}

#[test]
fn test_report_json_keeps_diagnostics() {
    let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let csv = "Date,Description,Amount\n\
               2024-01-15,NETFLIX.COM,259\n\
               2024-02-15,NETFLIX.COM,twelve\n";
    let report = subly_core::process(csv.as_bytes(), &LoadOptions::default(), &rules(), today).unwrap();

    let json = commands::report_json(&report);
    assert_eq!(json["candidates"][0]["name"], "Netflix");
    assert_eq!(
        json["diagnostics"][0],
        "line 3: skipped, unable to parse amount: \"twelve\""
    );
    assert_eq!(json["found_nothing"], false);

    let csv = "Date,Description,Amount\n2024-01-05,VÝBĚR Z BANKOMATU,2000\n";
    let report = subly_core::process(csv.as_bytes(), &LoadOptions::default(), &rules(), today).unwrap();

    let json = commands::report_json(&report);
    assert_eq!(json["candidates"].as_array().map(Vec::len), Some(0));
    assert_eq!(json["diagnostics"][0], "no recurring payments found");
    assert_eq!(json["found_nothing"], true);
}

#[test]
fn test_cmd_scan_nothing_found_is_ok() {
    let (_dir, path) = write_statement("Date,Description,Amount\n2024-01-05,VÝBĚR Z BANKOMATU,2000\n");
    assert!(commands::cmd_scan(&rules(), &path, &ScanOptions::default()).is_ok());
}

#[test]
fn test_cmd_scan_errors() {
    let (dir, path) = write_statement("Account,Balance\n1,2\n");
    let err = commands::cmd_scan(&rules(), &path, &ScanOptions::default()).unwrap_err();
    assert!(format!("{:#}", err).contains("Unsupported file format"));

    let missing = dir.path().join("missing.csv");
    assert!(commands::cmd_scan(&rules(), &missing, &ScanOptions::default()).is_err());

    let (_dir, path) = write_statement(netflix_statement());
    let bad_today = ScanOptions {
        today: Some("soon"),
        ..Default::default()
    };
    assert!(commands::cmd_scan(&rules(), &path, &bad_today).is_err());
}

// ========== Extract Command Tests ==========

#[test]
fn test_describe() {
    let rules = rules();

    let line = commands::describe(&rules, "NETFLIX.COM");
    assert!(line.contains("→ Netflix [Entertainment]"), "{line}");
    assert!(line.contains("rule: template"), "{line}");

    let line = commands::describe(&rules, "Nákup NETFLIX.COM");
    assert!(line.contains("not a subscription"), "{line}");
    assert!(line.contains("rule: generic-verb"), "{line}");

    let line = commands::describe(&rules, "ALBERT PRAHA");
    assert!(line.contains("rule: whitelist"), "{line}");
}

#[test]
fn test_cmd_extract() {
    let descriptions = vec!["SPOTIFY P2A4F1C".to_string(), "VÝBĚR Z BANKOMATU".to_string()];
    assert!(commands::cmd_extract(&rules(), &descriptions).is_ok());
}

// ========== Next Command Tests ==========

#[test]
fn test_cmd_next() {
    assert!(commands::cmd_next("2024-01-31", "monthly", Some("2024-02-10")).is_ok());
    assert!(commands::cmd_next("2024-01-31", "yearly", None).is_ok());
    assert!(commands::cmd_next("2024-01-31", "weekly", None).is_err());
    assert!(commands::cmd_next("later", "monthly", None).is_err());
    assert!(commands::cmd_next("2024-01-31", "monthly", Some("soon")).is_err());
}

// ========== Rules Command Tests ==========

#[test]
fn test_load_rules() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.toml");
    fs::write(&path, subly_core::default_rules_toml()).unwrap();

    let rules = commands::load_rules(Some(&path)).unwrap();
    assert_eq!(rules.source(), &subly_core::RulesSource::File(path));

    let missing = dir.path().join("missing.toml");
    let err = commands::load_rules(Some(&missing)).unwrap_err();
    assert!(err.to_string().contains("Failed to load rules"));
}

#[test]
fn test_cmd_rules() {
    assert!(commands::cmd_rules_show(&rules()).is_ok());
    assert!(commands::cmd_rules_path().is_ok());
    assert!(commands::cmd_rules_dump().is_ok());
}
