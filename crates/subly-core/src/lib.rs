//! Subly Core Library
//!
//! Finds recurring subscription payments in exported bank statements:
//! - Tabular import for statements and subscription lists (CSV, semicolon, tab)
//! - Service name extraction from free-text descriptions
//! - Category classification
//! - Grouping and monthly/yearly cadence detection
//! - Next payment projection
//! - Candidate assembly for the caller to confirm and persist
//!
//! Keyword tables, name templates and thresholds are loaded from a TOML rules
//! file (see [`rules`]). The pipeline holds no state between calls.

pub mod candidates;
pub mod categorize;
pub mod detect;
pub mod error;
pub mod extract;
pub mod import;
pub mod models;
pub mod recurrence;
pub mod rules;

pub use candidates::{process, process_file};
pub use categorize::CategoryClassifier;
pub use detect::{detect_cadence, group_by_service, DetectedService, ServiceGroup};
pub use error::{Error, Result, RowError};
pub use extract::{Explanation, ExtractionRule, ServiceNameExtractor, Verdict};
pub use import::{LoadOptions, LoadedFile, RawRecords};
pub use models::{
    AmountSign, BillingCycle, CandidateSubscription, Category, Diagnostic, ImportFormat,
    ImportReport, ParsedTransaction, RawListing, RawTransaction,
};
pub use recurrence::{project, project_from_today};
pub use rules::{default_rules_path, default_rules_toml, Rules, RulesSource};
