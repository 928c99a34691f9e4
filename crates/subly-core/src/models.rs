//! Data models for Subly

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RowError;

/// Tabular shapes the loader understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportFormat {
    /// Date, Description, Amount
    BankStatement,
    /// Name, Price, Frequency, StartDate
    SubscriptionList,
}

impl ImportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BankStatement => "bank",
            Self::SubscriptionList => "subscriptions",
        }
    }

    /// Human-readable name, used in provenance notes
    pub fn label(&self) -> &'static str {
        match self {
            Self::BankStatement => "bank statement",
            Self::SubscriptionList => "subscription list",
        }
    }
}

impl std::str::FromStr for ImportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bank" | "statement" | "bank_statement" => Ok(Self::BankStatement),
            "subscriptions" | "list" | "subscription_list" => Ok(Self::SubscriptionList),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// How the source file signs outgoing payments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AmountSign {
    /// Payments are positive numbers (the exported statements we see most)
    #[default]
    DebitsPositive,
    /// Payments are negative numbers; the loader flips them
    DebitsNegative,
}

/// One statement row as read from the file
#[derive(Debug, Clone, PartialEq)]
pub struct RawTransaction {
    /// 1-based line in the source file
    pub line: u64,
    pub date: String,
    pub description: String,
    /// Already sign-normalized: payments are positive
    pub amount: Decimal,
}

/// One subscription-list row as read from the file
#[derive(Debug, Clone, PartialEq)]
pub struct RawListing {
    pub line: u64,
    pub name: String,
    pub price: Decimal,
    pub frequency: String,
    pub start_date: String,
}

/// A statement row that survived parsing
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTransaction {
    pub date: Option<NaiveDate>,
    pub description: String,
    /// Always > 0
    pub amount: Decimal,
}

/// Subscription billing cadence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillingCycle {
    #[default]
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "Monthly",
            Self::Yearly => "Yearly",
        }
    }

    /// Interpret a free-text frequency cell. Anything that is not clearly
    /// yearly is monthly.
    pub fn from_frequency(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "ročně" | "roční" | "rocne" | "yearly" | "annually" | "annual" | "year" => {
                Self::Yearly
            }
            _ => Self::Monthly,
        }
    }
}

impl std::str::FromStr for BillingCycle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" | "měsíčně" => Ok(Self::Monthly),
            "yearly" | "ročně" => Ok(Self::Yearly),
            _ => Err(format!("Unknown billing cycle: {}", s)),
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subscription category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Entertainment,
    Music,
    Storage,
    #[serde(rename = "AI")]
    Ai,
    Productivity,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entertainment => "Entertainment",
            Self::Music => "Music",
            Self::Storage => "Storage",
            Self::Ai => "AI",
            Self::Productivity => "Productivity",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A proposed subscription awaiting user confirmation. Never persisted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSubscription {
    pub name: String,
    pub price: Decimal,
    pub billing_cycle: BillingCycle,
    pub category: Category,
    pub start_date: Option<NaiveDate>,
    pub next_payment: Option<NaiveDate>,
    pub notes: String,
}

/// Something worth telling the user about an import that did not fail it
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    SkippedRow { line: u64, error: RowError },
    NoCandidates,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkippedRow { line, error } => write!(f, "line {}: skipped, {}", line, error),
            Self::NoCandidates => write!(f, "no recurring payments found"),
        }
    }
}

/// Result of running the whole pipeline over one file
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub format: ImportFormat,
    pub delimiter: char,
    /// Data rows read, including skipped ones
    pub rows_read: usize,
    pub candidates: Vec<CandidateSubscription>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ImportReport {
    /// The file was readable but nothing recurring was in it
    pub fn found_nothing(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn skipped_rows(&self) -> impl Iterator<Item = (u64, &RowError)> {
        self.diagnostics.iter().filter_map(|d| match d {
            Diagnostic::SkippedRow { line, error } => Some((*line, error)),
            Diagnostic::NoCandidates => None,
        })
    }
}
