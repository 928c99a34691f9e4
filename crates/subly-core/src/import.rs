//! Tabular import for bank statements and subscription lists
//!
//! Two header shapes are understood:
//!
//! - Bank statement: `Date/Datum`, `Description/Popis`, `Amount/Částka`
//! - Subscription list: `Name/Název`, `Price/Cena`, `Frequency/Frekvence`,
//!   `StartDate/Začátek`
//!
//! The delimiter (tab, semicolon or comma) is sniffed from the header row
//! unless one is given. Rows that cannot be read are skipped and reported;
//! only an unrecognized header fails the whole file.

use std::io::Read;
use std::str::FromStr;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{Error, Result, RowError};
use crate::models::{
    AmountSign, Diagnostic, ImportFormat, ParsedTransaction, RawListing, RawTransaction,
};

/// Delimiters tried during sniffing, in order
const SNIFF_DELIMITERS: [u8; 3] = [b'\t', b';', b','];

/// Currency markers stripped from amount cells
const CURRENCY_TOKENS: [&str; 7] = ["Kč", "Kc", "CZK", "EUR", "USD", "$", "€"];

const DATE_FORMATS: [&str; 5] = [
    "%Y-%m-%d",    // 2024-01-15
    "%d.%m.%Y",    // 15.1.2024
    "%d. %m. %Y",  // 15. 1. 2024
    "%d/%m/%Y",    // 15/01/2024
    "%Y/%m/%d",    // 2024/01/15
];

const DATE_HEADERS: [&str; 2] = ["date", "datum"];
const DESCRIPTION_HEADERS: [&str; 2] = ["description", "popis"];
const AMOUNT_HEADERS: [&str; 2] = ["amount", "částka"];
const NAME_HEADERS: [&str; 3] = ["name", "název", "nazev"];
const PRICE_HEADERS: [&str; 2] = ["price", "cena"];
const FREQUENCY_HEADERS: [&str; 2] = ["frequency", "frekvence"];
const START_HEADERS: [&str; 5] = ["startdate", "start date", "start_date", "začátek", "zacatek"];

/// Caller-supplied knobs for [`load`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Force a header shape instead of detecting it
    pub format: Option<ImportFormat>,
    /// Force a delimiter instead of sniffing it
    pub delimiter: Option<u8>,
    pub amount_sign: AmountSign,
}

/// Rows read from a file, in file order
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecords {
    Transactions(Vec<RawTransaction>),
    Listings(Vec<RawListing>),
}

impl RawRecords {
    pub fn len(&self) -> usize {
        match self {
            Self::Transactions(rows) => rows.len(),
            Self::Listings(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Output of [`load`]
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub format: ImportFormat,
    pub delimiter: u8,
    pub records: RawRecords,
    /// Data rows seen, including skipped ones
    pub rows_read: usize,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BankColumns {
    date: Option<usize>,
    description: usize,
    amount: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ListColumns {
    name: usize,
    price: usize,
    frequency: Option<usize>,
    start_date: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Bank(BankColumns),
    List(ListColumns),
}

impl Layout {
    fn format(&self) -> ImportFormat {
        match self {
            Self::Bank(_) => ImportFormat::BankStatement,
            Self::List(_) => ImportFormat::SubscriptionList,
        }
    }
}

/// Read a statement or subscription list
pub fn load<R: Read>(mut reader: R, options: &LoadOptions) -> Result<LoadedFile> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let content = String::from_utf8_lossy(&bytes);
    let content = content.trim_start_matches('\u{feff}');

    let (delimiter, layout) = detect_layout(content, options)?;
    debug!(
        "Detected {} with delimiter {:?}",
        layout.format().label(),
        delimiter as char
    );

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let mut diagnostics = Vec::new();
    let mut transactions = Vec::new();
    let mut listings = Vec::new();
    let mut rows_read = 0;

    for (index, result) in rdr.records().enumerate() {
        rows_read += 1;
        // Header is line 1
        let fallback_line = index as u64 + 2;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map_or(fallback_line, |p| p.line());
                skip_row(&mut diagnostics, line, RowError::Malformed(e.to_string()));
                continue;
            }
        };
        let line = record.position().map_or(fallback_line, |p| p.line());

        let outcome = match layout {
            Layout::Bank(columns) => read_transaction(&record, line, columns, options.amount_sign)
                .map(|t| transactions.push(t)),
            Layout::List(columns) => read_listing(&record, line, columns).map(|l| listings.push(l)),
        };
        if let Err(error) = outcome {
            skip_row(&mut diagnostics, line, error);
        }
    }

    let records = match layout {
        Layout::Bank(_) => RawRecords::Transactions(transactions),
        Layout::List(_) => RawRecords::Listings(listings),
    };

    Ok(LoadedFile {
        format: layout.format(),
        delimiter,
        records,
        rows_read,
        diagnostics,
    })
}

/// Pick the delimiter and column layout from the header row
fn detect_layout(content: &str, options: &LoadOptions) -> Result<(u8, Layout)> {
    let candidates: Vec<u8> = match options.delimiter {
        Some(d) => vec![d],
        None => SNIFF_DELIMITERS.to_vec(),
    };

    for delimiter in candidates {
        let headers = read_headers(content, delimiter)?;
        // A sniffed delimiter that does not split the header is not the one
        if options.delimiter.is_none() && headers.len() < 2 {
            continue;
        }
        if let Some(layout) = match_layout(&headers, options.format) {
            return Ok((delimiter, layout));
        }
    }

    let header = content.lines().next().unwrap_or("").trim();
    Err(Error::UnsupportedFormat(match options.format {
        Some(format) => format!("header {:?} is not a {}", header, format.label()),
        None => format!("unrecognized header {:?}", header),
    }))
}

fn skip_row(diagnostics: &mut Vec<Diagnostic>, line: u64, error: RowError) {
    debug!("Skipping line {}: {}", line, error);
    diagnostics.push(Diagnostic::SkippedRow { line, error });
}

fn read_headers(content: &str, delimiter: u8) -> Result<StringRecord> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());
    Ok(rdr.headers()?.clone())
}

fn match_layout(headers: &StringRecord, declared: Option<ImportFormat>) -> Option<Layout> {
    let names: Vec<String> = headers.iter().map(normalize_header).collect();

    let bank = || {
        Some(Layout::Bank(BankColumns {
            date: find_column(&names, &DATE_HEADERS),
            description: find_column(&names, &DESCRIPTION_HEADERS)?,
            amount: find_column(&names, &AMOUNT_HEADERS)?,
        }))
    };
    let list = || {
        Some(Layout::List(ListColumns {
            name: find_column(&names, &NAME_HEADERS)?,
            price: find_column(&names, &PRICE_HEADERS)?,
            frequency: find_column(&names, &FREQUENCY_HEADERS),
            start_date: find_column(&names, &START_HEADERS),
        }))
    };

    match declared {
        Some(ImportFormat::BankStatement) => bank(),
        Some(ImportFormat::SubscriptionList) => list(),
        None => bank().or_else(list),
    }
}

fn find_column(names: &[String], aliases: &[&str]) -> Option<usize> {
    names
        .iter()
        .position(|name| aliases.iter().any(|alias| *alias == name.as_str()))
}

fn normalize_header(header: &str) -> String {
    let header = header.trim_start_matches('\u{feff}').trim().to_lowercase();
    // Accept the unaccented spelling too
    if header == "castka" {
        "částka".to_string()
    } else {
        header
    }
}

fn cell<'a>(
    record: &'a StringRecord,
    index: usize,
    column: &str,
) -> std::result::Result<&'a str, RowError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| RowError::Malformed(format!("missing {} column", column)))
}

fn optional_cell(record: &StringRecord, index: Option<usize>) -> String {
    index
        .and_then(|i| record.get(i))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn read_transaction(
    record: &StringRecord,
    line: u64,
    columns: BankColumns,
    sign: AmountSign,
) -> std::result::Result<RawTransaction, RowError> {
    let description = cell(record, columns.description, "description")?;
    if description.is_empty() {
        return Err(RowError::EmptyDescription);
    }

    let amount_str = cell(record, columns.amount, "amount")?;
    let amount = parse_amount(amount_str)
        .ok_or_else(|| RowError::InvalidAmount(amount_str.to_string()))?;
    let amount = match sign {
        AmountSign::DebitsPositive => amount,
        AmountSign::DebitsNegative => -amount,
    };

    Ok(RawTransaction {
        line,
        date: optional_cell(record, columns.date),
        description: description.to_string(),
        amount,
    })
}

fn read_listing(
    record: &StringRecord,
    line: u64,
    columns: ListColumns,
) -> std::result::Result<RawListing, RowError> {
    let name = cell(record, columns.name, "name")?;
    if name.is_empty() {
        return Err(RowError::EmptyName);
    }

    let price_str = cell(record, columns.price, "price")?;
    let price =
        parse_amount(price_str).ok_or_else(|| RowError::InvalidAmount(price_str.to_string()))?;

    Ok(RawListing {
        line,
        name: name.to_string(),
        price,
        frequency: optional_cell(record, columns.frequency),
        start_date: optional_cell(record, columns.start_date),
    })
}

/// Turn a raw statement row into a transaction.
///
/// `Ok(None)` means the row is not a payment (zero or incoming amount) and is
/// dropped without a diagnostic. An empty date cell gives an undated
/// transaction; a date that is present but unreadable is an error.
pub fn parse_transaction(
    raw: &RawTransaction,
) -> std::result::Result<Option<ParsedTransaction>, RowError> {
    if raw.amount <= Decimal::ZERO {
        return Ok(None);
    }

    Ok(Some(ParsedTransaction {
        date: parse_optional_date(&raw.date)?,
        description: raw.description.clone(),
        amount: raw.amount,
    }))
}

/// Parse a date cell; empty means absent
pub fn parse_optional_date(s: &str) -> std::result::Result<Option<NaiveDate>, RowError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    parse_date(s)
        .map(Some)
        .ok_or_else(|| RowError::InvalidDate(s.to_string()))
}

/// Parse a date in any of the supported formats
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parse an amount string, handling currency markers, thousands separators,
/// decimal commas and parenthesised negatives
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let mut cleaned = s.trim().to_string();
    for token in CURRENCY_TOKENS {
        cleaned = cleaned.replace(token, "");
    }
    // Covers regular and non-breaking spaces used as thousands separators
    let mut cleaned: String = cleaned.chars().filter(|c| !c.is_whitespace()).collect();

    let negative = cleaned.starts_with('(') && cleaned.ends_with(')');
    if negative {
        cleaned = cleaned[1..cleaned.len() - 1].to_string();
    }

    // With both separators present, the last one is the decimal point
    let cleaned = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, Some(_)) if is_thousands_grouped(&cleaned) => cleaned.replace(',', ""),
        (None, Some(_)) => cleaned.replace(',', "."),
        _ => cleaned,
    };
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);

    if cleaned.is_empty() {
        return None;
    }
    let amount = Decimal::from_str(cleaned).ok()?;
    Some(if negative { -amount } else { amount })
}

/// `1,234` or `-12,345,678`: every comma is followed by exactly three digits
fn is_thousands_grouped(s: &str) -> bool {
    let mut groups = s.split(',');
    let Some(lead) = groups.next() else {
        return false;
    };
    let lead = lead.trim_start_matches(|c: char| c == '-' || c == '+');
    let digits = |g: &str| g.bytes().all(|b| b.is_ascii_digit());

    !lead.is_empty()
        && lead.len() <= 3
        && digits(lead)
        && groups.all(|g| g.len() == 3 && digits(g))
}
