//! Transaction file ingestion with header inference
//!
//! Exports name their columns differently (`amt`, `txn_date`, `vendor`,
//! `debit/credit`...). Each field has a fixed list of accepted names, compared
//! case-insensitively; the first name present wins. Cells that cannot be
//! parsed become `None` and are dropped later by the aggregator.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{Direction, TransactionRecord};

const DATE_COLUMNS: &[&str] = &["date", "transaction_date", "txn_date", "timestamp"];
const AMOUNT_COLUMNS: &[&str] = &[
    "amount",
    "amt",
    "value",
    "transaction_amount",
    "debit",
    "credit",
];
const CATEGORY_COLUMNS: &[&str] = &["category", "cat", "expense_category", "label"];
const MERCHANT_COLUMNS: &[&str] = &["merchant", "vendor", "payee", "description", "narration"];
const TYPE_COLUMNS: &[&str] = &[
    "txn_type",
    "type",
    "transaction_type",
    "debit_credit",
    "debit/credit",
];

/// Where the amount comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountSource {
    /// One signed or unsigned amount column
    Column(String),
    /// Separate debit and credit columns: amount = credit - debit
    DebitCredit { debit: String, credit: String },
}

/// Header names chosen for each field (original spelling preserved)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    pub date: Option<String>,
    pub amount: Option<AmountSource>,
    pub category: Option<String>,
    pub merchant: Option<String>,
    pub kind: Option<String>,
}

/// Pick the column for each field from a header row
pub fn infer_columns<I, S>(headers: I) -> ColumnMapping
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    // lower-cased name -> original name, first occurrence wins
    let mut by_lower: HashMap<String, String> = HashMap::new();
    for header in headers {
        let original = header.as_ref().trim().to_string();
        by_lower.entry(original.to_lowercase()).or_insert(original);
    }

    let pick = |candidates: &[&str]| -> Option<String> {
        candidates
            .iter()
            .find_map(|c| by_lower.get(*c))
            .cloned()
    };

    let amount = pick(AMOUNT_COLUMNS).map(|column| {
        let lower = column.to_lowercase();
        match (by_lower.get("debit"), by_lower.get("credit")) {
            (Some(debit), Some(credit)) if lower == "debit" || lower == "credit" => {
                AmountSource::DebitCredit {
                    debit: debit.clone(),
                    credit: credit.clone(),
                }
            }
            _ => AmountSource::Column(column),
        }
    });

    ColumnMapping {
        date: pick(DATE_COLUMNS),
        amount,
        category: pick(CATEGORY_COLUMNS),
        merchant: pick(MERCHANT_COLUMNS),
        kind: pick(TYPE_COLUMNS),
    }
}

impl ColumnMapping {
    /// Date and amount are required to analyze anything
    fn validate(&self) -> Result<()> {
        if self.date.is_none() {
            return Err(Error::Import(
                "No date column found. Include a date/transaction_date column.".into(),
            ));
        }
        if self.amount.is_none() {
            return Err(Error::Import(
                "No amount column found. Include an amount column.".into(),
            ));
        }
        Ok(())
    }

    /// Build a record from a cell lookup keyed by original header name
    fn record<'a>(&self, cell: impl Fn(&str) -> Option<&'a str>) -> TransactionRecord {
        let text = |column: &Option<String>| -> Option<String> {
            column
                .as_deref()
                .and_then(&cell)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let amount = match &self.amount {
            Some(AmountSource::Column(column)) => cell(column.as_str()).and_then(parse_amount),
            Some(AmountSource::DebitCredit { debit, credit }) => {
                let debit = cell(debit.as_str()).and_then(parse_amount);
                let credit = cell(credit.as_str()).and_then(parse_amount);
                if debit.is_none() && credit.is_none() {
                    None
                } else {
                    Some(credit.unwrap_or(0.0) - debit.unwrap_or(0.0))
                }
            }
            None => None,
        };

        TransactionRecord {
            amount,
            direction: text(&self.kind)
                .map(|t| Direction::from_type_label(&t))
                .unwrap_or_default(),
            date: self
                .date
                .as_deref()
                .and_then(&cell)
                .and_then(parse_date),
            category: text(&self.category),
            merchant: text(&self.merchant),
        }
    }
}

/// Parse a CSV export
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<TransactionRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mapping = infer_columns(headers.iter());
    debug!(?mapping, "Inferred CSV columns");
    mapping.validate()?;

    let index: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h, i))
        .collect();

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        records.push(mapping.record(|column| index.get(column).and_then(|&i| row.get(i))));
    }

    info!(rows = records.len(), "Parsed CSV transactions");
    Ok(records)
}

/// Parse JSON: an array of objects, or `{"transactions": [...]}`
pub fn parse_json<R: Read>(reader: R) -> Result<Vec<TransactionRecord>> {
    let value: Value = serde_json::from_reader(reader)?;
    let rows = match value {
        Value::Array(rows) => rows,
        Value::Object(mut obj) => match obj.remove("transactions") {
            Some(Value::Array(rows)) => rows,
            _ => {
                return Err(Error::Import(
                    "Expected an array of transactions or a \"transactions\" array".into(),
                ))
            }
        },
        _ => return Err(Error::Import("Expected an array of transactions".into())),
    };

    // Cells as strings so JSON and CSV share one parsing path
    let rows: Vec<HashMap<String, String>> = rows
        .into_iter()
        .filter_map(|row| match row {
            Value::Object(obj) => Some(
                obj.into_iter()
                    .filter_map(|(k, v)| {
                        let cell = match v {
                            Value::String(s) => s,
                            Value::Number(n) => n.to_string(),
                            Value::Bool(b) => b.to_string(),
                            _ => return None,
                        };
                        Some((k, cell))
                    })
                    .collect(),
            ),
            _ => None,
        })
        .collect();

    let mut headers: Vec<&str> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !headers.contains(&key.as_str()) {
                headers.push(key);
            }
        }
    }
    // HashMap key order is arbitrary; sort so duplicates resolve the same way every run
    headers.sort_unstable();

    let mapping = infer_columns(headers);
    debug!(?mapping, "Inferred JSON fields");
    mapping.validate()?;

    let records: Vec<TransactionRecord> = rows
        .iter()
        .map(|row| mapping.record(|column| row.get(column).map(String::as_str)))
        .collect();

    info!(rows = records.len(), "Parsed JSON transactions");
    Ok(records)
}

/// Load a transaction file, choosing the parser by extension (`.json`, else CSV)
pub fn load_file(path: &Path) -> Result<Vec<TransactionRecord>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        parse_json(reader)
    } else {
        parse_csv(reader)
    }
}

/// Parse a date cell; time components are discarded
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    let formats = [
        "%Y-%m-%d", // 2025-11-21
        "%d/%m/%Y", // 21/11/2025
        "%m/%d/%Y", // 11/21/2025
        "%d-%m-%Y", // 21-11-2025
        "%d %b %Y", // 21 Nov 2025
        "%d-%b-%Y", // 21-Nov-2025
        "%b %d, %Y", // Nov 21, 2025
    ];
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parse an amount cell, handling currency markers, separators and
/// parenthesised negatives
pub fn parse_amount(s: &str) -> Option<f64> {
    let mut cleaned = s.trim().to_string();
    for prefix in ["INR", "inr", "Rs.", "rs.", "Rs", "rs", "USD"] {
        if let Some(rest) = cleaned.strip_prefix(prefix) {
            cleaned = rest.to_string();
            break;
        }
    }

    let cleaned: String = cleaned
        .replace(['₹', '$', ',', ' ', '\u{a0}'], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
