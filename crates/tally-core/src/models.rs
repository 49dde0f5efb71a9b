//! Domain models for Tally

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Whether money left or entered the account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Debit,
    Credit,
    #[default]
    Unknown,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
            Self::Unknown => "unknown",
        }
    }

    /// Interpret a free-form type cell from an export ("DR", "Debit Card", "credit").
    ///
    /// A cell mentioning both wins for credit.
    pub fn from_type_label(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        if lower.contains("credit") || lower.contains("cr") {
            Self::Credit
        } else if lower.contains("debit") || lower.contains("dr") {
            Self::Debit
        } else {
            Self::Unknown
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debit" | "dr" => Ok(Self::Debit),
            "credit" | "cr" => Ok(Self::Credit),
            "unknown" | "" => Ok(Self::Unknown),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fixed category vocabulary assigned by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Grocery,
    Bank,
    Rent,
    Salary,
    Travel,
    Entertainment,
    Utilities,
    Shopping,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Grocery => "grocery",
            Self::Bank => "bank",
            Self::Rent => "rent",
            Self::Salary => "salary",
            Self::Travel => "travel",
            Self::Entertainment => "entertainment",
            Self::Utilities => "utilities",
            Self::Shopping => "shopping",
            Self::Other => "other",
        }
    }

    pub fn all() -> &'static [Category] {
        &[
            Self::Food,
            Self::Grocery,
            Self::Bank,
            Self::Rent,
            Self::Salary,
            Self::Travel,
            Self::Entertainment,
            Self::Utilities,
            Self::Shopping,
            Self::Other,
        ]
    }

    /// Map a loose label (e.g. from a classifier) onto the vocabulary.
    ///
    /// Returns None for labels with no sensible counterpart.
    pub fn from_label(label: &str) -> Option<Self> {
        let lower = label.trim().to_lowercase();
        if let Ok(category) = lower.parse() {
            return Some(category);
        }
        let category = match lower.as_str() {
            "dining" | "restaurant" | "food_delivery" | "restaurants" => Self::Food,
            "groceries" | "supermarket" => Self::Grocery,
            "financial" | "banking" | "transfer" | "atm" => Self::Bank,
            "housing" | "mortgage" => Self::Rent,
            "income" | "payroll" | "wages" => Self::Salary,
            "transport" | "transportation" | "rideshare" | "fuel" => Self::Travel,
            "streaming" | "movies" | "music" => Self::Entertainment,
            "utility" | "bills" | "telecom" | "recharge" => Self::Utilities,
            "retail" | "ecommerce" => Self::Shopping,
            "uncategorized" | "misc" => Self::Other,
            _ => return None,
        };
        Some(category)
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Category::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured result of reading one notification message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTransaction {
    /// Magnitude only; the sign lives in `direction`
    pub amount: Option<f64>,
    pub direction: Direction,
    pub occurred_at: Option<NaiveDate>,
    /// Title-cased display name
    pub merchant: Option<String>,
    pub category: Category,
    pub source_text: String,
}

impl ExtractedTransaction {
    /// Build the record the persistence layer stores for an SMS-sourced transaction.
    ///
    /// Messages without a recoverable date are stamped with `received_at`. An
    /// unknown direction is persisted as a debit, matching manual entry.
    pub fn to_stored(
        &self,
        id: i64,
        user_id: Option<i64>,
        received_at: DateTime<Utc>,
    ) -> Option<StoredTransaction> {
        let amount = self.amount?;
        let date = self
            .occurred_at
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .unwrap_or(received_at);

        Some(StoredTransaction {
            id,
            user_id,
            amount,
            kind: match self.direction {
                Direction::Credit => Direction::Credit,
                _ => Direction::Debit,
            },
            merchant: self.merchant.clone(),
            category: Some(self.category.as_str().to_string()),
            date,
            source: TransactionSource::Sms,
        })
    }
}

/// How a stored transaction entered the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionSource {
    #[default]
    Manual,
    Csv,
    Sms,
}

impl TransactionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Csv => "csv",
            Self::Sms => "sms",
        }
    }
}

impl std::str::FromStr for TransactionSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "csv" => Ok(Self::Csv),
            "sms" => Ok(Self::Sms),
            _ => Err(format!("Unknown transaction source: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted transaction as owned by the storage layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTransaction {
    pub id: i64,
    pub user_id: Option<i64>,
    pub amount: f64,
    /// Persisted as `type`: debit or credit
    #[serde(rename = "type")]
    pub kind: Direction,
    pub merchant: Option<String>,
    pub category: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub source: TransactionSource,
}

/// Loosely typed input row for the aggregator
///
/// Anything may be missing; rows without a date or amount are dropped during
/// preparation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub amount: Option<f64>,
    #[serde(default)]
    pub direction: Direction,
    pub date: Option<NaiveDate>,
    pub category: Option<String>,
    pub merchant: Option<String>,
}

impl From<&StoredTransaction> for TransactionRecord {
    fn from(tx: &StoredTransaction) -> Self {
        Self {
            amount: Some(tx.amount),
            direction: tx.kind,
            date: Some(tx.date.date_naive()),
            category: tx.category.clone(),
            merchant: tx.merchant.clone(),
        }
    }
}

impl From<&ExtractedTransaction> for TransactionRecord {
    fn from(tx: &ExtractedTransaction) -> Self {
        Self {
            amount: tx.amount,
            direction: tx.direction,
            date: tx.occurred_at,
            category: Some(tx.category.as_str().to_string()),
            merchant: tx.merchant.clone(),
        }
    }
}

/// Money flow after sign normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    In,
    Out,
}

/// Time-bucketing resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }

    pub fn all() -> &'static [Granularity] {
        &[
            Self::Day,
            Self::Week,
            Self::Month,
            Self::Quarter,
            Self::Year,
        ]
    }

    /// Sortable key of the period containing `date`
    ///
    /// Weeks start on Monday and are keyed by that Monday's date.
    pub fn period_key(&self, date: NaiveDate) -> String {
        match self {
            Self::Day => date.format("%Y-%m-%d").to_string(),
            Self::Week => {
                let offset = date.weekday().num_days_from_monday() as i64;
                (date - chrono::Duration::days(offset))
                    .format("%Y-%m-%d")
                    .to_string()
            }
            Self::Month => date.format("%Y-%m").to_string(),
            Self::Quarter => format!("{}Q{}", date.year(), (date.month() - 1) / 3 + 1),
            Self::Year => date.year().to_string(),
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" | "daily" => Ok(Self::Day),
            "week" | "weekly" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            "quarter" | "quarterly" => Ok(Self::Quarter),
            "year" | "yearly" => Ok(Self::Year),
            _ => Err(format!(
                "Unknown granularity: {} (valid: day, week, month, quarter, year)",
                s
            )),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ========== Report Models ==========

/// Spend totals for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationBucket {
    pub period_key: String,
    pub total_spend: f64,
    pub transaction_count: usize,
    pub average_transaction: f64,
}

/// Spend buckets for every granularity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeframeAggregates {
    pub daily: Vec<AggregationBucket>,
    pub weekly: Vec<AggregationBucket>,
    pub monthly: Vec<AggregationBucket>,
    pub quarterly: Vec<AggregationBucket>,
    pub yearly: Vec<AggregationBucket>,
}

impl TimeframeAggregates {
    pub fn get(&self, granularity: Granularity) -> &[AggregationBucket] {
        match granularity {
            Granularity::Day => &self.daily,
            Granularity::Week => &self.weekly,
            Granularity::Month => &self.monthly,
            Granularity::Quarter => &self.quarterly,
            Granularity::Year => &self.yearly,
        }
    }
}

/// Spend of one category within a scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub total_spend: f64,
    pub transaction_count: usize,
    pub average_transaction: f64,
    /// Share of the scope's total spend, 0-100
    pub share_pct: f64,
}

/// Category breakdowns for each period of a granularity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodBreakdown {
    pub granularity: Granularity,
    pub periods: BTreeMap<String, Vec<CategoryBreakdown>>,
}

/// Average spend on the first and last three days of a month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthEdgeSpend {
    pub start_avg: f64,
    pub end_avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantSummary {
    pub merchant: String,
    pub total_spend: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternReport {
    pub weekday_avg_spend: f64,
    pub weekend_avg_spend: f64,
    pub weekend_spike: bool,
    pub per_month_start_end: BTreeMap<String, MonthEdgeSpend>,
    /// At most ten, most frequent first
    pub top_merchants: Vec<MerchantSummary>,
}

/// Human-readable tier of the final behavior score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Persona {
    #[serde(rename = "Disciplined & Stable")]
    DisciplinedStable,
    #[serde(rename = "Moderate Spender")]
    ModerateSpender,
    #[serde(rename = "Unstable / Risky Patterns")]
    UnstableRisky,
    #[serde(rename = "Impulsive / High-risk")]
    ImpulsiveHighRisk,
}

impl Persona {
    /// Tier for a final score; lower bounds are inclusive
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::DisciplinedStable
        } else if score >= 60.0 {
            Self::ModerateSpender
        } else if score >= 40.0 {
            Self::UnstableRisky
        } else {
            Self::ImpulsiveHighRisk
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DisciplinedStable => "Disciplined & Stable",
            Self::ModerateSpender => "Moderate Spender",
            Self::UnstableRisky => "Unstable / Risky Patterns",
            Self::ImpulsiveHighRisk => "Impulsive / High-risk",
        }
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Composite 0-100 spending behavior score
///
/// Sub-scores are absent when there is too little monthly history to compute
/// them; `note` then explains why the neutral score was returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorScore {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_stability_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarterly_consistency_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_concentration_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overspend_score: Option<f64>,
    pub final_score: f64,
    pub persona_label: Persona,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Rows dropped while preparing transactions for analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipStats {
    pub missing_date: usize,
    pub missing_amount: usize,
}

impl SkipStats {
    pub fn total(&self) -> usize {
        self.missing_date + self.missing_amount
    }
}

/// Everything the aggregator computes for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorReport {
    pub transactions_analyzed: usize,
    pub skipped: SkipStats,
    pub aggregates: TimeframeAggregates,
    /// Sorted by total spend, largest first
    pub categories: Vec<CategoryBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories_by_period: Option<PeriodBreakdown>,
    pub patterns: PatternReport,
    pub score: BehaviorScore,
}
