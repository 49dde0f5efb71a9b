//! Preprocessing: validate rows and normalize sign, category and merchant

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::{Direction, Flow, SkipStats, TransactionRecord};
use crate::text::title_case;

/// A validated transaction ready for aggregation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedTransaction {
    pub date: NaiveDate,
    /// Signed: negative is money out
    pub amount: f64,
    pub flow: Flow,
    /// Always non-negative
    pub spend: f64,
    /// Trimmed and title-cased
    pub category: String,
    pub merchant: String,
}

impl PreparedTransaction {
    pub fn is_spend(&self) -> bool {
        self.flow == Flow::Out
    }
}

#[derive(Debug, Clone, Default)]
pub struct Prepared {
    pub rows: Vec<PreparedTransaction>,
    pub skipped: SkipStats,
}

impl Prepared {
    /// Outflow rows only
    pub fn spends(&self) -> impl Iterator<Item = &PreparedTransaction> {
        self.rows.iter().filter(|r| r.is_spend())
    }
}

/// Drop rows without a date or amount and normalize the rest
///
/// Debits become negative and credits positive regardless of the sign in
/// the source; rows of unknown direction keep their sign.
pub fn preprocess(records: &[TransactionRecord]) -> Prepared {
    let mut skipped = SkipStats::default();
    let mut rows = Vec::with_capacity(records.len());

    for record in records {
        let Some(date) = record.date else {
            skipped.missing_date += 1;
            continue;
        };
        let Some(raw) = record.amount.filter(|a| a.is_finite()) else {
            skipped.missing_amount += 1;
            continue;
        };

        let amount = match record.direction {
            Direction::Debit => -raw.abs(),
            Direction::Credit => raw.abs(),
            Direction::Unknown => raw,
        };

        let category = record
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(title_case)
            .unwrap_or_else(|| "Other".to_string());

        let merchant = record
            .merchant
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or("unknown")
            .to_string();

        rows.push(PreparedTransaction {
            date,
            amount,
            flow: if amount < 0.0 { Flow::Out } else { Flow::In },
            spend: amount.abs(),
            category,
            merchant,
        });
    }

    if skipped.total() > 0 {
        warn!(
            dropped = skipped.total(),
            missing_date = skipped.missing_date,
            missing_amount = skipped.missing_amount,
            "Dropped unusable transactions"
        );
    }
    debug!(rows = rows.len(), "Preprocessed transactions");

    Prepared { rows, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::record;

    #[test]
    fn test_sign_normalization() {
        let prepared = preprocess(&[
            record((2025, 1, 1), 100.0, Direction::Debit, "food", "A"),
            record((2025, 1, 1), -100.0, Direction::Credit, "salary", "B"),
            record((2025, 1, 1), -40.0, Direction::Unknown, "food", "C"),
            record((2025, 1, 1), 40.0, Direction::Unknown, "food", "D"),
        ]);

        let flows: Vec<(f64, Flow)> = prepared.rows.iter().map(|r| (r.amount, r.flow)).collect();
        assert_eq!(
            flows,
            vec![
                (-100.0, Flow::Out),
                (100.0, Flow::In),
                (-40.0, Flow::Out),
                (40.0, Flow::In)
            ]
        );
        assert!(prepared.rows.iter().all(|r| r.spend >= 0.0));
        assert_eq!(prepared.spends().count(), 2);
    }

    #[test]
    fn test_drops_and_counts() {
        let mut no_date = record((2025, 1, 1), 10.0, Direction::Debit, "food", "A");
        no_date.date = None;
        let mut no_amount = record((2025, 1, 1), 10.0, Direction::Debit, "food", "A");
        no_amount.amount = None;
        let mut nan_amount = record((2025, 1, 1), 10.0, Direction::Debit, "food", "A");
        nan_amount.amount = Some(f64::NAN);

        let prepared = preprocess(&[
            no_date,
            no_amount,
            nan_amount,
            record((2025, 1, 1), 10.0, Direction::Debit, "food", "A"),
        ]);
        assert_eq!(prepared.rows.len(), 1);
        assert_eq!(
            prepared.skipped,
            SkipStats {
                missing_date: 1,
                missing_amount: 2
            }
        );
    }

    #[test]
    fn test_defaults_and_title_case() {
        let mut bare = record((2025, 1, 1), 10.0, Direction::Debit, "", "");
        bare.category = None;
        let prepared = preprocess(&[
            bare,
            record((2025, 1, 1), 10.0, Direction::Debit, "  eating OUT ", "  Swiggy "),
        ]);

        assert_eq!(prepared.rows[0].category, "Other");
        assert_eq!(prepared.rows[0].merchant, "unknown");
        assert_eq!(prepared.rows[1].category, "Eating Out");
        assert_eq!(prepared.rows[1].merchant, "Swiggy");
    }
}
