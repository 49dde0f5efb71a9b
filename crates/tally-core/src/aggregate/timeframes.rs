//! Time-bucketed spend totals and category breakdowns
//!
//! Only outflow rows count towards any of these figures.

use std::collections::BTreeMap;

use crate::models::{
    AggregationBucket, CategoryBreakdown, Granularity, PeriodBreakdown, TimeframeAggregates,
};

use super::prepare::PreparedTransaction;

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    sum: f64,
    count: usize,
}

impl Totals {
    fn add(&mut self, spend: f64) {
        self.sum += spend;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Spend per period for one granularity, in period order
pub fn aggregate(rows: &[PreparedTransaction], granularity: Granularity) -> Vec<AggregationBucket> {
    let mut periods: BTreeMap<String, Totals> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.is_spend()) {
        periods
            .entry(granularity.period_key(row.date))
            .or_default()
            .add(row.spend);
    }

    periods
        .into_iter()
        .map(|(period_key, totals)| AggregationBucket {
            period_key,
            total_spend: totals.sum,
            transaction_count: totals.count,
            average_transaction: totals.mean(),
        })
        .collect()
}

/// Buckets for every granularity
pub fn aggregate_timeframes(rows: &[PreparedTransaction]) -> TimeframeAggregates {
    TimeframeAggregates {
        daily: aggregate(rows, Granularity::Day),
        weekly: aggregate(rows, Granularity::Week),
        monthly: aggregate(rows, Granularity::Month),
        quarterly: aggregate(rows, Granularity::Quarter),
        yearly: aggregate(rows, Granularity::Year),
    }
}

fn breakdown<'a>(rows: impl Iterator<Item = &'a PreparedTransaction>) -> Vec<CategoryBreakdown> {
    let mut categories: BTreeMap<&str, Totals> = BTreeMap::new();
    for row in rows.filter(|r| r.is_spend()) {
        categories
            .entry(row.category.as_str())
            .or_default()
            .add(row.spend);
    }

    let overall: f64 = categories.values().map(|t| t.sum).sum();
    let mut out: Vec<CategoryBreakdown> = categories
        .into_iter()
        .map(|(category, totals)| CategoryBreakdown {
            category: category.to_string(),
            total_spend: totals.sum,
            transaction_count: totals.count,
            average_transaction: totals.mean(),
            share_pct: if overall > 0.0 {
                100.0 * totals.sum / overall
            } else {
                0.0
            },
        })
        .collect();

    out.sort_by(|a, b| {
        b.total_spend
            .total_cmp(&a.total_spend)
            .then_with(|| a.category.cmp(&b.category))
    });
    out
}

/// Overall category breakdown, largest spend first
pub fn category_breakdown(rows: &[PreparedTransaction]) -> Vec<CategoryBreakdown> {
    breakdown(rows.iter())
}

/// One category breakdown per period of `granularity`
///
/// Shares are relative to each period's own total.
pub fn category_breakdown_by(
    rows: &[PreparedTransaction],
    granularity: Granularity,
) -> PeriodBreakdown {
    let mut grouped: BTreeMap<String, Vec<&PreparedTransaction>> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.is_spend()) {
        grouped
            .entry(granularity.period_key(row.date))
            .or_default()
            .push(row);
    }

    PeriodBreakdown {
        granularity,
        periods: grouped
            .into_iter()
            .map(|(key, rows)| (key, breakdown(rows.into_iter())))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::prepare::preprocess;
    use crate::models::Direction;
    use crate::test_utils::{record, spend};

    fn rows() -> Vec<PreparedTransaction> {
        preprocess(&[
            spend((2025, 1, 6), 100.0, "food", "Swiggy"),
            spend((2025, 1, 8), 50.0, "food", "Zomato"),
            spend((2025, 1, 12), 150.0, "travel", "Uber"),
            spend((2025, 2, 3), 300.0, "rent", "Landlord"),
            record((2025, 1, 31), 5000.0, Direction::Credit, "salary", "Employer"),
        ])
        .rows
    }

    #[test]
    fn test_monthly_buckets() {
        let monthly = aggregate(&rows(), Granularity::Month);
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].period_key, "2025-01");
        assert_eq!(monthly[0].total_spend, 300.0);
        assert_eq!(monthly[0].transaction_count, 3);
        assert_eq!(monthly[0].average_transaction, 100.0);
        assert_eq!(monthly[1].period_key, "2025-02");
    }

    #[test]
    fn test_weekly_buckets_start_monday() {
        let weekly = aggregate(&rows(), Granularity::Week);
        let keys: Vec<&str> = weekly.iter().map(|b| b.period_key.as_str()).collect();
        // Jan 6 and 8 share a week; Jan 12 is the Sunday of that same week
        assert_eq!(keys, vec!["2025-01-06", "2025-02-03"]);
        assert_eq!(weekly[0].transaction_count, 3);
    }

    #[test]
    fn test_all_timeframes() {
        let aggregates = aggregate_timeframes(&rows());
        assert_eq!(aggregates.daily.len(), 4);
        assert_eq!(aggregates.quarterly.len(), 1);
        assert_eq!(aggregates.quarterly[0].period_key, "2025Q1");
        assert_eq!(aggregates.yearly[0].total_spend, 600.0);
    }

    #[test]
    fn test_category_breakdown_sorted_with_shares() {
        let breakdown = category_breakdown(&rows());
        let names: Vec<&str> = breakdown.iter().map(|c| c.category.as_str()).collect();
        // Food and Travel tie at 150; ties go alphabetically
        assert_eq!(names, vec!["Rent", "Food", "Travel"]);
        assert_eq!(breakdown[0].share_pct, 50.0);
        assert_eq!(breakdown[1].average_transaction, 75.0);

        let total: f64 = breakdown.iter().map(|c| c.share_pct).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_category_breakdown_by_month() {
        let by_month = category_breakdown_by(&rows(), Granularity::Month);
        assert_eq!(by_month.periods.len(), 2);
        let feb = &by_month.periods["2025-02"];
        assert_eq!(feb.len(), 1);
        assert_eq!(feb[0].share_pct, 100.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[], Granularity::Day).is_empty());
        assert!(category_breakdown(&[]).is_empty());
        assert!(category_breakdown_by(&[], Granularity::Year).periods.is_empty());
    }
}
