//! Spending pattern detection

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate, Weekday};

use crate::models::{Granularity, MerchantSummary, MonthEdgeSpend, PatternReport};

use super::mean;
use super::prepare::PreparedTransaction;

const TOP_MERCHANTS: usize = 10;

/// Days counted as the start or end of a month
const MONTH_EDGE_DAYS: u32 = 3;

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Weekday vs weekend averages, month edge spending and top merchants
pub fn detect_patterns(rows: &[PreparedTransaction]) -> PatternReport {
    let spends: Vec<&PreparedTransaction> = rows.iter().filter(|r| r.is_spend()).collect();

    let mut weekday = Vec::new();
    let mut weekend = Vec::new();
    for row in &spends {
        if is_weekend(row.date) {
            weekend.push(row.spend);
        } else {
            weekday.push(row.spend);
        }
    }
    let weekday_avg_spend = mean(&weekday).unwrap_or(0.0);
    let weekend_avg_spend = mean(&weekend).unwrap_or(0.0);

    PatternReport {
        weekday_avg_spend,
        weekend_avg_spend,
        weekend_spike: weekend_avg_spend > weekday_avg_spend,
        per_month_start_end: month_edges(&spends),
        top_merchants: top_merchants(&spends),
    }
}

/// The end window is anchored on the latest day present in each month
fn month_edges(spends: &[&PreparedTransaction]) -> BTreeMap<String, MonthEdgeSpend> {
    let mut months: BTreeMap<String, Vec<(u32, f64)>> = BTreeMap::new();
    for row in spends {
        months
            .entry(Granularity::Month.period_key(row.date))
            .or_default()
            .push((row.date.day(), row.spend));
    }

    months
        .into_iter()
        .map(|(key, days)| {
            let last = days.iter().map(|(day, _)| *day).max().unwrap_or(0);
            let start: Vec<f64> = days
                .iter()
                .filter(|(day, _)| *day <= MONTH_EDGE_DAYS)
                .map(|(_, spend)| *spend)
                .collect();
            let end: Vec<f64> = days
                .iter()
                .filter(|(day, _)| day + MONTH_EDGE_DAYS > last)
                .map(|(_, spend)| *spend)
                .collect();
            (
                key,
                MonthEdgeSpend {
                    start_avg: mean(&start).unwrap_or(0.0),
                    end_avg: mean(&end).unwrap_or(0.0),
                },
            )
        })
        .collect()
}

fn top_merchants(spends: &[&PreparedTransaction]) -> Vec<MerchantSummary> {
    let mut merchants: HashMap<&str, (f64, usize)> = HashMap::new();
    for row in spends {
        let entry = merchants.entry(row.merchant.as_str()).or_default();
        entry.0 += row.spend;
        entry.1 += 1;
    }

    let mut summaries: Vec<MerchantSummary> = merchants
        .into_iter()
        .map(|(merchant, (total_spend, transaction_count))| MerchantSummary {
            merchant: merchant.to_string(),
            total_spend,
            transaction_count,
        })
        .collect();
    summaries.sort_by(|a, b| {
        b.transaction_count
            .cmp(&a.transaction_count)
            .then_with(|| a.merchant.cmp(&b.merchant))
    });
    summaries.truncate(TOP_MERCHANTS);
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::prepare::preprocess;
    use crate::models::Direction;
    use crate::test_utils::{record, spend};

    #[test]
    fn test_weekend_spike() {
        // 2025-01-04 is a Saturday, 2025-01-06 a Monday
        let rows = preprocess(&[
            spend((2025, 1, 4), 900.0, "food", "Bar"),
            spend((2025, 1, 5), 700.0, "food", "Bar"),
            spend((2025, 1, 6), 100.0, "food", "Cafe"),
            spend((2025, 1, 7), 300.0, "food", "Cafe"),
        ])
        .rows;

        let report = detect_patterns(&rows);
        assert_eq!(report.weekend_avg_spend, 800.0);
        assert_eq!(report.weekday_avg_spend, 200.0);
        assert!(report.weekend_spike);
    }

    #[test]
    fn test_no_spike_without_weekend_spend() {
        let rows = preprocess(&[spend((2025, 1, 6), 100.0, "food", "Cafe")]).rows;
        let report = detect_patterns(&rows);
        assert_eq!(report.weekend_avg_spend, 0.0);
        assert!(!report.weekend_spike);
    }

    #[test]
    fn test_month_edges() {
        let rows = preprocess(&[
            spend((2024, 2, 1), 100.0, "rent", "Landlord"),
            spend((2024, 2, 3), 300.0, "food", "Cafe"),
            spend((2024, 2, 15), 999.0, "food", "Cafe"),
            // Latest day present is the 20th, so the end window is 18-20
            spend((2024, 2, 20), 50.0, "food", "Cafe"),
            spend((2024, 2, 18), 150.0, "food", "Cafe"),
            spend((2024, 3, 10), 20.0, "food", "Cafe"),
        ])
        .rows;

        let report = detect_patterns(&rows);
        let feb = report.per_month_start_end["2024-02"];
        assert_eq!(feb.start_avg, 200.0);
        assert_eq!(feb.end_avg, 100.0);

        // A lone mid-month day is its own end window
        let march = report.per_month_start_end["2024-03"];
        assert_eq!(march.start_avg, 0.0);
        assert_eq!(march.end_avg, 20.0);
    }

    #[test]
    fn test_top_merchants_by_frequency() {
        let mut records = vec![
            spend((2025, 1, 1), 10.0, "food", "Cafe"),
            spend((2025, 1, 2), 10.0, "food", "Cafe"),
            spend((2025, 1, 3), 5000.0, "shopping", "Mall"),
            record((2025, 1, 4), 9000.0, Direction::Credit, "salary", "Employer"),
        ];
        for i in 0..12 {
            records.push(spend((2025, 2, 1), 1.0, "other", &format!("Shop {i:02}")));
        }

        let top = detect_patterns(&preprocess(&records).rows).top_merchants;
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].merchant, "Cafe");
        assert_eq!(top[0].transaction_count, 2);
        assert_eq!(top[0].total_spend, 20.0);
        assert_eq!(top[1].merchant, "Mall");
        assert!(top.iter().all(|m| m.merchant != "Employer"));
    }
}
