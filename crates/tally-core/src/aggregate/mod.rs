//! Behavioral aggregator
//!
//! Consumes one user's transactions and produces time-bucketed aggregates,
//! category breakdowns, spending patterns and a behavior score. Every figure
//! is a pure function of the input rows; nothing is cached between calls.
//!
//! # Pipeline
//!
//! 1. [`prepare::preprocess`]: drop rows missing a date or amount, normalize
//!    sign by direction, default category and merchant
//! 2. [`timeframes`]: day/week/month/quarter/year buckets and category shares
//! 3. [`patterns::detect_patterns`]: weekend skew, month edges, top merchants
//! 4. [`score::behavior_score`]: weighted 0-100 score and persona
//!
//! Only outflow rows contribute spend.

pub mod patterns;
pub mod prepare;
pub mod score;
pub mod timeframes;

pub use patterns::detect_patterns;
pub use prepare::{preprocess, Prepared, PreparedTransaction};
pub use score::{behavior_score, persona_label};
pub use timeframes::{aggregate, aggregate_timeframes, category_breakdown, category_breakdown_by};

use std::collections::{BTreeMap, BTreeSet};

use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::models::{BehaviorReport, Granularity, TransactionRecord};

/// Arithmetic mean, `None` for an empty slice
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population standard deviation (divides by `n`)
pub(crate) fn population_std(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Runs the full aggregation pipeline
#[derive(Debug, Clone, Copy, Default)]
pub struct BehaviorAnalyzer {
    breakdown: Option<Granularity>,
}

impl BehaviorAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also break categories down per period of `granularity`
    pub fn with_breakdown(mut self, granularity: Granularity) -> Self {
        self.breakdown = Some(granularity);
        self
    }

    pub fn analyze(&self, records: &[TransactionRecord]) -> BehaviorReport {
        let prepared = preprocess(records);
        let rows = &prepared.rows;

        let report = BehaviorReport {
            transactions_analyzed: rows.len(),
            skipped: prepared.skipped,
            aggregates: aggregate_timeframes(rows),
            categories: category_breakdown(rows),
            categories_by_period: self.breakdown.map(|g| category_breakdown_by(rows, g)),
            patterns: detect_patterns(rows),
            score: behavior_score(rows),
        };

        info!(
            transactions = report.transactions_analyzed,
            skipped = report.skipped.total(),
            months = report.aggregates.monthly.len(),
            final_score = report.score.final_score,
            persona = %report.score.persona_label,
            "Analysis complete"
        );
        report
    }

    /// Analyze several users' transactions in parallel
    ///
    /// Each user is scored on a blocking worker; users are independent so
    /// the output does not depend on scheduling.
    pub async fn analyze_users(
        &self,
        users: BTreeMap<String, Vec<TransactionRecord>>,
    ) -> BTreeMap<String, BehaviorReport> {
        let mut set = JoinSet::new();
        let mut pending = BTreeSet::new();

        for (user, records) in users {
            let analyzer = *self;
            let key = user.clone();
            pending.insert(user);
            set.spawn_blocking(move || (key, analyzer.analyze(&records)));
        }

        let mut reports = BTreeMap::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((user, report)) => {
                    pending.remove(&user);
                    reports.insert(user, report);
                }
                Err(e) => warn!(error = %e, "Analysis task failed"),
            }
        }

        for user in &pending {
            warn!(user = %user, "No report produced");
        }
        reports
    }
}

/// Analyze one user's transactions with default settings
pub fn analyze(records: &[TransactionRecord]) -> BehaviorReport {
    BehaviorAnalyzer::new().analyze(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, Persona};
    use crate::test_utils::{record, spend};

    #[test]
    fn test_mean_and_std() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
        assert_eq!(population_std(&[]), None);
        assert_eq!(population_std(&[2.0, 4.0]), Some(1.0));
        assert_eq!(population_std(&[5.0]), Some(0.0));
    }

    #[test]
    fn test_analyze_full_report() {
        let report = BehaviorAnalyzer::new()
            .with_breakdown(Granularity::Month)
            .analyze(&[
                spend((2025, 1, 5), 400.0, "food", "Swiggy"),
                spend((2025, 1, 20), 600.0, "rent", "Landlord"),
                spend((2025, 2, 5), 500.0, "food", "Swiggy"),
                spend((2025, 2, 20), 500.0, "rent", "Landlord"),
                record((2025, 2, 28), 5000.0, Direction::Credit, "salary", "Employer"),
                TransactionRecord::default(),
            ]);

        assert_eq!(report.transactions_analyzed, 5);
        assert_eq!(report.skipped.missing_date, 1);
        assert_eq!(report.aggregates.monthly.len(), 2);
        assert_eq!(report.aggregates.monthly[0].total_spend, 1000.0);
        assert_eq!(report.categories.len(), 2);
        assert_eq!(report.categories_by_period.as_ref().unwrap().periods.len(), 2);
        assert_eq!(report.patterns.top_merchants.len(), 2);
        assert!(report.score.note.is_none());
        assert!((report.score.monthly_stability_score.unwrap() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_analyze_empty() {
        let report = analyze(&[]);
        assert_eq!(report.transactions_analyzed, 0);
        assert!(report.categories.is_empty());
        assert!(report.categories_by_period.is_none());
        assert_eq!(report.patterns.weekday_avg_spend, 0.0);
        assert_eq!(report.score.final_score, 50.0);
        assert_eq!(report.score.persona_label, Persona::UnstableRisky);
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let records = vec![
            spend((2025, 3, 1), 120.0, "travel", "Uber"),
            spend((2025, 3, 2), 80.0, "food", "Zomato"),
            spend((2025, 5, 9), 300.0, "shopping", "Amazon"),
            spend((2025, 8, 30), 95.5, "food", "Zomato"),
        ];
        assert_eq!(analyze(&records), analyze(&records));
    }

    #[tokio::test]
    async fn test_analyze_users_matches_sequential() {
        let mut users = BTreeMap::new();
        users.insert(
            "asha".to_string(),
            vec![
                spend((2025, 1, 1), 100.0, "food", "A"),
                spend((2025, 2, 1), 100.0, "food", "A"),
            ],
        );
        users.insert("ravi".to_string(), vec![spend((2025, 1, 1), 50.0, "travel", "B")]);

        let analyzer = BehaviorAnalyzer::new();
        let reports = analyzer.analyze_users(users.clone()).await;

        assert_eq!(reports.len(), 2);
        for (user, records) in &users {
            assert_eq!(reports[user], analyzer.analyze(records));
        }
    }
}
