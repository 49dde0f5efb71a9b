//! Composite behavior score
//!
//! Four sub-scores, each normalized to 0-100, weighted into a final score:
//!
//! | Sub-score              | Weight | Input                    |
//! |------------------------|--------|--------------------------|
//! | Monthly stability      | 0.4    | monthly spend totals     |
//! | Quarterly consistency  | 0.3    | quarterly spend totals   |
//! | Category concentration | 0.2    | category spend shares    |
//! | Overspend frequency    | 0.1    | months above threshold   |
//!
//! With fewer than two months of spend the score is a neutral 50 and no
//! sub-scores are reported.

use std::collections::BTreeMap;

use tracing::debug;

use crate::models::{BehaviorScore, Granularity, Persona};

use super::prepare::PreparedTransaction;
use super::{mean, population_std};

pub const NEUTRAL_SCORE: f64 = 50.0;
pub const INSUFFICIENT_HISTORY_NOTE: &str = "Need at least 2 months of data.";

const STABILITY_WEIGHT: f64 = 0.4;
const CONSISTENCY_WEIGHT: f64 = 0.3;
const CONCENTRATION_WEIGHT: f64 = 0.2;
const OVERSPEND_WEIGHT: f64 = 0.1;

/// Standard deviations above the mean before a month counts as overspend
const OVERSPEND_SIGMA: f64 = 1.25;

const EPSILON: f64 = 1e-9;

fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

fn period_totals<'a>(
    spends: impl Iterator<Item = &'a PreparedTransaction>,
    granularity: Granularity,
) -> Vec<f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for row in spends {
        *totals.entry(granularity.period_key(row.date)).or_default() += row.spend;
    }
    totals.into_values().collect()
}

/// `1 - σ/μ` scaled to 0-100; flat totals score 100
fn stability(totals: &[f64]) -> f64 {
    let avg = mean(totals).unwrap_or(0.0);
    let std = population_std(totals).unwrap_or(0.0);
    clamp_score((1.0 - std / (avg + EPSILON)).max(0.0) * 100.0)
}

/// Rewards a Herfindahl index close to an even spread over the categories used
fn concentration(category_totals: &[f64]) -> f64 {
    let overall: f64 = category_totals.iter().sum();
    let shares: Vec<f64> = if category_totals.is_empty() || overall <= 0.0 {
        vec![1.0]
    } else {
        category_totals.iter().map(|t| t / overall).collect()
    };

    let herfindahl: f64 = shares.iter().map(|p| p * p).sum();
    let even = 1.0 / shares.len() as f64;
    clamp_score(100.0 * (1.0 - (herfindahl - even).abs()))
}

fn overspend(monthly: &[f64]) -> f64 {
    let threshold =
        mean(monthly).unwrap_or(0.0) + OVERSPEND_SIGMA * population_std(monthly).unwrap_or(0.0);
    let over = monthly.iter().filter(|&&total| total > threshold).count();
    let fraction = if monthly.is_empty() {
        0.0
    } else {
        over as f64 / monthly.len() as f64
    };
    clamp_score(100.0 * (1.0 - fraction))
}

/// Score the spend rows of one user
pub fn behavior_score(rows: &[PreparedTransaction]) -> BehaviorScore {
    let spends = || rows.iter().filter(|r| r.is_spend());

    let monthly = period_totals(spends(), Granularity::Month);
    if monthly.len() < 2 {
        debug!(months = monthly.len(), "Too little history to score");
        return BehaviorScore {
            monthly_stability_score: None,
            quarterly_consistency_score: None,
            category_concentration_score: None,
            overspend_score: None,
            final_score: NEUTRAL_SCORE,
            persona_label: persona_label(NEUTRAL_SCORE),
            note: Some(INSUFFICIENT_HISTORY_NOTE.to_string()),
        };
    }

    let quarterly = period_totals(spends(), Granularity::Quarter);
    let mut categories: BTreeMap<&str, f64> = BTreeMap::new();
    for row in spends() {
        *categories.entry(row.category.as_str()).or_default() += row.spend;
    }
    let category_totals: Vec<f64> = categories.into_values().collect();

    let monthly_stability = stability(&monthly);
    let quarterly_consistency = if quarterly.len() < 2 {
        NEUTRAL_SCORE
    } else {
        stability(&quarterly)
    };
    let category_concentration = concentration(&category_totals);
    let overspend_frequency = overspend(&monthly);

    let final_score = clamp_score(
        STABILITY_WEIGHT * monthly_stability
            + CONSISTENCY_WEIGHT * quarterly_consistency
            + CONCENTRATION_WEIGHT * category_concentration
            + OVERSPEND_WEIGHT * overspend_frequency,
    );

    debug!(
        months = monthly.len(),
        quarters = quarterly.len(),
        categories = category_totals.len(),
        final_score,
        "Computed behavior score"
    );

    BehaviorScore {
        monthly_stability_score: Some(monthly_stability),
        quarterly_consistency_score: Some(quarterly_consistency),
        category_concentration_score: Some(category_concentration),
        overspend_score: Some(overspend_frequency),
        final_score,
        persona_label: persona_label(final_score),
        note: None,
    }
}

/// Persona tier for a final score
pub fn persona_label(final_score: f64) -> Persona {
    Persona::from_score(final_score)
}
