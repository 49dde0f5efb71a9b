//! Behavior report command

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tally_core::aggregate::BehaviorAnalyzer;
use tally_core::ingest;
use tally_core::models::{BehaviorReport, Granularity};
use tracing::warn;

use super::core::print_json;

pub fn parse_granularity(value: &str) -> Result<Granularity> {
    value.parse::<Granularity>().map_err(|e| anyhow!(e))
}

/// Load `path` (CSV or JSON) and analyze it as one user's history
pub fn analyze_file(path: &Path, by: Option<Granularity>) -> Result<BehaviorReport> {
    let records = ingest::load_file(path)
        .with_context(|| format!("Failed to load transactions from {}", path.display()))?;

    let mut analyzer = BehaviorAnalyzer::new();
    if let Some(granularity) = by {
        analyzer = analyzer.with_breakdown(granularity);
    }
    Ok(analyzer.analyze(&records))
}

pub fn cmd_analyze(file: &Path, by: Option<&str>) -> Result<()> {
    let by = by.map(parse_granularity).transpose()?;
    let report = analyze_file(file, by)?;

    if report.transactions_analyzed == 0 {
        warn!(file = %file.display(), "No usable transactions found");
    }
    print_json(&report)
}
