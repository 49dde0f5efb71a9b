//! Message extraction command

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use tally_core::classifier::ClassifierClient;
use tally_core::extract::{ExtractorConfig, MessageExtractor};
use tally_core::lexicon::Lexicon;
use tally_core::models::ExtractedTransaction;
use tracing::info;

use super::core::{load_lexicon, print_json};

/// Messages from `--text` flags followed by the non-blank lines of `--file`
pub fn read_messages(texts: &[String], file: Option<&Path>) -> Result<Vec<String>> {
    let mut messages: Vec<String> = texts.to_vec();

    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        messages.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from),
        );
    }

    if messages.is_empty() {
        bail!("No messages given. Use --text or --file.");
    }
    Ok(messages)
}

pub fn parse_reference_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid reference date '{}', expected YYYY-MM-DD", value))
}

/// Run extraction over all messages, consulting `classifier` if given
pub async fn extract_messages(
    lexicon: Arc<Lexicon>,
    messages: Vec<String>,
    reference_date: Option<NaiveDate>,
    classifier: Option<ClassifierClient>,
) -> Vec<ExtractedTransaction> {
    let mut config = ExtractorConfig::from_env();
    if let Some(date) = reference_date {
        config.reference_date = date;
    }

    let extractor = MessageExtractor::with_config(lexicon, config);
    match classifier {
        Some(client) => {
            info!(classifier = ?client, "Using category classifier");
            extractor
                .extract_batch_concurrent(messages, Some(client))
                .await
        }
        None => extractor.extract_batch(&messages),
    }
}

pub async fn cmd_extract(
    lexicon_path: Option<&Path>,
    texts: &[String],
    file: Option<&Path>,
    reference_date: Option<&str>,
) -> Result<()> {
    let messages = read_messages(texts, file)?;
    let reference_date = reference_date.map(parse_reference_date).transpose()?;
    let lexicon = load_lexicon(lexicon_path)?;

    let extracted = extract_messages(
        lexicon,
        messages,
        reference_date,
        ClassifierClient::from_env(),
    )
    .await;

    let recovered = extracted.iter().filter(|tx| tx.amount.is_some()).count();
    info!(
        messages = extracted.len(),
        with_amount = recovered,
        "Extraction finished"
    );
    print_json(&extracted)
}
