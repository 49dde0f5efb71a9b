//! Shared utilities for commands
//!
//! - `load_lexicon` - Resolve the lexicon from `--lexicon`, the user file or the default
//! - `print_json` - Pretty JSON to stdout

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tally_core::lexicon::Lexicon;

/// An explicit path wins over the user override and the embedded default
pub fn load_lexicon(path: Option<&Path>) -> Result<Arc<Lexicon>> {
    let lexicon = match path {
        Some(path) => Lexicon::from_path(path)
            .with_context(|| format!("Failed to load lexicon from {}", path.display()))?,
        None => Lexicon::load().context("Failed to load lexicon")?,
    };
    tracing::debug!(source = %lexicon.source(), "Lexicon loaded");
    Ok(Arc::new(lexicon))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
