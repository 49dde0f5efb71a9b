//! Lexicon summary command

use std::path::Path;

use anyhow::Result;

use super::core::{load_lexicon, print_json};

pub fn cmd_lexicon(lexicon_path: Option<&Path>) -> Result<()> {
    let lexicon = load_lexicon(lexicon_path)?;
    print_json(&lexicon.summary())
}
