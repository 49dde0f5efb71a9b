//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Understand spending from bank messages and exports
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Transaction extraction and spending behavior scoring", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Lexicon file to use instead of the user or built-in lexicon
    #[arg(long, global = true)]
    pub lexicon: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract transactions from bank/UPI notification messages
    ///
    /// Prints a JSON array with one entry per message, in input order.
    /// Set TALLY_CLASSIFIER=ollama (with OLLAMA_HOST) to let a local model
    /// categorize messages the lexicon cannot.
    Extract {
        /// Message text (repeatable)
        #[arg(short, long)]
        text: Vec<String>,

        /// File with one message per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Date used to fill in a missing year (YYYY-MM-DD, default today)
        #[arg(long)]
        reference_date: Option<String>,
    },

    /// Analyze a transaction file and print a behavior report
    Analyze {
        /// CSV or JSON transaction file
        #[arg(short, long)]
        file: PathBuf,

        /// Also break categories down per period: day, week, month, quarter, year
        #[arg(long)]
        by: Option<String>,
    },

    /// Show the lexicon in effect
    Lexicon,
}
