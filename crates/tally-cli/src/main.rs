//! Tally CLI - Spending analysis from bank messages
//!
//! Usage:
//!   tally extract --text MSG          Extract a transaction from a message
//!   tally extract --file sms.txt      Extract one transaction per line
//!   tally analyze --file tx.csv       Print a behavior report
//!   tally lexicon                     Show the lexicon in effect
//!
//! Reports go to stdout as JSON; logs go to stderr.

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    match cli.command {
        Commands::Extract {
            text,
            file,
            reference_date,
        } => {
            commands::cmd_extract(
                cli.lexicon.as_deref(),
                &text,
                file.as_deref(),
                reference_date.as_deref(),
            )
            .await
        }
        Commands::Analyze { file, by } => commands::cmd_analyze(&file, by.as_deref()),
        Commands::Lexicon => commands::cmd_lexicon(cli.lexicon.as_deref()),
    }
}
