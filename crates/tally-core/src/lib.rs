//! Tally Core Library
//!
//! Spending analysis from bank notifications and transaction exports:
//! - Message extraction: amount, direction, date, merchant and category from
//!   SMS/UPI text, driven by ordered rule chains
//! - Merchant/keyword lexicon loaded from TOML, with a user override file
//! - Optional pluggable category classifier (Ollama), bounded by a timeout
//! - Transaction import from CSV/JSON with header inference
//! - Behavioral aggregation: time buckets, category shares, spending
//!   patterns and a 0-100 behavior score with persona

pub mod aggregate;
pub mod classifier;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod lexicon;
pub mod models;
pub mod text;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use aggregate::{analyze, BehaviorAnalyzer};
pub use classifier::{
    CategoryClassifier, ClassifierClient, MockClassifier, OllamaClassifier,
    DEFAULT_CLASSIFIER_TIMEOUT,
};
pub use error::{Error, Result};
pub use extract::{ExtractorConfig, MessageExtractor};
pub use ingest::{infer_columns, load_file, ColumnMapping};
pub use lexicon::{Lexicon, LexiconSource, LexiconSummary};
pub use models::{
    AggregationBucket, BehaviorReport, BehaviorScore, Category, CategoryBreakdown, Direction,
    ExtractedTransaction, Granularity, PatternReport, Persona, StoredTransaction,
    TransactionRecord,
};
