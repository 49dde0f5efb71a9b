//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (lexicon loading, JSON output)
//! - `extract` - Message extraction
//! - `analyze` - Behavior report for a transaction file
//! - `lexicon` - Lexicon summary

pub mod analyze;
pub mod core;
pub mod extract;
pub mod lexicon;

// Re-export command functions for main.rs
pub use analyze::*;
pub use core::*;
pub use extract::*;
pub use lexicon::*;
