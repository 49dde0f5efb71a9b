//! Optional category classifier
//!
//! The rule chains always run first on the merchant. When they find nothing,
//! an injected classifier may be asked for the category before the
//! message-level keyword rules. A classifier is never required, and any
//! failure falls back to the rules.
//!
//! # Configuration
//!
//! Environment variables:
//! - `TALLY_CLASSIFIER`: Backend to use (ollama, mock). Unset means no classifier
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Model name (default: llama3.2)
//! - `TALLY_CLASSIFIER_TIMEOUT_SECS`: Per-message timeout (default: 5)

mod mock;
mod ollama;

pub use mock::MockClassifier;
pub use ollama::{parse_category_response, OllamaClassifier};

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::Category;

/// Default bound on a single classifier call
pub const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(5);

/// A pluggable source of categories for messages the rules cannot place
#[async_trait]
pub trait CategoryClassifier: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Classify a raw message into the fixed category vocabulary
    async fn classify(&self, text: &str) -> Result<Category>;
}

/// Concrete classifier selection, cheap to clone into tasks
#[derive(Clone)]
pub enum ClassifierClient {
    Ollama(OllamaClassifier),
    Mock(MockClassifier),
}

impl std::fmt::Debug for ClassifierClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ClassifierClient").field(&self.name()).finish()
    }
}

impl ClassifierClient {
    /// Create from environment variables
    ///
    /// Returns None when no classifier is configured, which is the normal case.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("TALLY_CLASSIFIER").ok()?;

        match backend.trim().to_lowercase().as_str() {
            "" | "none" | "off" => None,
            "ollama" => {
                let client = OllamaClassifier::from_env().map(ClassifierClient::Ollama);
                if client.is_none() {
                    warn!("TALLY_CLASSIFIER=ollama but OLLAMA_HOST is not set, classifier disabled");
                }
                client
            }
            "mock" => Some(ClassifierClient::Mock(MockClassifier::new(Category::Other))),
            _ => {
                warn!(backend = %backend, "Unknown TALLY_CLASSIFIER, classifier disabled");
                None
            }
        }
    }

    /// Create an Ollama classifier directly
    pub fn ollama(host: &str, model: &str) -> Self {
        ClassifierClient::Ollama(OllamaClassifier::new(host, model))
    }

    /// Create a mock classifier that always answers `category`
    pub fn mock(category: Category) -> Self {
        ClassifierClient::Mock(MockClassifier::new(category))
    }
}

#[async_trait]
impl CategoryClassifier for ClassifierClient {
    fn name(&self) -> &'static str {
        match self {
            ClassifierClient::Ollama(c) => c.name(),
            ClassifierClient::Mock(c) => c.name(),
        }
    }

    async fn classify(&self, text: &str) -> Result<Category> {
        match self {
            ClassifierClient::Ollama(c) => c.classify(text).await,
            ClassifierClient::Mock(c) => c.classify(text).await,
        }
    }
}

/// Timeout from `TALLY_CLASSIFIER_TIMEOUT_SECS`, if set and valid
pub fn timeout_from_env() -> Option<Duration> {
    let raw = std::env::var("TALLY_CLASSIFIER_TIMEOUT_SECS").ok()?;
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            warn!(value = %raw, "Ignoring invalid TALLY_CLASSIFIER_TIMEOUT_SECS");
            None
        }
    }
}

/// Ask the classifier, bounded by `timeout`.
///
/// Errors and timeouts are logged and reported as `None` so the caller can
/// continue with the rules.
pub async fn classify_bounded(
    classifier: &dyn CategoryClassifier,
    text: &str,
    timeout: Duration,
) -> Option<Category> {
    let outcome = match tokio::time::timeout(timeout, classifier.classify(text)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(timeout)),
    };

    match outcome {
        Ok(category) => {
            debug!(classifier = classifier.name(), category = %category, "Classifier answered");
            Some(category)
        }
        Err(e) => {
            warn!(
                classifier = classifier.name(),
                error = %e,
                "Classifier failed, falling back to rules"
            );
            None
        }
    }
}
