//! Mock classifier for testing
//!
//! Answers with a fixed category, a raw label, or an error, optionally after
//! a delay. Counts calls so tests can check whether it was consulted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::Category;

use super::CategoryClassifier;

#[derive(Debug, Clone)]
enum MockAnswer {
    Category(Category),
    Label(String),
    Fail,
}

#[derive(Debug, Clone)]
pub struct MockClassifier {
    answer: MockAnswer,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockClassifier {
    /// Always answers `category`
    pub fn new(category: Category) -> Self {
        Self {
            answer: MockAnswer::Category(category),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answers a raw label, mapped like a model answer would be
    pub fn with_label(label: &str) -> Self {
        Self {
            answer: MockAnswer::Label(label.to_string()),
            ..Self::new(Category::Other)
        }
    }

    /// Always errors
    pub fn failing() -> Self {
        Self {
            answer: MockAnswer::Fail,
            ..Self::new(Category::Other)
        }
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of classify calls so far (shared between clones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CategoryClassifier for MockClassifier {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn classify(&self, _text: &str) -> Result<Category> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.answer {
            MockAnswer::Category(c) => Ok(*c),
            MockAnswer::Label(label) => Category::from_label(label)
                .ok_or_else(|| Error::Classifier(format!("Unknown category label: {}", label))),
            MockAnswer::Fail => Err(Error::Classifier("mock failure".to_string())),
        }
    }
}
