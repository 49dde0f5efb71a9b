//! Message extractor
//!
//! Turns one bank/UPI notification into an [`ExtractedTransaction`]. Each
//! field has its own ordered [`RuleChain`]; extraction never fails, and a
//! field no rule can recover is left empty. The category always resolves,
//! to `other` at worst.
//!
//! # Usage
//!
//! ```rust,ignore
//! let lexicon = Arc::new(Lexicon::load()?);
//! let extractor = MessageExtractor::new(lexicon);
//!
//! let tx = extractor.extract("INR 349.00 debited for payment to Swiggy via UPI.");
//! assert_eq!(tx.merchant.as_deref(), Some("Swiggy"));
//! ```

pub mod amount;
pub mod category;
pub mod date;
pub mod direction;
pub mod merchant;
pub mod rules;

pub use category::CategoryRules;
pub use rules::{ExtractionRule, RuleChain};

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::classifier::{self, ClassifierClient, DEFAULT_CLASSIFIER_TIMEOUT};
use crate::lexicon::Lexicon;
use crate::models::{Category, Direction, ExtractedTransaction};

use amount::{CurrencyAmountRule, LargestNumberRule};
use date::{ExplicitDateRule, FuzzyDateRule};
use direction::PhraseRule;
use merchant::{ContextMerchantRule, UppercaseTokenRule};

/// Extractor settings
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Supplies the year when a message names a day and month only.
    /// Defaults to today; pin it when output must not depend on the run date.
    pub reference_date: NaiveDate,
    /// Upper bound on one classifier call
    pub classifier_timeout: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            reference_date: chrono::Local::now().date_naive(),
            classifier_timeout: DEFAULT_CLASSIFIER_TIMEOUT,
        }
    }
}

impl ExtractorConfig {
    /// Defaults, with the timeout overridden by `TALLY_CLASSIFIER_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(timeout) = classifier::timeout_from_env() {
            config.classifier_timeout = timeout;
        }
        config
    }
}

struct Inner {
    lexicon: Arc<Lexicon>,
    config: ExtractorConfig,
    amount: RuleChain<f64>,
    direction: RuleChain<Direction>,
    date: RuleChain<NaiveDate>,
    merchant: RuleChain<String>,
    category: CategoryRules,
}

/// Fields recovered before the category is decided
struct Fields {
    amount: Option<f64>,
    direction: Direction,
    occurred_at: Option<NaiveDate>,
    merchant: Option<String>,
}

/// Rule-based message extractor
///
/// Cheap to clone; clones share the compiled rule chains and the lexicon.
#[derive(Clone)]
pub struct MessageExtractor {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MessageExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageExtractor")
            .field("config", &self.inner.config)
            .field("amount", &self.inner.amount)
            .field("direction", &self.inner.direction)
            .field("date", &self.inner.date)
            .field("merchant", &self.inner.merchant)
            .finish()
    }
}

impl MessageExtractor {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self::with_config(lexicon, ExtractorConfig::default())
    }

    pub fn with_config(lexicon: Arc<Lexicon>, config: ExtractorConfig) -> Self {
        let amount = RuleChain::new("amount")
            .then(CurrencyAmountRule)
            .then(LargestNumberRule);

        let direction = RuleChain::new("direction")
            .then(PhraseRule::debit())
            .then(PhraseRule::credit());

        let date = ExplicitDateRule::all()
            .into_iter()
            .fold(RuleChain::new("date"), |chain, rule| chain.then(rule))
            .then(FuzzyDateRule::new(config.reference_date));

        let merchant = RuleChain::new("merchant")
            .then(ContextMerchantRule::new(lexicon.clone()))
            .then(UppercaseTokenRule::new(lexicon.clone()));

        let category = CategoryRules::new(lexicon.clone());

        Self {
            inner: Arc::new(Inner {
                lexicon,
                config,
                amount,
                direction,
                date,
                merchant,
                category,
            }),
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.inner.config
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.inner.lexicon
    }

    fn fields(&self, text: &str) -> Fields {
        Fields {
            amount: self.inner.amount.resolve(text),
            direction: self
                .inner
                .direction
                .resolve(text)
                .unwrap_or(Direction::Unknown),
            occurred_at: self.inner.date.resolve(text),
            merchant: self.inner.merchant.resolve(text),
        }
    }

    fn assemble(text: &str, fields: Fields, category: Category) -> ExtractedTransaction {
        ExtractedTransaction {
            amount: fields.amount,
            direction: fields.direction,
            occurred_at: fields.occurred_at,
            merchant: fields.merchant,
            category,
            source_text: text.to_string(),
        }
    }

    /// Extract one message using the rules only
    pub fn extract(&self, text: &str) -> ExtractedTransaction {
        let fields = self.fields(text);
        let (category, rule) = self
            .inner
            .category
            .resolve(fields.merchant.as_deref(), text);
        debug!(rule, category = %category, "Category resolved");
        Self::assemble(text, fields, category)
    }

    /// Extract many messages; output order matches input order
    pub fn extract_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<ExtractedTransaction> {
        texts.iter().map(|t| self.extract(t.as_ref())).collect()
    }

    /// Extract one message, asking `classifier` when the merchant says nothing
    ///
    /// The classifier is only consulted when no merchant-derived category
    /// exists. Its call is bounded by the configured timeout; failure falls
    /// back to the message rules.
    pub async fn extract_with_classifier(
        &self,
        text: &str,
        classifier: Option<&ClassifierClient>,
    ) -> ExtractedTransaction {
        let fields = self.fields(text);
        let rules = &self.inner.category;

        if let Some((category, rule)) = rules.from_merchant(fields.merchant.as_deref()) {
            debug!(rule, category = %category, "Category resolved from merchant");
            return Self::assemble(text, fields, category);
        }

        if let Some(client) = classifier {
            if let Some(category) =
                classifier::classify_bounded(client, text, self.inner.config.classifier_timeout)
                    .await
            {
                return Self::assemble(text, fields, category);
            }
        }

        let (category, rule) = rules.from_message(text, fields.merchant.is_some());
        debug!(rule, category = %category, "Category resolved from message");
        Self::assemble(text, fields, category)
    }

    /// Extract many messages concurrently
    ///
    /// Each message runs in its own task; results are placed back at their
    /// input index. A task that dies is redone with the rules alone.
    pub async fn extract_batch_concurrent(
        &self,
        texts: Vec<String>,
        classifier: Option<ClassifierClient>,
    ) -> Vec<ExtractedTransaction> {
        let total = texts.len();
        let mut results: Vec<Option<ExtractedTransaction>> = vec![None; total];
        let mut set = JoinSet::new();

        for (index, text) in texts.iter().cloned().enumerate() {
            let extractor = self.clone();
            let classifier = classifier.clone();
            set.spawn(async move {
                let tx = extractor
                    .extract_with_classifier(&text, classifier.as_ref())
                    .await;
                (index, tx)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, tx)) => results[index] = Some(tx),
                Err(e) => warn!(error = %e, "Extraction task failed"),
            }
        }

        let mut recovered = 0;
        let out: Vec<ExtractedTransaction> = results
            .into_iter()
            .zip(texts.iter())
            .map(|(slot, text)| {
                slot.unwrap_or_else(|| {
                    recovered += 1;
                    self.extract(text)
                })
            })
            .collect();

        info!(
            messages = total,
            recovered,
            classifier = classifier.is_some(),
            "Batch extraction complete"
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::MockClassifier;

    fn extractor() -> MessageExtractor {
        let config = ExtractorConfig {
            reference_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            ..ExtractorConfig::default()
        };
        MessageExtractor::with_config(Arc::new(Lexicon::embedded().unwrap()), config)
    }

    #[test]
    fn test_swiggy_debit() {
        let tx = extractor().extract("INR 349.00 debited for payment to Swiggy via UPI.");
        assert_eq!(tx.amount, Some(349.0));
        assert_eq!(tx.direction, Direction::Debit);
        assert_eq!(tx.merchant.as_deref(), Some("Swiggy"));
        assert_eq!(tx.category, Category::Food);
        assert_eq!(tx.occurred_at, None);
        assert_eq!(tx.source_text, "INR 349.00 debited for payment to Swiggy via UPI.");
    }

    #[test]
    fn test_neft_credit() {
        let tx = extractor().extract("₹20,000 credited to your account via NEFT.");
        assert_eq!(tx.amount, Some(20000.0));
        assert_eq!(tx.direction, Direction::Credit);
        assert_eq!(tx.merchant, None);
        assert_eq!(tx.category, Category::Bank);
    }

    #[test]
    fn test_unknown_merchant() {
        let tx = extractor().extract("UPI payment of ₹999 made to Unknown Merchant.");
        assert_eq!(tx.amount, Some(999.0));
        assert_eq!(tx.direction, Direction::Debit);
        assert_eq!(tx.merchant.as_deref(), Some("Unknown Merchant"));
        assert_eq!(tx.category, Category::Other);
    }

    #[test]
    fn test_debit_wins_on_dual_match() {
        let tx = extractor().extract("Your account was debited Rs 500 and credited Rs 500");
        assert_eq!(tx.direction, Direction::Debit);

        let tx = extractor().extract("Refund credited after Rs 120 was debited");
        assert_eq!(tx.direction, Direction::Debit);
    }

    #[test]
    fn test_dates() {
        let ex = extractor();
        let tx = ex.extract("₹525.50 spent at Zomato on 21/11/2025. Enjoy your meal!");
        assert_eq!(tx.occurred_at, NaiveDate::from_ymd_opt(2025, 11, 21));
        assert_eq!(tx.merchant.as_deref(), Some("Zomato"));

        let tx = ex.extract("Rs 245 paid to Ola Cabs for your ride on 20-Nov-25.");
        assert_eq!(tx.occurred_at, NaiveDate::from_ymd_opt(2025, 11, 20));
        assert_eq!(tx.category, Category::Travel);

        // No year: the reference year is used
        let tx = ex.extract("Rs 80 paid to Chaiwala on 3rd March");
        assert_eq!(tx.occurred_at, NaiveDate::from_ymd_opt(2025, 3, 3));
    }

    #[test]
    fn test_nothing_recoverable() {
        let tx = extractor().extract("");
        assert_eq!(tx.amount, None);
        assert_eq!(tx.direction, Direction::Unknown);
        assert_eq!(tx.occurred_at, None);
        assert_eq!(tx.merchant, None);
        assert_eq!(tx.category, Category::Other);
    }

    #[test]
    fn test_batch_preserves_order() {
        let ex = extractor();
        let texts = ["Rs 10 paid to Uber", "Rs 20 paid to Netflix", "nothing"];
        let out = ex.extract_batch(&texts);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].category, Category::Travel);
        assert_eq!(out[1].category, Category::Entertainment);
        assert_eq!(out[2].source_text, "nothing");
    }

    #[tokio::test]
    async fn test_classifier_skipped_when_merchant_maps() {
        let mock = MockClassifier::new(Category::Shopping);
        let client = ClassifierClient::Mock(mock.clone());

        let tx = extractor()
            .extract_with_classifier("Rs 10 paid to Swiggy", Some(&client))
            .await;
        assert_eq!(tx.category, Category::Food);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_classifier_used_before_message_rules() {
        let mock = MockClassifier::new(Category::Shopping);
        let client = ClassifierClient::Mock(mock.clone());

        let tx = extractor()
            .extract_with_classifier("₹20,000 credited to your account via NEFT.", Some(&client))
            .await;
        assert_eq!(tx.category, Category::Shopping);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_classifier_failure_falls_back() {
        let client = ClassifierClient::Mock(MockClassifier::failing());
        let tx = extractor()
            .extract_with_classifier("₹20,000 credited to your account via NEFT.", Some(&client))
            .await;
        assert_eq!(tx.category, Category::Bank);
    }

    #[tokio::test]
    async fn test_classifier_timeout_falls_back() {
        let config = ExtractorConfig {
            reference_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            classifier_timeout: Duration::from_millis(20),
        };
        let ex = MessageExtractor::with_config(Arc::new(Lexicon::embedded().unwrap()), config);
        let client = ClassifierClient::Mock(
            MockClassifier::new(Category::Shopping).with_delay(Duration::from_secs(5)),
        );

        let tx = ex
            .extract_with_classifier("₹20,000 credited to your account via NEFT.", Some(&client))
            .await;
        assert_eq!(tx.category, Category::Bank);
    }

    #[tokio::test]
    async fn test_concurrent_batch_matches_sequential() {
        let ex = extractor();
        let texts: Vec<String> = (0..40)
            .map(|i| match i % 3 {
                0 => format!("INR {}.00 debited for payment to Swiggy via UPI.", 100 + i),
                1 => format!("Rs {} credited to your account via NEFT.", 1000 + i),
                _ => format!("UPI payment of ₹{} made to Unknown Merchant.", 10 + i),
            })
            .collect();

        let sequential = ex.extract_batch(&texts);
        let concurrent = ex.extract_batch_concurrent(texts, None).await;
        assert_eq!(sequential, concurrent);
    }
}
