//! Category rules
//!
//! Precedence, first hit wins:
//!
//! 1. Merchant map, matched against the extracted merchant
//! 2. Keyword table, matched against the extracted merchant
//! 3. Optional classifier (see [`crate::classifier`])
//! 4. Keyword table, matched against the whole message
//! 5. Generic banking vocabulary -> `bank`
//! 6. `other`
//!
//! A named merchant outranks the message's banking noise: once a merchant
//! was extracted, steps 4 and 5 ignore the `bank` category, so
//! "UPI payment to Unknown Merchant" is `other` rather than `bank`.

use std::sync::Arc;

use super::rules::{ExtractionRule, RuleChain};
use crate::lexicon::Lexicon;
use crate::models::Category;

/// Known business name contained in the merchant
pub struct MerchantMapRule {
    lexicon: Arc<Lexicon>,
}

impl MerchantMapRule {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }
}

impl ExtractionRule<Category> for MerchantMapRule {
    fn name(&self) -> &'static str {
        "merchant_map"
    }

    fn attempt(&self, merchant: &str) -> Option<Category> {
        self.lexicon.merchant_category(merchant)
    }
}

/// Category keyword contained in the merchant
pub struct MerchantKeywordRule {
    lexicon: Arc<Lexicon>,
}

impl MerchantKeywordRule {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }
}

impl ExtractionRule<Category> for MerchantKeywordRule {
    fn name(&self) -> &'static str {
        "merchant_keyword"
    }

    fn attempt(&self, merchant: &str) -> Option<Category> {
        self.lexicon.keyword_category(merchant)
    }
}

/// Category keyword contained anywhere in the message
pub struct MessageKeywordRule {
    lexicon: Arc<Lexicon>,
    include_bank: bool,
}

impl MessageKeywordRule {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self {
            lexicon,
            include_bank: true,
        }
    }

    /// Variant used once a merchant is known: banking keywords are ignored
    pub fn specific_only(lexicon: Arc<Lexicon>) -> Self {
        Self {
            lexicon,
            include_bank: false,
        }
    }
}

impl ExtractionRule<Category> for MessageKeywordRule {
    fn name(&self) -> &'static str {
        if self.include_bank {
            "message_keyword"
        } else {
            "message_keyword_specific"
        }
    }

    fn attempt(&self, text: &str) -> Option<Category> {
        let lower = text.to_lowercase();
        self.lexicon
            .keywords()
            .iter()
            .filter(|k| self.include_bank || k.category != Category::Bank)
            .find(|k| k.terms.iter().any(|t| lower.contains(t.as_str())))
            .map(|k| k.category)
    }
}

/// Generic banking vocabulary anywhere in the message
pub struct BankTermsRule {
    lexicon: Arc<Lexicon>,
}

impl BankTermsRule {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }
}

impl ExtractionRule<Category> for BankTermsRule {
    fn name(&self) -> &'static str {
        "bank_terms"
    }

    fn attempt(&self, text: &str) -> Option<Category> {
        self.lexicon
            .matches_bank_terms(text)
            .then_some(Category::Bank)
    }
}

/// The three chains used to resolve a category
#[derive(Debug)]
pub struct CategoryRules {
    /// Applied to the merchant text
    merchant: RuleChain<Category>,
    /// Applied to the message when no merchant was extracted
    message: RuleChain<Category>,
    /// Applied to the message when a merchant was extracted but not mapped
    named_merchant: RuleChain<Category>,
}

impl CategoryRules {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self {
            merchant: RuleChain::new("category")
                .then(MerchantMapRule::new(lexicon.clone()))
                .then(MerchantKeywordRule::new(lexicon.clone())),
            message: RuleChain::new("category")
                .then(MessageKeywordRule::new(lexicon.clone()))
                .then(BankTermsRule::new(lexicon.clone())),
            named_merchant: RuleChain::new("category")
                .then(MessageKeywordRule::specific_only(lexicon)),
        }
    }

    /// Steps 1-2: category derived from the merchant alone
    pub fn from_merchant(&self, merchant: Option<&str>) -> Option<(Category, &'static str)> {
        self.merchant.first_match(merchant?)
    }

    /// Steps 4-6: category derived from the message, always resolves
    pub fn from_message(&self, text: &str, has_merchant: bool) -> (Category, &'static str) {
        let chain = if has_merchant {
            &self.named_merchant
        } else {
            &self.message
        };
        chain
            .first_match(text)
            .unwrap_or((Category::Other, "fallback_other"))
    }

    /// Rule-only resolution (no classifier)
    pub fn resolve(&self, merchant: Option<&str>, text: &str) -> (Category, &'static str) {
        self.from_merchant(merchant)
            .unwrap_or_else(|| self.from_message(text, merchant.is_some()))
    }
}
