//! Merchant rules

use std::sync::{Arc, OnceLock};

use regex::Regex;

use super::rules::ExtractionRule;
use crate::lexicon::Lexicon;
use crate::text::{collapse_whitespace, title_case};

fn context_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:paid\s+to|to|at|via|through|for|by|on|towards)\s+([\p{L}\p{N}&._\-' ]{3,80})",
        )
        .expect("valid merchant context regex")
    })
}

fn uppercase_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Z]{3,20})\b").expect("valid uppercase token regex"))
}

fn order_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\border\s*id[:#\s]*\w+").expect("valid order id regex")
    })
}

fn stray_punctuation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[^\p{L}\p{N}\s&.\-'/]").expect("valid punctuation regex")
    })
}

/// Normalize a captured merchant span.
///
/// Drops order-id fragments and filler words, replaces punctuation other
/// than `& . - ' /` with spaces, and trims separators from the ends. The
/// result may be empty.
pub fn clean_merchant_text(text: &str, lexicon: &Lexicon) -> String {
    let s = collapse_whitespace(text);
    let s = order_id_regex().replace_all(&s, " ");
    let s = lexicon.strip_fillers(&s);
    let s = stray_punctuation_regex().replace_all(&s, " ");
    collapse_whitespace(&s)
        .trim_matches(|c: char| matches!(c, ' ' | '.' | ',' | '-' | '_'))
        .to_string()
}

fn is_numeric_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '/' | '-' | ':'))
}

/// Name introduced by a preposition: "paid to Swiggy via UPI" -> "Swiggy"
pub struct ContextMerchantRule {
    lexicon: Arc<Lexicon>,
}

impl ContextMerchantRule {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    /// Split a span into candidate names at connector words, skipping
    /// leading noise in each: "Rs 185 for an order at Subway" -> ["order", "Subway"]
    fn segments(&self, span: &str) -> Vec<String> {
        let span = order_id_regex().replace_all(span, " ");
        let lexicon = &self.lexicon;
        let mut segments = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for raw in span.split_whitespace() {
            let t = raw.trim_matches(|c: char| !c.is_alphanumeric());
            if lexicon.is_connector(t) {
                if !current.is_empty() {
                    segments.push(current.join(" "));
                    current.clear();
                }
                continue;
            }
            let noise = t.is_empty()
                || lexicon.is_filler(t)
                || lexicon.is_currency_token(t)
                || is_numeric_token(t);
            if current.is_empty() && noise {
                continue;
            }
            current.push(raw);
        }
        if !current.is_empty() {
            segments.push(current.join(" "));
        }
        segments
    }

    /// A cleaned candidate made only of banking vocabulary ("account",
    /// "ATM withdrawal")
    fn is_stopword_name(&self, cleaned: &str) -> bool {
        self.lexicon.is_stopword(cleaned)
            || cleaned
                .split_whitespace()
                .all(|t| self.lexicon.is_stopword(t))
    }
}

impl ExtractionRule<String> for ContextMerchantRule {
    fn name(&self) -> &'static str {
        "context_merchant"
    }

    fn attempt(&self, text: &str) -> Option<String> {
        let span = context_regex().captures(text)?.get(1)?.as_str();
        self.segments(span)
            .iter()
            .map(|segment| clean_merchant_text(segment, &self.lexicon))
            .find(|cleaned| !cleaned.is_empty() && !self.is_stopword_name(cleaned))
            .map(|cleaned| title_case(&cleaned))
    }
}

/// First all-caps token that is not banking noise: "spent at DMART" -> "Dmart"
pub struct UppercaseTokenRule {
    lexicon: Arc<Lexicon>,
}

impl UppercaseTokenRule {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }
}

impl ExtractionRule<String> for UppercaseTokenRule {
    fn name(&self) -> &'static str {
        "uppercase_token"
    }

    fn attempt(&self, text: &str) -> Option<String> {
        uppercase_regex()
            .find_iter(text)
            .map(|m| m.as_str())
            .find(|token| {
                token.len() > 2
                    && !self.lexicon.is_stopword(token)
                    && !self.lexicon.is_currency_token(token)
            })
            .map(title_case)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> Arc<Lexicon> {
        Arc::new(Lexicon::embedded().unwrap())
    }

    #[test]
    fn test_context_stops_at_connector() {
        let rule = ContextMerchantRule::new(lexicon());
        assert_eq!(
            rule.attempt("INR 349.00 debited for payment to Swiggy via UPI."),
            Some("Swiggy".to_string())
        );
        assert_eq!(
            rule.attempt("Rs 245 paid to Ola Cabs for your ride on 20-Nov-25."),
            Some("Ola Cabs".to_string())
        );
    }

    #[test]
    fn test_context_skips_leading_noise() {
        let rule = ContextMerchantRule::new(lexicon());
        assert_eq!(
            rule.attempt("Your account has been debited by Rs 185 for an order at Subway."),
            Some("Subway".to_string())
        );
        assert_eq!(
            rule.attempt("Rs 500 debited on 21-11-25 to ZOMATO."),
            Some("Zomato".to_string())
        );
    }

    #[test]
    fn test_context_keeps_names_starting_with_stopwords() {
        let rule = ContextMerchantRule::new(lexicon());
        assert_eq!(
            rule.attempt("Rs 500 paid to Card Factory"),
            Some("Card Factory".to_string())
        );
        assert_eq!(
            rule.attempt("Rs 500 paid to Bank of Baroda credit card"),
            Some("Bank Of Baroda Credit Card".to_string())
        );
        assert_eq!(
            rule.attempt("Rs 500 paid to May Flowers Florist"),
            Some("May Flowers Florist".to_string())
        );
    }

    #[test]
    fn test_context_non_ascii_names() {
        let rule = ContextMerchantRule::new(lexicon());
        assert_eq!(
            rule.attempt("Payment of ₹260 made to Café Coffee Day through UPI."),
            Some("Café Coffee Day".to_string())
        );
    }

    #[test]
    fn test_context_keeps_unknown_names() {
        let rule = ContextMerchantRule::new(lexicon());
        assert_eq!(
            rule.attempt("UPI payment of ₹999 made to Unknown Merchant."),
            Some("Unknown Merchant".to_string())
        );
    }

    #[test]
    fn test_context_stopword_only_yields_nothing() {
        let rule = ContextMerchantRule::new(lexicon());
        assert_eq!(rule.attempt("₹20,000 credited to your account via NEFT."), None);
        assert_eq!(
            rule.attempt("INR 5,000 debited from your account via ATM withdrawal."),
            None
        );
    }

    #[test]
    fn test_order_id_removed() {
        let rule = ContextMerchantRule::new(lexicon());
        assert_eq!(
            rule.attempt("Rs 2,499 spent at Flipkart Order ID 8347387."),
            Some("Flipkart".to_string())
        );
    }

    #[test]
    fn test_clean_merchant_text() {
        let lex = lexicon();
        assert_eq!(clean_merchant_text("  Big   Bazaar!! ", &lex), "Big Bazaar");
        assert_eq!(clean_merchant_text("H&M thanks", &lex), "H&M");
        assert_eq!(clean_merchant_text("Ajio Online.", &lex), "Ajio Online");
        assert_eq!(clean_merchant_text("payment completed", &lex), "");
    }

    #[test]
    fn test_uppercase_fallback() {
        let rule = UppercaseTokenRule::new(lexicon());
        assert_eq!(
            rule.attempt("Salary of INR 52,500 credited from INFOTECH LTD"),
            Some("Infotech".to_string())
        );
        assert_eq!(rule.attempt("UPI NEFT INR RS"), None);
        assert_eq!(rule.attempt("no capitals here"), None);
    }
}
