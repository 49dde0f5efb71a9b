//! Direction rules

use std::sync::OnceLock;

use regex::Regex;

use super::rules::ExtractionRule;
use crate::models::Direction;

fn debit_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:debited|withdrawn|payment\s+to|payment\s+of|upi\s+payment|sent\s+to|spent|paid|deducted|charged|transferred\s+to)\b",
        )
        .expect("valid debit phrase regex")
    })
}

fn credit_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:credited|deposit(?:ed)?|cashback|refund(?:ed)?|received|salary)\b")
            .expect("valid credit phrase regex")
    })
}

/// Matches a fixed phrase list for one direction
pub struct PhraseRule {
    name: &'static str,
    direction: Direction,
    pattern: fn() -> &'static Regex,
}

impl PhraseRule {
    pub fn debit() -> Self {
        Self {
            name: "debit_phrases",
            direction: Direction::Debit,
            pattern: debit_regex,
        }
    }

    pub fn credit() -> Self {
        Self {
            name: "credit_phrases",
            direction: Direction::Credit,
            pattern: credit_regex,
        }
    }
}

impl ExtractionRule<Direction> for PhraseRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn attempt(&self, text: &str) -> Option<Direction> {
        (self.pattern)().is_match(text).then_some(self.direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debit_phrases() {
        let rule = PhraseRule::debit();
        assert_eq!(rule.attempt("INR 349 DEBITED from a/c"), Some(Direction::Debit));
        assert_eq!(rule.attempt("Payment of Rs 10 done"), Some(Direction::Debit));
        assert_eq!(rule.attempt("You spent 200 at Cafe"), Some(Direction::Debit));
        assert_eq!(rule.attempt("credited to your account"), None);
    }

    #[test]
    fn test_credit_phrases() {
        let rule = PhraseRule::credit();
        assert_eq!(rule.attempt("Salary of 50000 credited"), Some(Direction::Credit));
        assert_eq!(rule.attempt("Refund received"), Some(Direction::Credit));
        assert_eq!(rule.attempt("Cashback of Rs 20"), Some(Direction::Credit));
        // Whole words only
        assert_eq!(rule.attempt("unreceivedness"), None);
    }
}
