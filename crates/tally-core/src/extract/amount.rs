//! Amount rules

use std::sync::OnceLock;

use regex::Regex;

use super::rules::ExtractionRule;

/// Currency code or symbol followed by a number (`INR 1,299.00`, `₹20 000`, `Rs.45`)
fn currency_amount_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:\b(?:INR|USD|RS)\.?|[₹$])\s*(\d+(?:,\d{2,3}|[ \u{a0}]\d{3}\b)*(?:\.\d+)?)",
        )
        .expect("valid currency amount regex")
    })
}

fn bare_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b\d+(?:,\d{2,3})*(?:\.\d+)?\b").expect("valid bare number regex")
    })
}

/// Parse a numeric token after removing thousands separators.
///
/// Only positive, finite magnitudes are accepted.
pub fn parse_magnitude(token: &str) -> Option<f64> {
    let cleaned: String = token
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '\u{a0}'))
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// First currency-marked number in the message
pub struct CurrencyAmountRule;

impl ExtractionRule<f64> for CurrencyAmountRule {
    fn name(&self) -> &'static str {
        "currency_amount"
    }

    fn attempt(&self, text: &str) -> Option<f64> {
        currency_amount_regex()
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .find_map(|m| parse_magnitude(m.as_str()))
    }
}

/// Largest bare number anywhere in the message
///
/// Reference numbers and dates tend to be smaller than the amount when no
/// currency marker is present. This is a heuristic only.
pub struct LargestNumberRule;

impl ExtractionRule<f64> for LargestNumberRule {
    fn name(&self) -> &'static str {
        "largest_number"
    }

    fn attempt(&self, text: &str) -> Option<f64> {
        bare_number_regex()
            .find_iter(text)
            .filter_map(|m| parse_magnitude(m.as_str()))
            .fold(None, |best: Option<f64>, v| match best {
                Some(b) if b >= v => Some(b),
                _ => Some(v),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_marked_amounts() {
        let rule = CurrencyAmountRule;
        assert_eq!(rule.attempt("INR 349.00 debited"), Some(349.0));
        assert_eq!(rule.attempt("₹20,000 credited"), Some(20000.0));
        assert_eq!(rule.attempt("Rs.1,25,000.50 received"), Some(125000.5));
        assert_eq!(rule.attempt("paid rs 45 to shop"), Some(45.0));
        assert_eq!(rule.attempt("USD 12 000 sent"), Some(12000.0));
        assert_eq!(rule.attempt("$7.99 charged"), Some(7.99));
    }

    #[test]
    fn test_currency_marker_needs_word_boundary() {
        // "hours" must not be read as the "rs" currency code
        assert_eq!(CurrencyAmountRule.attempt("2 hours 30 mins"), None);
    }

    #[test]
    fn test_zero_marked_amount_is_skipped() {
        assert_eq!(
            CurrencyAmountRule.attempt("Rs 0 cashback, INR 250 paid"),
            Some(250.0)
        );
    }

    #[test]
    fn test_largest_bare_number() {
        let rule = LargestNumberRule;
        assert_eq!(rule.attempt("order 12 total 1,499.50 on 3"), Some(1499.5));
        assert_eq!(rule.attempt("no digits here"), None);
        assert_eq!(rule.attempt("0 and 0.0"), None);
    }

    #[test]
    fn test_parse_magnitude() {
        assert_eq!(parse_magnitude("1,00,000"), Some(100000.0));
        assert_eq!(parse_magnitude("20 000"), Some(20000.0));
        assert_eq!(parse_magnitude("abc"), None);
        assert_eq!(parse_magnitude("0"), None);
    }
}
