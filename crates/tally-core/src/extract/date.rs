//! Date rules
//!
//! Four explicit token shapes are tried first, each day-first:
//!
//! | Shape        | Example        |
//! |--------------|----------------|
//! | numeric      | `21/11/2025`   |
//! | day month    | `21 Nov 2025`  |
//! | month day    | `Nov 21, 2025` |
//! | compact      | `21Nov25`      |
//!
//! A looser scan over the whole message follows. It anchors on a month name
//! and picks nearby day and year numbers, falling back to the reference
//! year when none is present.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use super::rules::ExtractionRule;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Month number for a full or abbreviated English month name
pub fn month_from_word(word: &str) -> Option<u32> {
    let lower = word.to_lowercase();
    if lower == "sept" {
        return Some(9);
    }
    if lower.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(&lower))
        .map(|i| i as u32 + 1)
}

/// Expand a two-digit year (`25` -> 2025, `89` -> 1989); four digits pass through
fn normalize_year(token: &str) -> Option<i32> {
    let year: i32 = token.parse().ok()?;
    match token.len() {
        2 if year < 70 => Some(2000 + year),
        2 => Some(1900 + year),
        4 => Some(year),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
enum Shape {
    Numeric,
    DayMonthYear,
    MonthDayYear,
    Compact,
}

fn numeric_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})\b").expect("valid numeric date regex")
    })
}

fn day_month_year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,2})\s+([A-Za-z]{3,9})\s+(\d{2,4})\b")
            .expect("valid day-month-year regex")
    })
}

fn month_day_year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([A-Za-z]{3,9})\s+(\d{1,2}),?\s+(\d{2,4})\b")
            .expect("valid month-day-year regex")
    })
}

fn compact_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,2})([A-Za-z]{3})(\d{2,4})\b").expect("valid compact date regex")
    })
}

impl Shape {
    fn regex(&self) -> &'static Regex {
        match self {
            Self::Numeric => numeric_regex(),
            Self::DayMonthYear => day_month_year_regex(),
            Self::MonthDayYear => month_day_year_regex(),
            Self::Compact => compact_regex(),
        }
    }

    fn parse(&self, a: &str, b: &str, c: &str) -> Option<NaiveDate> {
        match self {
            Self::Numeric => {
                let first: u32 = a.parse().ok()?;
                let second: u32 = b.parse().ok()?;
                let year = normalize_year(c)?;
                // Day first; month first only when that reading is impossible
                NaiveDate::from_ymd_opt(year, second, first)
                    .or_else(|| NaiveDate::from_ymd_opt(year, first, second))
            }
            Self::DayMonthYear | Self::Compact => {
                NaiveDate::from_ymd_opt(normalize_year(c)?, month_from_word(b)?, a.parse().ok()?)
            }
            Self::MonthDayYear => {
                NaiveDate::from_ymd_opt(normalize_year(c)?, month_from_word(a)?, b.parse().ok()?)
            }
        }
    }
}

/// One explicit date-token shape
pub struct ExplicitDateRule {
    name: &'static str,
    shape: Shape,
}

impl ExplicitDateRule {
    pub fn numeric() -> Self {
        Self {
            name: "numeric_date",
            shape: Shape::Numeric,
        }
    }

    pub fn day_month_year() -> Self {
        Self {
            name: "day_month_year",
            shape: Shape::DayMonthYear,
        }
    }

    pub fn month_day_year() -> Self {
        Self {
            name: "month_day_year",
            shape: Shape::MonthDayYear,
        }
    }

    pub fn compact() -> Self {
        Self {
            name: "compact_date",
            shape: Shape::Compact,
        }
    }

    /// All four shapes in precedence order
    pub fn all() -> [Self; 4] {
        [
            Self::numeric(),
            Self::day_month_year(),
            Self::month_day_year(),
            Self::compact(),
        ]
    }
}

impl ExtractionRule<NaiveDate> for ExplicitDateRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn attempt(&self, text: &str) -> Option<NaiveDate> {
        self.shape.regex().captures_iter(text).find_map(|caps| {
            self.shape
                .parse(caps.get(1)?.as_str(), caps.get(2)?.as_str(), caps.get(3)?.as_str())
        })
    }
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z]+|\d+").expect("valid date token regex"))
}

fn iso_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{4})[./-](\d{1,2})[./-](\d{1,2})\b").expect("valid iso date regex")
    })
}

fn dotted_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{2,4})\b").expect("valid dotted date regex")
    })
}

/// Loose whole-message scan
///
/// Missing years default to the reference date's year; a month name with a
/// year but no day resolves to the first of that month.
pub struct FuzzyDateRule {
    reference: NaiveDate,
}

impl FuzzyDateRule {
    pub fn new(reference: NaiveDate) -> Self {
        Self { reference }
    }

    fn from_month_anchor(&self, tokens: &[&str], i: usize, month: u32) -> Option<NaiveDate> {
        let day_index = [i.checked_sub(1), Some(i + 1)]
            .into_iter()
            .flatten()
            .find(|&j| tokens.get(j).is_some_and(|t| is_day_token(t)));

        // Four-digit year near the month, then anywhere in the message
        let near = i.saturating_sub(2)..=(i + 2);
        let four_digit = near
            .filter_map(|j| tokens.get(j))
            .chain(tokens.iter())
            .find(|t| is_year_token(t))
            .and_then(|t| t.parse::<i32>().ok());

        // Two-digit year directly after the month (or after a trailing day)
        let after = if day_index == Some(i + 1) { i + 2 } else { i + 1 };
        let year = four_digit.or_else(|| {
            tokens
                .get(after)
                .filter(|t| t.len() == 2 && t.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|t| normalize_year(t))
        });

        if day_index.is_none() && year.is_none() {
            return None;
        }

        let day = day_index
            .and_then(|j| tokens.get(j))
            .and_then(|t| t.parse::<u32>().ok())
            .unwrap_or(1);

        NaiveDate::from_ymd_opt(year.unwrap_or(self.reference.year()), month, day)
    }
}

fn is_day_token(token: &str) -> bool {
    token.len() <= 2
        && token.bytes().all(|b| b.is_ascii_digit())
        && token.parse::<u32>().is_ok_and(|d| (1..=31).contains(&d))
}

fn is_year_token(token: &str) -> bool {
    token.len() == 4
        && token.bytes().all(|b| b.is_ascii_digit())
        && token.parse::<i32>().is_ok_and(|y| (1900..=2100).contains(&y))
}

impl ExtractionRule<NaiveDate> for FuzzyDateRule {
    fn name(&self) -> &'static str {
        "fuzzy_date"
    }

    fn attempt(&self, text: &str) -> Option<NaiveDate> {
        let tokens: Vec<&str> = token_regex()
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|t| !matches!(t.to_lowercase().as_str(), "st" | "nd" | "rd" | "th"))
            .collect();

        tokens
            .iter()
            .enumerate()
            .find_map(|(i, t)| self.from_month_anchor(&tokens, i, month_from_word(t)?))
            .or_else(|| {
                iso_regex().captures_iter(text).find_map(|caps| {
                    NaiveDate::from_ymd_opt(
                        caps.get(1)?.as_str().parse().ok()?,
                        caps.get(2)?.as_str().parse().ok()?,
                        caps.get(3)?.as_str().parse().ok()?,
                    )
                })
            })
            .or_else(|| {
                dotted_regex().captures_iter(text).find_map(|caps| {
                    Shape::Numeric.parse(
                        caps.get(1)?.as_str(),
                        caps.get(2)?.as_str(),
                        caps.get(3)?.as_str(),
                    )
                })
            })
    }
}
