//! Small text helpers shared by extraction and aggregation

/// Title-case a string: the first letter of every alphabetic run is
/// upper-cased, the rest lower-cased.
///
/// Letters following an apostrophe are not treated as a new word, so
/// "domino's" becomes "Domino's".
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev: Option<char> = None;

    for c in s.chars() {
        let starts_word = match prev {
            None => true,
            Some(p) => !p.is_alphabetic() && p != '\'',
        };
        if c.is_alphabetic() && starts_word {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        prev = Some(c);
    }

    out
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
