//! Extraction vocabulary: merchant map, keyword table, stopwords
//!
//! The lexicon is loaded once from TOML and then shared read-only (behind an
//! `Arc`) by every extractor. The default file is compiled into the binary;
//! a copy in the data directory overrides it:
//!
//! - Linux: `~/.local/share/tally/config/lexicon.toml`
//! - macOS: `~/Library/Application Support/tally/config/lexicon.toml`
//!
//! Table order in the file is significant. Merchant and keyword entries are
//! tried top to bottom and the first hit wins.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Category;

const DEFAULT_LEXICON: &str = include_str!("../../../config/lexicon.toml");

/// Where the active lexicon was read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum LexiconSource {
    Embedded,
    File(PathBuf),
}

impl std::fmt::Display for LexiconSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Embedded => write!(f, "embedded default"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LexiconFile {
    #[serde(default)]
    merchant_stopwords: Vec<String>,
    #[serde(default)]
    currency_tokens: Vec<String>,
    #[serde(default)]
    filler_words: Vec<String>,
    #[serde(default)]
    connector_words: Vec<String>,
    #[serde(default)]
    bank_terms: Vec<String>,
    #[serde(default)]
    merchants: Vec<MerchantEntry>,
    #[serde(default)]
    keywords: Vec<KeywordEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MerchantEntry {
    pub name: String,
    pub category: Category,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeywordEntry {
    pub category: Category,
    pub terms: Vec<String>,
}

/// Counts describing a loaded lexicon (for `tally lexicon`)
#[derive(Debug, Clone, Serialize)]
pub struct LexiconSummary {
    pub source: LexiconSource,
    pub merchants: usize,
    pub keyword_categories: usize,
    pub keyword_terms: usize,
    pub stopwords: usize,
    pub filler_words: usize,
    pub bank_terms: usize,
}

/// Immutable extraction vocabulary
#[derive(Debug, Clone)]
pub struct Lexicon {
    source: LexiconSource,
    stopwords: HashSet<String>,
    currency_tokens: HashSet<String>,
    filler_words: HashSet<String>,
    connectors: HashSet<String>,
    bank_term_count: usize,
    merchants: Vec<MerchantEntry>,
    keywords: Vec<KeywordEntry>,
    filler_pattern: Option<Regex>,
    bank_pattern: Option<Regex>,
}

impl Lexicon {
    /// Load the override file if one exists, else the embedded default
    pub fn load() -> Result<Self> {
        match override_path() {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "Loading lexicon override");
                Self::from_path(&path)
            }
            _ => Self::embedded(),
        }
    }

    /// The default lexicon compiled into the binary
    pub fn embedded() -> Result<Self> {
        Self::from_toml_str(DEFAULT_LEXICON)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read lexicon {}: {}",
                path.display(),
                e
            ))
        })?;
        let mut lexicon = Self::from_toml_str(&content)?;
        lexicon.source = LexiconSource::File(path.to_path_buf());
        Ok(lexicon)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: LexiconFile = toml::from_str(content)?;

        let lower_set = |words: &[String]| -> HashSet<String> {
            words
                .iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect()
        };

        let merchants = raw
            .merchants
            .into_iter()
            .map(|m| MerchantEntry {
                name: m.name.trim().to_lowercase(),
                category: m.category,
            })
            .filter(|m| !m.name.is_empty())
            .collect();

        let keywords = raw
            .keywords
            .into_iter()
            .map(|k| KeywordEntry {
                category: k.category,
                terms: k
                    .terms
                    .iter()
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect(),
            })
            .collect();

        Ok(Self {
            source: LexiconSource::Embedded,
            stopwords: lower_set(&raw.merchant_stopwords),
            currency_tokens: lower_set(&raw.currency_tokens),
            filler_words: lower_set(&raw.filler_words),
            connectors: lower_set(&raw.connector_words),
            bank_term_count: raw.bank_terms.len(),
            merchants,
            keywords,
            filler_pattern: word_pattern(&raw.filler_words)?,
            bank_pattern: word_pattern(&raw.bank_terms)?,
        })
    }

    pub fn source(&self) -> &LexiconSource {
        &self.source
    }

    pub fn merchants(&self) -> &[MerchantEntry] {
        &self.merchants
    }

    pub fn keywords(&self) -> &[KeywordEntry] {
        &self.keywords
    }

    /// First merchant-map entry contained in `merchant`
    pub fn merchant_category(&self, merchant: &str) -> Option<Category> {
        let lower = merchant.to_lowercase();
        self.merchants
            .iter()
            .find(|m| lower.contains(&m.name))
            .map(|m| m.category)
    }

    /// First keyword-table category with a term contained in `text`
    pub fn keyword_category(&self, text: &str) -> Option<Category> {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .find(|k| k.terms.iter().any(|t| lower.contains(t.as_str())))
            .map(|k| k.category)
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(&token.trim().to_lowercase())
    }

    pub fn is_currency_token(&self, token: &str) -> bool {
        self.currency_tokens.contains(&token.trim().to_lowercase())
    }

    pub fn is_filler(&self, token: &str) -> bool {
        self.filler_words.contains(&token.trim().to_lowercase())
    }

    pub fn is_connector(&self, token: &str) -> bool {
        self.connectors.contains(&token.trim().to_lowercase())
    }

    /// Whole-word match against the generic banking vocabulary
    pub fn matches_bank_terms(&self, text: &str) -> bool {
        self.bank_pattern
            .as_ref()
            .is_some_and(|re| re.is_match(text))
    }

    /// Remove filler words and phrases ("thank you", "completed") from `text`
    pub fn strip_fillers(&self, text: &str) -> String {
        match &self.filler_pattern {
            Some(re) => re.replace_all(text, " ").into_owned(),
            None => text.to_string(),
        }
    }

    pub fn summary(&self) -> LexiconSummary {
        LexiconSummary {
            source: self.source.clone(),
            merchants: self.merchants.len(),
            keyword_categories: self.keywords.len(),
            keyword_terms: self.keywords.iter().map(|k| k.terms.len()).sum(),
            stopwords: self.stopwords.len(),
            filler_words: self.filler_words.len(),
            bank_terms: self.bank_term_count,
        }
    }
}

/// Default lexicon override path
pub fn override_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tally").join("config").join("lexicon.toml"))
}

/// Case-insensitive whole-word alternation; longer phrases are tried first
fn word_pattern(words: &[String]) -> Result<Option<Regex>> {
    let mut words: Vec<String> = words
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return Ok(None);
    }
    words.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    words.dedup();

    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Ok(Some(Regex::new(&format!(r"(?i)\b(?:{})\b", alternation))?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_lexicon_loads() {
        let lexicon = Lexicon::embedded().unwrap();
        assert_eq!(lexicon.source(), &LexiconSource::Embedded);
        assert!(lexicon.merchants().len() > 30);
        assert_eq!(lexicon.keywords()[0].category, Category::Food);
        assert!(lexicon.is_stopword("Account"));
        assert!(lexicon.is_currency_token("INR"));
        assert!(lexicon.is_connector("via"));
        assert!(lexicon.is_filler("Thanks"));
    }

    #[test]
    fn test_merchant_map_order() {
        let lexicon = Lexicon::embedded().unwrap();
        assert_eq!(lexicon.merchant_category("Swiggy"), Some(Category::Food));
        // "ubereats" is listed before "uber"
        assert_eq!(lexicon.merchant_category("UberEats"), Some(Category::Food));
        assert_eq!(lexicon.merchant_category("Uber India"), Some(Category::Travel));
        assert_eq!(lexicon.merchant_category("Unknown Merchant"), None);
    }

    #[test]
    fn test_keyword_category() {
        let lexicon = Lexicon::embedded().unwrap();
        assert_eq!(
            lexicon.keyword_category("paid monthly rent to landlord"),
            Some(Category::Rent)
        );
        assert_eq!(
            lexicon.keyword_category("Electricity bill"),
            Some(Category::Utilities)
        );
        assert_eq!(lexicon.keyword_category("zzz"), None);
    }

    #[test]
    fn test_bank_terms_are_whole_words() {
        let lexicon = Lexicon::embedded().unwrap();
        assert!(lexicon.matches_bank_terms("Rs 500 sent via UPI"));
        assert!(lexicon.matches_bank_terms("your A/c XX1234"));
        assert!(!lexicon.matches_bank_terms("a coupon for you"));
    }

    #[test]
    fn test_strip_fillers() {
        let lexicon = Lexicon::embedded().unwrap();
        let cleaned = lexicon.strip_fillers("Swiggy thank you completed");
        assert_eq!(cleaned.split_whitespace().collect::<Vec<_>>(), ["Swiggy"]);
    }

    #[test]
    fn test_custom_lexicon() {
        let toml = r#"
merchant_stopwords = ["shop"]

[[merchants]]
name = "Corner Cafe"
category = "food"

[[keywords]]
category = "rent"
terms = ["lease"]
"#;
        let lexicon = Lexicon::from_toml_str(toml).unwrap();
        assert_eq!(lexicon.merchant_category("THE CORNER CAFE"), Some(Category::Food));
        assert_eq!(lexicon.keyword_category("lease for march"), Some(Category::Rent));
        assert!(!lexicon.matches_bank_terms("upi"));
        assert_eq!(lexicon.strip_fillers("as is"), "as is");
    }

    #[test]
    fn test_invalid_lexicon() {
        let toml = r#"
[[merchants]]
name = "x"
category = "crypto"
"#;
        assert!(matches!(
            Lexicon::from_toml_str(toml),
            Err(Error::Toml(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let dir = std::env::temp_dir().join(format!("tally-lexicon-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("lexicon.toml");
        fs::write(&path, "merchant_stopwords = [\"foo\"]\n").unwrap();

        let lexicon = Lexicon::from_path(&path).unwrap();
        assert_eq!(lexicon.source(), &LexiconSource::File(path.clone()));
        assert!(lexicon.is_stopword("FOO"));

        fs::remove_dir_all(&dir).unwrap();
        assert!(matches!(Lexicon::from_path(&path), Err(Error::Config(_))));
    }
}
