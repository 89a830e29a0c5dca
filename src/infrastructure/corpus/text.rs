//! Text normalization and tokenization for scraped regulation text

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static PERIOD_GLUED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(\S)").unwrap());
static DIGIT_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)(\p{L})").unwrap());
static LETTER_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\p{L})(\d)").unwrap());
static SECTION_BEFORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"§(\S)").unwrap());
static SECTION_AFTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\S)§").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Repair spacing lost while scraping
///
/// `"stk.1§3gælder for2,5m"` becomes `"stk. 1 § 3 gælder for 2,5 m"`.
pub fn normalize_text(text: &str) -> String {
    let text = PERIOD_GLUED.replace_all(text, ". $1");
    let text = DIGIT_LETTER.replace_all(&text, "$1 $2");
    let text = LETTER_DIGIT.replace_all(&text, "$1 $2");
    let text = SECTION_BEFORE.replace_all(&text, "§ $1");
    let text = SECTION_AFTER.replace_all(&text, "$1 §");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Lower-cased Unicode words
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words().map(|w| w.to_lowercase()).collect()
}
