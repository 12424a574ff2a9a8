//! Comparison-only text normalization and weighted character counting.
//!
//! Nothing produced here is ever written to an output file.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG_PATTERN: Regex = Regex::new(r"<[^>]*>").expect("valid tag pattern");
}

const STRIPPED_PUNCTUATION: &[char] = &[
    '、', '。', '，', '．', ',', '.', '！', '？', '!', '?', '…', '—', '―', '「', '」', '『', '』',
    '（', '）', '(', ')',
];

/// Strip markup tags, whitespace and punctuation.
pub fn normalize(text: &str) -> String {
    TAG_PATTERN
        .replace_all(text, "")
        .chars()
        .filter(|c| !c.is_whitespace() && !STRIPPED_PUNCTUATION.contains(c))
        .collect()
}

/// Full-width characters (code point above 127) count 1.0, everything else 0.5.
pub fn count_weighted_chars(text: &str) -> f64 {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if (c as u32) > 127 { 1.0 } else { 0.5 })
        .sum()
}

/// Length in characters, as opposed to bytes.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
