//! Text helpers shared by the checks
//!
//! Matching is case-insensitive substring search over characters, so excerpts stay
//! aligned with the original text even when it contains non-ASCII letters.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").expect("whitespace pattern is valid");
}

/// Characters kept on each side of a match when building evidence
pub const EXCERPT_RADIUS: usize = 45;

/// Collapse every whitespace run to one space and trim the ends
pub fn compact_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// One lower-case char per input char, so indices map back onto the original
fn fold(text: &str) -> Vec<char> {
    text.chars().map(|c| c.to_lowercase().next().unwrap_or(c)).collect()
}

fn position_in(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// First vocabulary term present in `text`; scan order is vocabulary order
pub fn first_term<'v>(text: &str, vocabulary: &[&'v str]) -> Option<&'v str> {
    let haystack = fold(text);
    vocabulary
        .iter()
        .copied()
        .find(|term| position_in(&haystack, &fold(term)).is_some())
}

/// Short excerpt around the first occurrence of `needle`, whitespace-collapsed
pub fn excerpt(text: &str, needle: &str, radius: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let needle_chars = fold(needle);

    match position_in(&fold(text), &needle_chars) {
        Some(start) => {
            let from = start.saturating_sub(radius);
            let to = (start + needle_chars.len() + radius).min(chars.len());
            compact_whitespace(&chars[from..to].iter().collect::<String>())
        }
        None => compact_whitespace(text).chars().take(radius * 2).collect(),
    }
}
