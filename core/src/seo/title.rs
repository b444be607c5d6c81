//! Title rewriting: "Polymer Clay" first, no repeated words, at most 140 chars.

use crate::validation::MAX_TITLE_LENGTH;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashSet;

pub const TITLE_PREFIX: &str = "Polymer Clay";

/// Words that may repeat across title segments ("Gift for Her", "Set of Two").
pub const TITLE_STOP_WORDS: &[&str] = &[
    "for", "her", "him", "the", "a", "an", "and", "or", "with", "in", "on", "to", "of",
];

/// Substrings marking a segment that already names the earring type.
const EARRING_TYPE_WORDS: &[&str] = &["stud", "dangle", "earring"];

/// Truncation prefers a comma only when it keeps more than this many chars.
const MIN_COMMA_CUT: usize = 50;

static STANDALONE_CLAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bclay(\s+earrings)?\b").expect("valid pattern"));
static ENDS_WITH_POLYMER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bpolymer\s$").expect("valid pattern"));
static POLYMER_CLAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bpolymer clay\b").expect("valid pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid pattern"));
static DOUBLE_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*,").expect("valid pattern"));

/// Rewrites a listing title so it opens with "Polymer Clay".
///
/// Best-effort heuristic: segments are split on commas and judged by the
/// words they add, which can misfire on titles that do not use commas.
pub fn fix_title(old_title: &str) -> String {
    let cleaned = collapse_whitespace(&strip_standalone_clay(old_title));
    let parts: Vec<&str> = cleaned.split(',').map(str::trim).collect();
    let lower = cleaned.to_lowercase();

    let title = if let Some(rest) = strip_prefix_ignore_case(&cleaned, TITLE_PREFIX) {
        format!("{TITLE_PREFIX}{rest}")
    } else if lower.contains("polymer clay") {
        let mut new_parts: Vec<String> = Vec::new();
        for part in &parts {
            let stripped = collapse_whitespace(&POLYMER_CLAY.replace_all(part, ""));
            if !stripped.is_empty() && !new_parts.contains(&stripped) {
                new_parts.push(stripped);
            }
        }
        match new_parts.split_first() {
            Some((first, rest)) => assemble(first, rest.iter().map(String::as_str)),
            None => format!("{TITLE_PREFIX} {cleaned}"),
        }
    } else {
        assemble(parts[0], parts[1..].iter().copied())
    };

    let title = remove_duplicate_words(&title);
    let title = collapse_whitespace(&title);
    let title = DOUBLE_COMMA.replace_all(&title, ",").into_owned();

    truncate_title(&title).trim().to_string()
}

/// Drops "Clay" and turns "Clay Earrings" into "Earrings", unless the word
/// directly follows "Polymer".
fn strip_standalone_clay(title: &str) -> String {
    STANDALONE_CLAY
        .replace_all(title, |caps: &Captures| {
            let start = caps.get(0).map_or(0, |m| m.start());
            if ENDS_WITH_POLYMER.is_match(&title[..start]) {
                caps[0].to_string()
            } else if caps.get(1).is_some() {
                "Earrings".to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

fn names_earring_type(segment: &str) -> bool {
    let lower = segment.to_lowercase();
    EARRING_TYPE_WORDS.iter().any(|w| lower.contains(w))
}

/// "Polymer Clay {first}[ Earrings]" followed by the segments that add new words.
fn assemble<'a>(first: &str, rest: impl Iterator<Item = &'a str>) -> String {
    let mut title = if names_earring_type(first) {
        format!("{TITLE_PREFIX} {first}")
    } else {
        format!("{TITLE_PREFIX} {first} Earrings")
    };

    let mut seen: HashSet<String> = title
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    for part in rest.filter(|p| !p.is_empty()) {
        let words: HashSet<String> = part
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if words.iter().any(|w| !seen.contains(w)) {
            title.push_str(", ");
            title.push_str(part);
            seen.extend(words);
        }
    }
    title
}

/// Keeps a comma segment only if it brings a significant word not seen before.
/// Segments made only of stop words or short words always stay.
pub fn remove_duplicate_words(title: &str) -> String {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept: Vec<&str> = Vec::new();

    for part in title.split(',').map(str::trim) {
        let significant: Vec<String> = part
            .split_whitespace()
            .map(str::to_lowercase)
            .filter(|w| !TITLE_STOP_WORDS.contains(&w.as_str()) && w.chars().count() > 2)
            .collect();

        let adds_new = significant.iter().any(|w| !seen.contains(w));
        if adds_new || significant.is_empty() {
            kept.push(part);
            seen.extend(significant);
        }
    }
    kept.join(", ")
}

/// Cuts an over-long title at the last comma past char 50, otherwise at the
/// last space.
fn truncate_title(title: &str) -> String {
    if title.chars().count() <= MAX_TITLE_LENGTH {
        return title.to_string();
    }
    let truncated: String = title.chars().take(MAX_TITLE_LENGTH).collect();

    if let Some(idx) = truncated.rfind(',') {
        if truncated[..idx].chars().count() > MIN_COMMA_CUT {
            return truncated[..idx].to_string();
        }
    }
    match truncated.rfind(' ') {
        Some(idx) => truncated[..idx].to_string(),
        None => truncated,
    }
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}
