//! Tag normalization: multi-word phrases, at most 13 tags of at most 20 chars.

use crate::validation::{MAX_TAGS, MAX_TAG_LENGTH};
use std::collections::HashSet;

/// Single-word tags and the phrases that replace them.
pub const SINGLE_WORD_TAG_FIXES: &[(&str, &str)] = &[
    ("hypoallergenic", "hypoallergenic earrings"),
    ("lightweight", "lightweight earrings"),
    ("handmade", "handmade jewelry"),
    ("botanical", "botanical jewelry"),
    ("minimalist", "minimalist style"),
    ("romantic", "romantic jewelry"),
    ("elegant", "elegant jewelry"),
    ("vintage", "vintage style"),
    ("boho", "boho style"),
    ("kawaii", "kawaii jewelry"),
    ("cottagecore", "cottagecore style"),
    ("coquette", "coquette aesthetic"),
    ("trendy", "trendy jewelry"),
];

/// Single words that read as a style rather than a product.
pub const STYLE_WORDS: &[&str] = &["boho", "kawaii", "coquette", "cottagecore"];

/// Single words left alone.
pub const EXEMPT_WORDS: &[&str] = &["handmade", "unique", "artisan"];

/// Appended to the list while there is room.
pub const CORE_TAGS: &[&str] = &["polymer clay earrings", "handmade in poland", "gift for her"];

/// Single words this long or longer are left as they are.
const SUFFIX_MAX_WORD_LEN: usize = 15;

/// Normalizes one tag.
///
/// Every returned tag fits in [`MAX_TAG_LENGTH`] chars, including the
/// phrases produced by the substitution table. "hypoallergenic earrings"
/// and "polymer clay earrings" are longer than that, so they come out
/// clamped to "hypoallergenic" and "polymer clay".
pub fn fix_tag(tag: &str) -> String {
    let tag = tag.trim().to_lowercase();

    let phrase = if tag == "polymer clay" {
        "polymer clay earrings".to_string()
    } else if let Some((_, fixed)) = SINGLE_WORD_TAG_FIXES.iter().find(|(word, _)| *word == tag) {
        fixed.to_string()
    } else if !tag.contains(' ') && tag.chars().count() < SUFFIX_MAX_WORD_LEN {
        if tag.ends_with('s') || EXEMPT_WORDS.contains(&tag.as_str()) {
            tag
        } else if STYLE_WORDS.contains(&tag.as_str()) {
            format!("{tag} style")
        } else {
            format!("{tag} earrings")
        }
    } else {
        tag
    };

    clamp_tag(&phrase)
}

/// Drops the trailing word when that is enough, otherwise cuts at 20 chars.
pub fn clamp_tag(tag: &str) -> String {
    if tag.chars().count() <= MAX_TAG_LENGTH {
        return tag.to_string();
    }
    let words: Vec<&str> = tag.split_whitespace().collect();
    if words.len() > 1 {
        let shortened = words[..words.len() - 1].join(" ");
        if shortened.chars().count() <= MAX_TAG_LENGTH {
            return shortened;
        }
    }
    tag.chars()
        .take(MAX_TAG_LENGTH)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Fixes every tag, removes case-insensitive duplicates (first one wins),
/// backfills [`CORE_TAGS`] while there is room and caps the list at 13.
pub fn fix_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut fixed_tags: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for tag in tags.iter().map(AsRef::as_ref) {
        if tag.trim().is_empty() {
            continue;
        }
        let fixed = fix_tag(tag);
        if seen.insert(fixed.to_lowercase()) {
            fixed_tags.push(fixed);
        }
    }

    for core in CORE_TAGS {
        if fixed_tags.len() >= MAX_TAGS {
            break;
        }
        let core = clamp_tag(core);
        if seen.insert(core.clone()) {
            fixed_tags.push(core);
        }
    }

    fixed_tags.truncate(MAX_TAGS);
    fixed_tags
}
