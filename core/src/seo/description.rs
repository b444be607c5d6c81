//! Description rewriting: keyword-rich intro, original details kept.
//!
//! The original description is expected to use `★ SECTION:` markers. Inputs
//! without them still get the new intro but lose their body, so treat the
//! output as a draft to review.

use once_cell::sync::Lazy;
use regex::Regex;

/// Opens the colors line, e.g. `★ COLORS: Pink, Gold`.
pub const COLORS_MARKER_PATTERN: &str = r"★ COLORS?:";
/// Opens the selling-points section that the new intro replaces.
pub const LOVE_MARKER_PATTERN: &str = r"★ WHY YOU'?LL LOVE THESE?:";
/// Character that starts every section header.
pub const SECTION_BULLET: char = '★';

/// Title keywords and the style word they map to, first match wins.
pub const STYLE_KEYWORDS: &[(&str, &str)] = &[
    ("boho", "boho"),
    ("minimalist", "minimalist"),
    ("elegant", "elegant"),
    ("vintage", "vintage"),
    ("retro", "retro"),
    ("romantic", "romantic"),
    ("cute", "cute"),
    ("kawaii", "kawaii"),
    ("botanical", "botanical"),
    ("floral", "floral"),
    ("modern", "modern"),
    ("statement", "statement"),
    ("glamour", "glamorous"),
    ("bridal", "bridal"),
    ("coquette", "coquette"),
];

pub const COLOR_KEYWORDS: &[&str] = &[
    "blue", "red", "pink", "orange", "green", "yellow", "purple", "black", "white", "gold",
    "silver", "coral", "burgundy", "vanilla", "beige", "navy", "turquoise", "lilac", "pastel",
];

const DEFAULT_STYLE: &str = "unique";
const DEFAULT_COLORS: &str = "mixed";
const MAX_TITLE_COLORS: usize = 3;

const LOVE_SECTION: &str = "WHY YOU'LL LOVE THESE:
- Unique handmade design - no two pairs are exactly alike
- Ultra-lightweight (3-5g per pair) - comfortable all day wear
- Hypoallergenic surgical steel hooks - safe for sensitive ears
- Made with premium polymer clay
- Ships from EU - fast delivery across Europe";

static FOOTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)\n─+\n.*?•.*$").expect("valid footer pattern"));
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\n+").expect("valid pattern"));
static TRIPLE_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid pattern"));
static EMOJI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        "[",
        "\u{1F600}-\u{1F64F}",
        "\u{1F300}-\u{1F5FF}",
        "\u{1F680}-\u{1F6FF}",
        "\u{1F1E0}-\u{1F1FF}",
        "\u{2702}-\u{27B0}",
        "\u{24C2}-\u{1F251}",
        "\u{1F926}-\u{1F937}",
        "\u{10000}-\u{10FFFF}",
        "\u{2640}-\u{2642}",
        "\u{2600}-\u{2B55}",
        "\u{200D}\u{23CF}\u{23E9}\u{231A}\u{FE0F}\u{3030}",
        "]+"
    ))
    .expect("valid emoji pattern")
});

/// Compiled section markers. Build custom ones for shops that use other headings.
#[derive(Debug, Clone)]
pub struct DescriptionMarkers {
    colors_line: Regex,
    colors_start: Regex,
    love_start: Regex,
    section_bullet: char,
}

impl DescriptionMarkers {
    pub fn new(
        colors_marker: &str,
        love_marker: &str,
        section_bullet: char,
    ) -> Result<Self, regex::Error> {
        let bullet = regex::escape(&section_bullet.to_string());
        Ok(Self {
            colors_line: Regex::new(&format!(r"{colors_marker}\s*([^\n{bullet}]+)"))?,
            colors_start: Regex::new(colors_marker)?,
            love_start: Regex::new(love_marker)?,
            section_bullet,
        })
    }

    /// Text after the colors marker, up to the end of its line.
    pub fn colors(&self, description: &str) -> Option<String> {
        self.colors_line
            .captures(description)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|c| !c.is_empty())
    }

    /// Everything from the colors marker on, minus the "why you'll love" section.
    pub fn details(&self, description: &str) -> String {
        let Some(start) = self.colors_start.find(description) else {
            return String::new();
        };
        let mut rest = description[start.start()..].to_string();

        if let Some((start, marker_end)) = self.love_start.find(&rest).map(|m| (m.start(), m.end())) {
            let end = rest[marker_end..]
                .find(self.section_bullet)
                .map_or(rest.len(), |i| marker_end + i);
            rest.replace_range(start..end, "");
        }

        BLANK_RUN.replace_all(&rest, "\n\n").into_owned()
    }
}

impl Default for DescriptionMarkers {
    fn default() -> Self {
        Self::new(COLORS_MARKER_PATTERN, LOVE_MARKER_PATTERN, SECTION_BULLET)
            .expect("built-in markers are valid patterns")
    }
}

/// Product name, style and colors guessed from a (fixed) title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInfo {
    pub name: String,
    pub style: String,
    pub colors: String,
}

pub fn extract_product_info(title: &str) -> ProductInfo {
    let name = title.split(',').next().unwrap_or(title).trim().to_string();
    let lower = title.to_lowercase();

    let style = STYLE_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map_or(DEFAULT_STYLE, |&(_, style)| style)
        .to_string();

    let colors: Vec<String> = COLOR_KEYWORDS
        .iter()
        .filter(|c| lower.contains(*c))
        .take(MAX_TITLE_COLORS)
        .map(|c| capitalize(c))
        .collect();

    ProductInfo {
        name,
        style,
        colors: if colors.is_empty() {
            DEFAULT_COLORS.to_string()
        } else {
            colors.join(", ")
        },
    }
}

/// Drops blank and emoji-only lines before the first line with real text.
pub fn strip_leading_emoji(text: &str) -> String {
    text.lines()
        .skip_while(|line| EMOJI.replace_all(line.trim(), "").trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rebuilds a description around a fixed title.
pub fn fix_description(description: &str, title: &str) -> String {
    fix_description_with(description, title, &DescriptionMarkers::default())
}

pub fn fix_description_with(description: &str, title: &str, markers: &DescriptionMarkers) -> String {
    let description = strip_leading_emoji(description);
    let info = extract_product_info(title);
    let colors = markers.colors(&description).unwrap_or(info.colors);

    let intro = format!(
        "Handmade {} crafted with premium polymer clay in Poland. \
         These beautiful {} earrings feature {} tones and hypoallergenic surgical steel hooks. \
         Perfect unique gift for her - ships within 24-48h across EU!\n\n{LOVE_SECTION}",
        info.name.to_lowercase(),
        info.style,
        colors.to_lowercase(),
    );

    let full = format!("{intro}\n\n{}", markers.details(&description).trim());
    let full = FOOTER.replace_all(&full, "");
    let full = TRIPLE_NEWLINE.replace_all(&full, "\n\n");
    full.trim().to_string()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGINAL: &str = "🌸✨\n\n★ COLORS: Pastel Pink, Gold\n\n★ WHY YOU'LL LOVE THESE:\n- old point\n- another\n\n★ DETAILS:\n- Length: 4 cm\n\n\n\n★ CARE:\nKeep dry.\n─────\n#earrings • #handmade • #gift";

    #[test]
    fn test_extract_product_info() {
        let info = extract_product_info("Polymer Clay Boho Earrings, Pink and Gold Daisy");
        assert_eq!(info.name, "Polymer Clay Boho Earrings");
        assert_eq!(info.style, "boho");
        assert_eq!(info.colors, "Pink, Gold");
    }

    #[test]
    fn test_extract_product_info_defaults() {
        let info = extract_product_info("Polymer Clay Hoops");
        assert_eq!(info.style, "unique");
        assert_eq!(info.colors, "mixed");
    }

    #[test]
    fn test_colors_limited_to_three() {
        let info = extract_product_info("Blue Red Pink Orange Studs");
        assert_eq!(info.colors, "Blue, Red, Pink");
    }

    #[test]
    fn test_strip_leading_emoji() {
        assert_eq!(strip_leading_emoji("🌸✨\n\n  \nHello 🌸\nWorld"), "Hello 🌸\nWorld");
        assert_eq!(strip_leading_emoji("Plain text"), "Plain text");
    }

    #[test]
    fn test_keywords_in_first_160_chars() {
        let fixed = fix_description(ORIGINAL, "Polymer Clay Boho Earrings, Gift for Her");
        let head: String = fixed.chars().take(160).collect();
        assert!(head.contains("polymer clay"));
        assert!(head.contains("Handmade"));
        assert!(head.contains("boho earrings"));
    }

    #[test]
    fn test_colors_taken_from_marker() {
        let fixed = fix_description(ORIGINAL, "Polymer Clay Blue Studs");
        assert!(fixed.contains("feature pastel pink, gold tones"));
    }

    #[test]
    fn test_old_love_section_and_footer_removed() {
        let fixed = fix_description(ORIGINAL, "Polymer Clay Boho Earrings");
        assert!(!fixed.contains("old point"));
        assert_eq!(fixed.matches("WHY YOU'LL LOVE THESE:").count(), 1);
        assert!(fixed.contains("★ COLORS: Pastel Pink, Gold"));
        assert!(fixed.contains("★ DETAILS:\n- Length: 4 cm\n\n★ CARE:"));
        assert!(fixed.ends_with("Keep dry."));
        assert!(!fixed.contains('•'));
        assert!(!fixed.contains("\n\n\n"));
        assert!(!fixed.starts_with('🌸'));
    }

    #[test]
    fn test_description_without_markers_gets_intro_only() {
        let fixed = fix_description("Just some text", "Polymer Clay Hoops");
        assert!(fixed.starts_with("Handmade polymer clay hoops crafted"));
        assert!(fixed.ends_with("fast delivery across Europe"));
        assert!(!fixed.contains("Just some text"));
    }

    #[test]
    fn test_custom_markers() {
        let markers = DescriptionMarkers::new(r"# Colours:", r"# Why:", '#').unwrap();
        let original = "# Colours: Mint\n# Why:\n- nice\n# Size: small";
        let fixed = fix_description_with(original, "Polymer Clay Studs", &markers);
        assert!(fixed.contains("feature mint tones"));
        assert!(fixed.contains("# Colours: Mint\n# Size: small"));
        assert!(!fixed.contains("- nice"));
    }
}
