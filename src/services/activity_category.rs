//! Picks a photo category for an activity from its free-text fields.
//!
//! Rules are checked top to bottom and the first match wins, so more specific
//! categories sit above broader ones.

pub const DEFAULT_CATEGORY: &str = "landmark";

pub struct CategoryRule {
    pub category: &'static str,
    keywords: &'static [&'static str],
}

impl CategoryRule {
    pub fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|keyword| text.contains(keyword))
    }
}

pub const RULES: &[CategoryRule] = &[
    CategoryRule { category: "spa", keywords: &[" spa ", "massage", "wellness", "thermal"] },
    CategoryRule { category: "beach", keywords: &["beach", "coast", "snorkel", "surf", "island"] },
    CategoryRule { category: "cruise", keywords: &["cruise", "yacht", "boat", "sail", "ferry"] },
    CategoryRule { category: "museum", keywords: &["museum", "gallery", "exhibition", "art "] },
    CategoryRule { category: "temple", keywords: &["temple", "church", "cathedral", "mosque", "shrine", "monastery"] },
    CategoryRule { category: "nightlife", keywords: &["bar", "club", "cocktail", "pub", "live music", "jazz"] },
    CategoryRule { category: "food", keywords: &["restaurant", "food", "lunch", "dinner", "breakfast", "cafe", "tasting", "cooking", "market"] },
    CategoryRule { category: "shopping", keywords: &["shopping", "bazaar", "boutique", "mall", "arcade"] },
    CategoryRule { category: "nature", keywords: &["park", "garden", "hike", "trek", "waterfall", "lake", "forest", "viewpoint", "sunset"] },
    CategoryRule { category: "adventure", keywords: &["safari", "rafting", "zipline", "paraglid", "dive", "bike", "kayak"] },
];

/// Category for an activity; falls back to [`DEFAULT_CATEGORY`].
pub fn categorize(name: &str, venue: &str, description: &str) -> &'static str {
    let text = format!(" {} {} {} ", name, venue, description).to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.matches(&text))
        .map(|rule| rule.category)
        .unwrap_or(DEFAULT_CATEGORY)
}
