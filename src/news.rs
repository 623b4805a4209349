//! News feed served to the marketing pages.
//!
//! Items come from configuration and are tagged by the first category
//! whose keyword appears in the title or summary.

use serde::Serialize;

use crate::config::{NewsCategory, NewsConfig, NewsItem};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorizedItem {
    #[serde(flatten)]
    pub item: NewsItem,
    pub category: String,
}

fn keyword_hit(haystack: &str, keyword: &str) -> bool {
    let keyword = keyword.to_lowercase();
    // Whole-word match so "ai" does not fire on "maintain".
    haystack
        .match_indices(&keyword)
        .any(|(start, matched)| {
            let before = haystack[..start].chars().next_back();
            let after = haystack[start + matched.len()..].chars().next();
            !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
        })
}

/// Category for a title/summary pair.
pub fn categorize<'a>(categories: &'a [NewsCategory], default: &'a str, item: &NewsItem) -> &'a str {
    let haystack = format!("{} {}", item.title, item.summary).to_lowercase();
    categories
        .iter()
        .find(|c| c.keywords.iter().any(|k| keyword_hit(&haystack, k)))
        .map(|c| c.name.as_str())
        .unwrap_or(default)
}

/// All configured items with categories, optionally filtered
/// (case-insensitive) to one category.
pub fn categorized_items(config: &NewsConfig, filter: Option<&str>) -> Vec<CategorizedItem> {
    config
        .items
        .iter()
        .map(|item| CategorizedItem {
            category: categorize(&config.categories, &config.default_category, item).to_string(),
            item: item.clone(),
        })
        .filter(|c| filter.map_or(true, |f| c.category.eq_ignore_ascii_case(f)))
        .collect()
}
