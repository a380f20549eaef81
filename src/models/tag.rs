//! Event tags

use std::collections::HashSet;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Tags that always exist and are never counted
pub const PREDEFINED_TAGS: [&str; 8] = [
    "sports",
    "music",
    "academic",
    "social",
    "arts",
    "technology",
    "food",
    "outdoor",
];

pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

pub fn is_predefined(tag: &str) -> bool {
    let normalized = normalize_tag(tag);
    PREDEFINED_TAGS.contains(&normalized.as_str())
}

/// Normalize, drop blanks and duplicates, keep first-seen order.
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|t| normalize_tag(t.as_ref()))
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Tags containing `query` as a substring; an empty query matches everything.
pub fn filter_matching(query: &str, tags: &[String]) -> Vec<String> {
    let needle = normalize_tag(query);
    tags.iter()
        .filter(|t| needle.is_empty() || t.contains(&needle))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub name: String,
    pub usage_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

/// Difference between two normalized tag lists
pub fn diff_tags(old: &[String], new: &[String]) -> TagDiff {
    let old_set: HashSet<&String> = old.iter().collect();
    let new_set: HashSet<&String> = new.iter().collect();
    TagDiff {
        added: new.iter().filter(|t| !old_set.contains(t)).cloned().collect(),
        removed: old.iter().filter(|t| !new_set.contains(t)).cloned().collect(),
    }
}
