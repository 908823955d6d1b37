//! Tag support for tracks.
//!
//! Tags are free-form labels stored on each track exactly as the uploader
//! typed them. The store keeps a derived frequency table, the *top tags
//! cache*, which is recomputed whenever any track's tag list changes
//! (create, tag update, delete, load from a legacy blob).
//!
//! ## Normalization
//!
//! Counting goes through [`normalize_tag`]: trim surrounding whitespace and
//! lowercase. `"ASMR"`, `"asmr"` and `" Asmr "` all count as `asmr`.
//!
//! ## Ordering
//!
//! [`count_tags`] sorts by count descending; equal counts are ordered by tag
//! name ascending so the output never depends on hash or insertion order.
//! A tag listed twice on the same track (after normalization) counts once
//! for that track.
//!
//! ## Validation
//!
//! See [`validation`] for what a tag may contain.

pub mod validation;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub use validation::{validate_tag, validate_tags, TagValidationError};

/// One row of the top tags cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

impl TagCount {
    pub fn new(tag: impl Into<String>, count: usize) -> Self {
        Self {
            tag: tag.into(),
            count,
        }
    }
}

/// Trims and lowercases a tag. Returns `None` for tags that are blank.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Counts normalized tags across tag lists (one list per track) and returns
/// the full frequency table, sorted.
pub fn count_tags<'a, I>(tag_lists: I) -> Vec<TagCount>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();

    for tags in tag_lists {
        let unique: BTreeSet<String> = tags.iter().filter_map(|t| normalize_tag(t)).collect();
        for tag in unique {
            *counts.entry(tag).or_insert(0) += 1;
        }
    }

    let mut table: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount { tag, count })
        .collect();
    // BTreeMap iteration already gives name order; the sort is stable.
    table.sort_by(|a, b| b.count.cmp(&a.count));
    table
}

/// The first `limit` rows of a sorted frequency table.
pub fn top(table: &[TagCount], limit: usize) -> Vec<TagCount> {
    table.iter().take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lists(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|l| l.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag(" Female "), Some("female".to_string()));
        assert_eq!(normalize_tag("   "), None);
    }

    #[test]
    fn test_count_collapses_case_and_whitespace() {
        let data = lists(&[&["ASMR", "Female"], &["asmr", " Female "]]);
        let table = count_tags(data.iter().map(|v| v.as_slice()));
        assert_eq!(
            table,
            vec![TagCount::new("asmr", 2), TagCount::new("female", 2)]
        );
    }

    #[test]
    fn test_ties_break_by_name() {
        let data = lists(&[&["zen", "rain", "birds"], &["rain"]]);
        let table = count_tags(data.iter().map(|v| v.as_slice()));
        let names: Vec<&str> = table.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(names, vec!["rain", "birds", "zen"]);
    }

    #[test]
    fn test_duplicate_tag_on_one_track_counts_once() {
        let data = lists(&[&["Rain", "rain ", "RAIN"]]);
        let table = count_tags(data.iter().map(|v| v.as_slice()));
        assert_eq!(table, vec![TagCount::new("rain", 1)]);
    }

    #[test]
    fn test_top_respects_limit() {
        let data = lists(&[&["a", "b", "c", "d"]]);
        let table = count_tags(data.iter().map(|v| v.as_slice()));
        assert_eq!(top(&table, 2).len(), 2);
        assert_eq!(top(&table, 10).len(), 4);
        assert!(top(&table, 0).is_empty());
    }
}
