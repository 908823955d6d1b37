//! # Index Layer: Derived Relations
//!
//! The store keeps three many-to-many relations and one aggregate counter
//! next to the canonical collections:
//!
//! | Index | Key | Members |
//! |-------|-----|---------|
//! | likes | track id | viewer ids |
//! | bookmarks | track id | viewer ids |
//! | comment likes | comment id | viewer ids |
//! | plays | track id | integer count |
//!
//! Membership is held in ordered sets ([`SetIndex`]) so that the serialized
//! form is deterministic: keys ascend, and each key's values ascend.
//! Empty sets are pruned as soon as the last member leaves, so
//! `count(key) == 0` and "key absent" mean the same thing.
//!
//! The index types know nothing about tracks or comments. Checking that a
//! key refers to an existing record happens in the store *before* an index
//! is touched.
//!
//! ## Wire Format
//!
//! Set indexes serialize as an ordered adjacency list of [`IndexEntry`]
//! (`{key, values: [...]}`); the play counter as a list of [`PlayEntry`]
//! (`{key, count}`). [`SetIndex::from_entries`] accepts entries in any order
//! and merges repeated keys.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One key of a set index in its serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub key: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// One key of the play counter in its serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayEntry {
    pub key: String,
    pub count: u64,
}

/// Key → set of member ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetIndex {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl SetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership of `member` under `key`. Returns the new membership.
    pub fn toggle(&mut self, key: &str, member: &str) -> bool {
        let set = self.entries.entry(key.to_string()).or_default();
        if set.remove(member) {
            if set.is_empty() {
                self.entries.remove(key);
            }
            false
        } else {
            set.insert(member.to_string());
            true
        }
    }

    pub fn contains(&self, key: &str, member: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|set| set.contains(member))
    }

    /// Cardinality of the set under `key`.
    pub fn count(&self, key: &str) -> usize {
        self.entries.get(key).map_or(0, BTreeSet::len)
    }

    pub fn members(&self, key: &str) -> impl Iterator<Item = &str> {
        self.entries
            .get(key)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Keys whose set contains `member`, in key order.
    pub fn keys_with_member<'a>(&'a self, member: &'a str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |(_, set)| set.contains(member))
            .map(|(key, _)| key.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Drops the whole set under `key`. Returns how many members it held.
    pub fn remove_key(&mut self, key: &str) -> usize {
        self.entries.remove(key).map_or(0, |set| set.len())
    }

    /// Keeps only the keys accepted by `keep`. Returns the number of keys dropped.
    pub fn retain_keys<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|key, _| keep(key));
        before - self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn to_entries(&self) -> Vec<IndexEntry> {
        self.entries
            .iter()
            .map(|(key, set)| IndexEntry {
                key: key.clone(),
                values: set.iter().cloned().collect(),
            })
            .collect()
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = IndexEntry>,
    {
        let mut index = Self::new();
        for entry in entries {
            if entry.values.is_empty() {
                continue;
            }
            index
                .entries
                .entry(entry.key)
                .or_default()
                .extend(entry.values);
        }
        index
    }
}

/// Key → aggregate play count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayIndex {
    counts: BTreeMap<String, u64>,
}

impl PlayIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one play and returns the new total.
    pub fn increment(&mut self, key: &str) -> u64 {
        let count = self.counts.entry(key.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn remove(&mut self, key: &str) -> Option<u64> {
        self.counts.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.counts.contains_key(key)
    }

    pub fn retain_keys<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let before = self.counts.len();
        self.counts.retain(|key, _| keep(key));
        before - self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn to_entries(&self) -> Vec<PlayEntry> {
        self.counts
            .iter()
            .map(|(key, count)| PlayEntry {
                key: key.clone(),
                count: *count,
            })
            .collect()
    }

    /// Rebuilds the counter. Repeated keys are summed; zero counts are dropped.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = PlayEntry>,
    {
        let mut index = Self::new();
        for entry in entries {
            if entry.count == 0 {
                continue;
            }
            let count = index.counts.entry(entry.key).or_insert(0);
            *count = count.saturating_add(entry.count);
        }
        index
    }
}
