//! Insertion-ordered rule cache

use fela_utils::Change;
use std::collections::HashMap;

/// What is stored under a cache reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    /// Computed CSS, emitted exactly once when it was stored
    Change(Change),
    /// A declaration with an undefined value; renders to no class name
    Skipped,
}

impl CacheEntry {
    pub fn change(&self) -> Option<&Change> {
        match self {
            CacheEntry::Change(change) => Some(change),
            CacheEntry::Skipped => None,
        }
    }

    /// Class name of a rule entry, empty for skipped declarations
    pub fn class_name(&self) -> &str {
        match self {
            CacheEntry::Change(change) => change.class_name().unwrap_or(""),
            CacheEntry::Skipped => "",
        }
    }
}

/// Map from reference to cache entry that remembers insertion order, so
/// replays and server output follow render order
#[derive(Debug, Clone, Default)]
pub struct RuleCache {
    index: HashMap<String, usize>,
    entries: Vec<(String, CacheEntry)>,
}

impl RuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, reference: &str) -> Option<&CacheEntry> {
        self.index
            .get(reference)
            .map(|&position| &self.entries[position].1)
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.index.contains_key(reference)
    }

    /// Store an entry. An existing entry is never replaced; returns whether
    /// the entry was inserted.
    pub fn insert(&mut self, reference: String, entry: CacheEntry) -> bool {
        if self.index.contains_key(&reference) {
            return false;
        }

        self.index.insert(reference.clone(), self.entries.len());
        self.entries.push((reference, entry));
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.entries.clear();
    }

    /// Stored change records in insertion order
    pub fn changes(&self) -> impl Iterator<Item = &Change> {
        self.entries.iter().filter_map(|(_, entry)| entry.change())
    }
}
