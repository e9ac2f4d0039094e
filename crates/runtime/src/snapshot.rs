//! Processor state and published snapshots

use resource::{Entry, ResourceKey};
use std::collections::BTreeMap;

/// Immutable view of every known entry at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    /// Strictly increasing per processor run
    pub version: u64,

    /// Entries ordered by key
    pub entries: BTreeMap<ResourceKey, Entry<T>>,
}

impl<T> Snapshot<T> {
    /// Entry for `key`, if present
    pub fn get(&self, key: &ResourceKey) -> Option<&Entry<T>> {
        self.entries.get(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Mutable entry set maintained by the processor.
///
/// Every mutator reports whether anything changed, so the caller only
/// publishes when there is something new to publish.
#[derive(Debug)]
pub struct State<T> {
    entries: BTreeMap<ResourceKey, Entry<T>>,
    synced: bool,
    version: u64,
}

impl<T> Default for State<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            synced: false,
            version: 0,
        }
    }
}

impl<T: Clone> State<T> {
    /// Empty, unsynced state
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry; unchanged if the version is the same
    pub fn upsert(&mut self, entry: Entry<T>) -> bool {
        let key = entry.id.key().clone();
        if let Some(existing) = self.entries.get(&key) {
            if existing.id.version() == entry.id.version() {
                return false;
            }
        }
        self.entries.insert(key, entry);
        true
    }

    /// Remove an entry
    pub fn remove(&mut self, key: &ResourceKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Record that the initial listing is complete
    pub fn mark_synced(&mut self) -> bool {
        !std::mem::replace(&mut self.synced, true)
    }

    /// Whether the initial listing has completed
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the current entries under the next snapshot version
    pub fn snapshot(&mut self) -> Snapshot<T> {
        self.version += 1;
        Snapshot {
            version: self.version,
            entries: self.entries.clone(),
        }
    }
}
