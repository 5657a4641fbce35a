use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::storage::{EntryRecord, FeedRecord};

/// The joined, UI-ready representation of an entry: the entry record plus
/// its resolved feed, read flag, and collection marker.
///
/// Constructed fresh on every hydration pass and never persisted.
/// `collection` carries presence, not truthiness: `Some("")` still means
/// the entry belongs to a collection.
#[derive(Debug, Clone)]
pub struct CombinedEntry {
    pub entry: EntryRecord,
    pub feed: Arc<FeedRecord>,
    pub read: bool,
    pub collection: Option<String>,
}

/// In-memory observable container for combined entries plus the set of
/// starred (collected) entry ids.
#[derive(Default)]
pub struct EntryStore {
    entries: RwLock<HashMap<String, CombinedEntry>>,
    star_ids: RwLock<HashSet<String>>,
}

impl EntryStore {
    /// Merge a batch of combined entries into the store.
    ///
    /// Hydration calls this exactly once per pass with the full batch.
    pub fn upsert_many(&self, batch: Vec<CombinedEntry>) {
        let mut entries = self.entries.write().expect("entry store lock poisoned");
        for combined in batch {
            entries.insert(combined.entry.id.clone(), combined);
        }
    }

    /// Replace the starred-id set wholesale.
    pub fn set_star_ids(&self, ids: HashSet<String>) {
        *self.star_ids.write().expect("entry store lock poisoned") = ids;
    }

    pub fn get(&self, id: &str) -> Option<CombinedEntry> {
        self.entries
            .read()
            .expect("entry store lock poisoned")
            .get(id)
            .cloned()
    }

    pub fn star_ids(&self) -> HashSet<String> {
        self.star_ids
            .read()
            .expect("entry store lock poisoned")
            .clone()
    }

    pub fn is_starred(&self, id: &str) -> bool {
        self.star_ids
            .read()
            .expect("entry store lock poisoned")
            .contains(id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("entry store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
