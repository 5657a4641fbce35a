use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::storage::FeedRecord;

/// In-memory observable container for feeds, keyed by feed id.
///
/// Feeds are stored behind `Arc` so the entry store and the id -> feed
/// mapping handed to the entry joiner share them without deep clones.
#[derive(Default)]
pub struct FeedStore {
    inner: RwLock<HashMap<String, Arc<FeedRecord>>>,
}

impl FeedStore {
    /// Merge a batch of feeds into the store, replacing records with the
    /// same id.
    pub fn upsert_many(&self, feeds: Vec<FeedRecord>) {
        let mut inner = self.inner.write().expect("feed store lock poisoned");
        for feed in feeds {
            inner.insert(feed.id.clone(), Arc::new(feed));
        }
    }

    /// Snapshot of the current id -> feed mapping.
    ///
    /// This is what the entry joiner consumes, read back from the store
    /// (not from the raw read result) so any merging the store performed
    /// is reflected.
    pub fn feed_map(&self) -> HashMap<String, Arc<FeedRecord>> {
        self.inner.read().expect("feed store lock poisoned").clone()
    }

    pub fn get(&self, id: &str) -> Option<Arc<FeedRecord>> {
        self.inner
            .read()
            .expect("feed store lock poisoned")
            .get(id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("feed store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
