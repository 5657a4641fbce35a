use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory observable container for per-feed unread counts.
#[derive(Default)]
pub struct UnreadStore {
    counts: RwLock<HashMap<String, i64>>,
}

impl UnreadStore {
    /// Replace the store's state wholesale with the given mapping.
    ///
    /// Unlike the feed/subscription stores this is not a merge: hydration
    /// owns the full unread picture at startup.
    pub fn hydrate(&self, counts: HashMap<String, i64>) {
        *self.counts.write().expect("unread store lock poisoned") = counts;
    }

    pub fn get(&self, feed_id: &str) -> i64 {
        self.counts
            .read()
            .expect("unread store lock poisoned")
            .get(feed_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.read().expect("unread store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
