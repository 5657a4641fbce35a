use std::collections::HashMap;
use std::sync::RwLock;

use crate::storage::SubscriptionRecord;

/// In-memory observable container for subscriptions, keyed by feed id.
///
/// No cross-referencing against the feed store happens here; subscriptions
/// are handed over wholesale.
#[derive(Default)]
pub struct SubscriptionStore {
    inner: RwLock<HashMap<String, SubscriptionRecord>>,
}

impl SubscriptionStore {
    /// Merge a batch of subscriptions into the store.
    pub fn upsert_many(&self, subscriptions: Vec<SubscriptionRecord>) {
        let mut inner = self
            .inner
            .write()
            .expect("subscription store lock poisoned");
        for sub in subscriptions {
            inner.insert(sub.feed_id.clone(), sub);
        }
    }

    pub fn get(&self, feed_id: &str) -> Option<SubscriptionRecord> {
        self.inner
            .read()
            .expect("subscription store lock poisoned")
            .get(feed_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .expect("subscription store lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::SubscriptionStore;
    use crate::storage::SubscriptionRecord;

    fn sub(feed_id: &str) -> SubscriptionRecord {
        SubscriptionRecord {
            feed_id: feed_id.to_string(),
            title: None,
            category: None,
            view: 0,
        }
    }

    #[test]
    fn test_upsert_many() {
        let store = SubscriptionStore::default();
        store.upsert_many(vec![sub("f1"), sub("f2")]);
        assert_eq!(store.len(), 2);
        assert!(store.get("f1").is_some());
        assert!(store.get("f3").is_none());
    }
}
