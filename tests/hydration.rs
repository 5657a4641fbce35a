//! End-to-end hydration scenarios: seed an in-memory SQLite database,
//! run the hydrator against real stores, and check what landed where.
//!
//! Each test creates its own database for isolation. The timeout tests
//! use a reader wrapper that injects real latency, with margins wide
//! enough to be stable on slow CI machines.

use anyhow::Result;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use riffle::storage::{
    Database, EntryRecord, EntryRelatedKind, FeedRecord, SubscriptionRecord,
};
use riffle::store::Stores;
use riffle::{HydratedFlag, HydrateConfig, HydrationOutcome, Hydrator, Loader, RecordReader};

async fn test_db() -> Database {
    Database::open(":memory:").await.unwrap()
}

fn feed(id: &str) -> FeedRecord {
    FeedRecord {
        id: id.to_string(),
        title: format!("Feed {}", id),
        url: format!("https://{}.example.com/rss", id),
        site_url: None,
        image: None,
    }
}

fn entry(id: &str) -> EntryRecord {
    EntryRecord {
        id: id.to_string(),
        title: format!("Entry {}", id),
        url: Some(format!("https://example.com/{}", id)),
        author: None,
        published: Some(1704067200),
        inserted_at: 1704067200,
    }
}

fn subscription(feed_id: &str) -> SubscriptionRecord {
    SubscriptionRecord {
        feed_id: feed_id.to_string(),
        title: None,
        category: None,
        view: 0,
    }
}

struct Harness {
    db: Arc<Database>,
    stores: Arc<Stores>,
    flag: HydratedFlag,
}

impl Harness {
    async fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        Self {
            db: Arc::new(test_db().await),
            stores: Arc::new(Stores::new()),
            flag: HydratedFlag::new(),
        }
    }

    fn hydrator(&self) -> Hydrator<Database> {
        Hydrator::new(
            Arc::clone(&self.db),
            Arc::clone(&self.stores),
            self.flag.clone(),
        )
    }
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn test_full_pass_populates_all_stores() {
    let h = Harness::new().await;
    h.db.upsert_feeds(&[feed("f1"), feed("f2")]).await.unwrap();
    h.db.upsert_subscriptions(&[subscription("f1")]).await.unwrap();
    h.db.set_unread("f1", 4).await.unwrap();
    h.db.upsert_entries(&[entry("e1")]).await.unwrap();
    h.db.put_entry_related(EntryRelatedKind::FeedId, "e1", "f1")
        .await
        .unwrap();

    let outcome = h.hydrator().run().await.unwrap();

    let HydrationOutcome::Completed(report) = outcome else {
        panic!("expected completed outcome");
    };
    assert!(report.is_complete());
    assert_eq!(report.feeds, 2);
    assert_eq!(report.subscriptions, 1);
    assert_eq!(report.unread, 1);
    assert_eq!(report.entries, 1);
    assert_eq!(report.dropped_entries, 0);

    assert_eq!(h.stores.feeds.len(), 2);
    assert!(h.stores.subscriptions.get("f1").is_some());
    assert_eq!(h.stores.unread.get("f1"), 4);
    assert_eq!(h.stores.entries.len(), 1);
}

#[tokio::test]
async fn test_starred_unread_scenario() {
    // feeds=[f1], entries=[e1], feed relation e1->f1, no read relation,
    // collection relation e1->"starred"
    let h = Harness::new().await;
    h.db.upsert_feeds(&[feed("f1")]).await.unwrap();
    h.db.upsert_entries(&[entry("e1")]).await.unwrap();
    h.db.put_entry_related(EntryRelatedKind::FeedId, "e1", "f1")
        .await
        .unwrap();
    h.db.put_entry_related(EntryRelatedKind::Collection, "e1", "starred")
        .await
        .unwrap();

    h.hydrator().run().await.unwrap();

    let view = h.stores.entries.get("e1").expect("e1 should be hydrated");
    assert!(!view.read, "read defaults to false when no read relation");
    assert_eq!(view.collection.as_deref(), Some("starred"));
    assert_eq!(view.feed.id, "f1");
    assert_eq!(
        h.stores.entries.star_ids(),
        HashSet::from(["e1".to_string()])
    );
}

#[tokio::test]
async fn test_read_relation_is_applied() {
    let h = Harness::new().await;
    h.db.upsert_feeds(&[feed("f1")]).await.unwrap();
    h.db.upsert_entries(&[entry("e1"), entry("e2")]).await.unwrap();
    for id in ["e1", "e2"] {
        h.db.put_entry_related(EntryRelatedKind::FeedId, id, "f1")
            .await
            .unwrap();
    }
    h.db.put_entry_related(EntryRelatedKind::Read, "e1", "1")
        .await
        .unwrap();

    h.hydrator().run().await.unwrap();

    assert!(h.stores.entries.get("e1").unwrap().read);
    assert!(!h.stores.entries.get("e2").unwrap().read);
}

// ============================================================================
// Drop cases
// ============================================================================

#[tokio::test]
async fn test_dangling_feed_relation_drops_entry() {
    // feeds=[], entries=[e2], feed relation e2->f9 where f9 is unknown
    let h = Harness::new().await;
    h.db.upsert_entries(&[entry("e2")]).await.unwrap();
    h.db.put_entry_related(EntryRelatedKind::FeedId, "e2", "f9")
        .await
        .unwrap();

    let outcome = h.hydrator().run().await.unwrap();

    let HydrationOutcome::Completed(report) = outcome else {
        panic!("expected completed outcome");
    };
    // A dropped entry is a data-integrity diagnostic, not a loader failure
    assert!(report.is_complete());
    assert_eq!(report.dropped_entries, 1);
    assert!(h.stores.entries.is_empty());
    assert!(h.stores.entries.star_ids().is_empty());
    assert!(h.flag.get(), "drops do not prevent the flag");
}

#[tokio::test]
async fn test_missing_feed_relation_drops_entry() {
    let h = Harness::new().await;
    h.db.upsert_feeds(&[feed("f1")]).await.unwrap();
    h.db.upsert_entries(&[entry("e1"), entry("orphan")]).await.unwrap();
    h.db.put_entry_related(EntryRelatedKind::FeedId, "e1", "f1")
        .await
        .unwrap();

    h.hydrator().run().await.unwrap();

    assert_eq!(h.stores.entries.len(), 1);
    assert!(h.stores.entries.get("orphan").is_none());
}

#[tokio::test]
async fn test_star_ids_include_dropped_entries() {
    // Known asymmetry: the starred set is the collection key set, even for
    // ids whose entries were dropped during the join.
    let h = Harness::new().await;
    h.db.upsert_entries(&[entry("e2")]).await.unwrap();
    h.db.put_entry_related(EntryRelatedKind::FeedId, "e2", "f9")
        .await
        .unwrap();
    h.db.put_entry_related(EntryRelatedKind::Collection, "e2", "starred")
        .await
        .unwrap();

    h.hydrator().run().await.unwrap();

    assert!(h.stores.entries.is_empty());
    assert_eq!(
        h.stores.entries.star_ids(),
        HashSet::from(["e2".to_string()])
    );
}

// ============================================================================
// Hydrated flag
// ============================================================================

#[tokio::test]
async fn test_flag_false_before_true_after() {
    let h = Harness::new().await;
    assert!(!h.flag.get());

    h.hydrator().run().await.unwrap();
    assert!(h.flag.get());
}

#[tokio::test]
async fn test_flag_settable_externally() {
    let h = Harness::new().await;
    h.flag.set(true);
    assert!(h.flag.get());
    h.flag.set(false);
    assert!(!h.flag.get());
}

// ============================================================================
// Timeout race
// ============================================================================

/// Delegates to a real database, injecting latency into the entries read.
struct SlowReader {
    db: Database,
    delay: Duration,
}

#[async_trait]
impl RecordReader for SlowReader {
    async fn find_all_feeds(&self) -> Result<Vec<FeedRecord>> {
        self.db.find_all_feeds().await
    }

    async fn find_all_subscriptions(&self) -> Result<Vec<SubscriptionRecord>> {
        self.db.find_all_subscriptions().await
    }

    async fn get_all_unread(&self) -> Result<HashMap<String, i64>> {
        self.db.get_all_unread().await
    }

    async fn find_all_entries(&self) -> Result<Vec<EntryRecord>> {
        tokio::time::sleep(self.delay).await;
        self.db.find_all_entries().await
    }

    async fn find_all_entry_related(
        &self,
        kind: EntryRelatedKind,
    ) -> Result<HashMap<String, String>> {
        self.db.find_all_entry_related(kind).await
    }
}

#[tokio::test]
async fn test_timeout_resolves_without_cancelling_reads() {
    let db = test_db().await;
    db.upsert_feeds(&[feed("f1")]).await.unwrap();
    db.upsert_entries(&[entry("e1")]).await.unwrap();
    db.put_entry_related(EntryRelatedKind::FeedId, "e1", "f1")
        .await
        .unwrap();

    let reader = Arc::new(SlowReader {
        db,
        delay: Duration::from_millis(400),
    });
    let stores = Arc::new(Stores::new());
    let flag = HydratedFlag::new();

    let outcome = Hydrator::new(Arc::clone(&reader), Arc::clone(&stores), flag.clone())
        .with_timeout(Duration::from_millis(50))
        .run()
        .await
        .unwrap();

    assert!(matches!(outcome, HydrationOutcome::TimedOut));
    // The fast loaders already landed, the slow entry read has not
    assert_eq!(stores.feeds.len(), 1);
    assert!(stores.entries.is_empty());
    assert!(!flag.get());

    // The losing side of the race keeps running and eventually mutates
    // the store, but never claims the flag.
    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(stores.entries.len(), 1);
    assert!(!flag.get(), "timed-out pass must not set the flag");
}

#[tokio::test]
async fn test_no_timeout_when_reads_are_fast() {
    let h = Harness::new().await;
    h.db.upsert_feeds(&[feed("f1")]).await.unwrap();

    let outcome = h
        .hydrator()
        .with_timeout(Duration::from_secs(5))
        .run()
        .await
        .unwrap();

    assert!(matches!(outcome, HydrationOutcome::Completed(_)));
}

// ============================================================================
// Partial failure
// ============================================================================

/// Delegates to a real database, failing the chosen loader.
struct FailingReader {
    db: Database,
    fail: Loader,
}

#[async_trait]
impl RecordReader for FailingReader {
    async fn find_all_feeds(&self) -> Result<Vec<FeedRecord>> {
        if self.fail == Loader::Feeds {
            anyhow::bail!("feeds table is corrupt");
        }
        self.db.find_all_feeds().await
    }

    async fn find_all_subscriptions(&self) -> Result<Vec<SubscriptionRecord>> {
        if self.fail == Loader::Subscriptions {
            anyhow::bail!("subscriptions table is corrupt");
        }
        self.db.find_all_subscriptions().await
    }

    async fn get_all_unread(&self) -> Result<HashMap<String, i64>> {
        self.db.get_all_unread().await
    }

    async fn find_all_entries(&self) -> Result<Vec<EntryRecord>> {
        self.db.find_all_entries().await
    }

    async fn find_all_entry_related(
        &self,
        kind: EntryRelatedKind,
    ) -> Result<HashMap<String, String>> {
        self.db.find_all_entry_related(kind).await
    }
}

#[tokio::test]
async fn test_one_failed_loader_preserves_partial_hydration() {
    let db = test_db().await;
    db.upsert_feeds(&[feed("f1")]).await.unwrap();
    db.upsert_entries(&[entry("e1")]).await.unwrap();
    db.put_entry_related(EntryRelatedKind::FeedId, "e1", "f1")
        .await
        .unwrap();

    let reader = Arc::new(FailingReader {
        db,
        fail: Loader::Subscriptions,
    });
    let stores = Arc::new(Stores::new());
    let flag = HydratedFlag::new();

    let outcome = Hydrator::new(reader, Arc::clone(&stores), flag.clone())
        .run()
        .await
        .unwrap();

    let HydrationOutcome::Completed(report) = outcome else {
        panic!("expected completed outcome");
    };
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].loader, Loader::Subscriptions);

    // Everything else still hydrated
    assert_eq!(stores.feeds.len(), 1);
    assert_eq!(stores.entries.len(), 1);
    assert!(stores.subscriptions.is_empty());
    assert!(!flag.get(), "a partial pass is not a hydrated pass");
}

#[tokio::test]
async fn test_failed_feed_loader_skips_entry_hydration() {
    let db = test_db().await;
    db.upsert_entries(&[entry("e1")]).await.unwrap();
    db.put_entry_related(EntryRelatedKind::FeedId, "e1", "f1")
        .await
        .unwrap();

    let reader = Arc::new(FailingReader {
        db,
        fail: Loader::Feeds,
    });
    let stores = Arc::new(Stores::new());
    let flag = HydratedFlag::new();

    let outcome = Hydrator::new(reader, Arc::clone(&stores), flag.clone())
        .run()
        .await
        .unwrap();

    let HydrationOutcome::Completed(report) = outcome else {
        panic!("expected completed outcome");
    };
    let failed: Vec<Loader> = report.errors.iter().map(|e| e.loader).collect();
    assert!(failed.contains(&Loader::Feeds));
    assert!(failed.contains(&Loader::Entries));
    assert!(stores.entries.is_empty());
    assert!(!flag.get());
}

// ============================================================================
// Config
// ============================================================================

#[tokio::test]
async fn test_disabled_local_database_skips_hydration() {
    let h = Harness::new().await;
    h.db.upsert_feeds(&[feed("f1")]).await.unwrap();

    let config = HydrateConfig {
        local_database: false,
        ..HydrateConfig::default()
    };
    let outcome = h.hydrator().with_config(&config).run().await.unwrap();

    assert!(matches!(outcome, HydrationOutcome::Skipped));
    assert!(h.stores.feeds.is_empty());
    assert!(!h.flag.get());
}
