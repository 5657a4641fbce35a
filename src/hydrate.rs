//! Startup hydration: copy persisted local records into the in-memory
//! reactive stores so the UI can render before any network sync runs.
//!
//! The whole pass races a fixed timeout. Losing the race does not cancel
//! the underlying reads; they keep running and still populate the stores
//! when they finish. Callers therefore must not assume all data is present
//! just because [`Hydrator::run`] returned.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::HydrateConfig;
use crate::storage::{
    Database, EntryRecord, EntryRelatedKind, FeedRecord, SubscriptionRecord,
};
use crate::store::{CombinedEntry, Stores};

/// Default budget for the hydration race.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

// ============================================================================
// Hydrated Flag
// ============================================================================

/// Shared handle to the "stores are hydrated" flag.
///
/// Downstream persistence uses this to decide whether writing back to the
/// local database is safe yet. Default is false; only an in-time, fully
/// successful hydration pass sets it true. External collaborators (e.g. a
/// "disable local database" setting) may set it at will.
#[derive(Clone, Default)]
pub struct HydratedFlag {
    inner: Arc<AtomicBool>,
}

impl HydratedFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: bool) {
        self.inner.store(value, Ordering::SeqCst);
    }

    pub fn get(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Record Reader
// ============================================================================

/// Bulk-read interface the hydrator consumes from the local record store.
///
/// [`Database`] is the production implementor; tests substitute readers
/// that inject latency or failures.
#[async_trait]
pub trait RecordReader: Send + Sync + 'static {
    async fn find_all_feeds(&self) -> Result<Vec<FeedRecord>>;
    async fn find_all_subscriptions(&self) -> Result<Vec<SubscriptionRecord>>;
    async fn get_all_unread(&self) -> Result<HashMap<String, i64>>;
    async fn find_all_entries(&self) -> Result<Vec<EntryRecord>>;
    async fn find_all_entry_related(
        &self,
        kind: EntryRelatedKind,
    ) -> Result<HashMap<String, String>>;
}

#[async_trait]
impl RecordReader for Database {
    async fn find_all_feeds(&self) -> Result<Vec<FeedRecord>> {
        Database::find_all_feeds(self).await
    }

    async fn find_all_subscriptions(&self) -> Result<Vec<SubscriptionRecord>> {
        Database::find_all_subscriptions(self).await
    }

    async fn get_all_unread(&self) -> Result<HashMap<String, i64>> {
        Database::get_all_unread(self).await
    }

    async fn find_all_entries(&self) -> Result<Vec<EntryRecord>> {
        Database::find_all_entries(self).await
    }

    async fn find_all_entry_related(
        &self,
        kind: EntryRelatedKind,
    ) -> Result<HashMap<String, String>> {
        Database::find_all_entry_related(self, kind).await
    }
}

// ============================================================================
// Outcome & Report
// ============================================================================

/// Which loader a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loader {
    Feeds,
    Subscriptions,
    Unread,
    Entries,
}

#[derive(Debug)]
pub struct LoaderError {
    pub loader: Loader,
    pub message: String,
}

/// Per-loader results of one hydration pass.
///
/// A failed read is recorded here instead of aborting the pass, so one
/// bad table still leaves the other stores hydrated.
#[derive(Debug, Default)]
pub struct HydrationReport {
    pub feeds: usize,
    pub subscriptions: usize,
    pub unread: usize,
    pub entries: usize,
    /// Entries skipped for a missing or dangling feed relation.
    pub dropped_entries: usize,
    pub errors: Vec<LoaderError>,
}

impl HydrationReport {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    fn push_error(&mut self, loader: Loader, err: &anyhow::Error) {
        warn!(?loader, error = %err, "hydration loader failed");
        self.errors.push(LoaderError {
            loader,
            message: err.to_string(),
        });
    }
}

/// How [`Hydrator::run`] resolved.
#[derive(Debug)]
pub enum HydrationOutcome {
    /// The pass finished within the timeout.
    Completed(HydrationReport),
    /// The timer won the race. The pass keeps running in the background
    /// and will still mutate the stores, but never sets the hydrated flag.
    TimedOut,
    /// The local database is disabled in config; nothing was read.
    Skipped,
}

// ============================================================================
// Hydrator
// ============================================================================

/// One-shot startup coordinator: fans out bulk reads, joins entries with
/// their feeds, and populates the reactive stores, bounded by a timeout.
pub struct Hydrator<R: RecordReader> {
    reader: Arc<R>,
    stores: Arc<Stores>,
    flag: HydratedFlag,
    timeout: Duration,
    enabled: bool,
}

impl<R: RecordReader> Hydrator<R> {
    pub fn new(reader: Arc<R>, stores: Arc<Stores>, flag: HydratedFlag) -> Self {
        Self {
            reader,
            stores,
            flag,
            timeout: DEFAULT_TIMEOUT,
            enabled: true,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Apply `hydrate_timeout_ms` and `local_database` from config.
    pub fn with_config(mut self, config: &HydrateConfig) -> Self {
        self.timeout = config.timeout();
        self.enabled = config.local_database;
        self
    }

    /// Run the hydration pass, racing it against the configured timeout.
    ///
    /// Resolves `TimedOut` (not an error) when the timer wins. The only
    /// error path is a panicked hydration task.
    pub async fn run(&self) -> Result<HydrationOutcome> {
        if !self.enabled {
            info!("local database disabled, skipping hydration");
            return Ok(HydrationOutcome::Skipped);
        }

        info!("hydrating local database into stores");
        let started = Instant::now();

        // The pass runs as its own task so a timeout only abandons the
        // await, not the work: late reads still land in the stores.
        let timed_out = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(hydrate_pass(
            Arc::clone(&self.reader),
            Arc::clone(&self.stores),
            self.flag.clone(),
            Arc::clone(&timed_out),
        ));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(joined) => {
                let report = joined?;
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    feeds = report.feeds,
                    subscriptions = report.subscriptions,
                    unread = report.unread,
                    entries = report.entries,
                    dropped = report.dropped_entries,
                    "hydration complete"
                );
                Ok(HydrationOutcome::Completed(report))
            }
            Err(_) => {
                // Marker is set before returning so the task, whenever it
                // finishes, knows not to claim the hydrated flag.
                timed_out.store(true, Ordering::SeqCst);
                info!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "hydration timed out, reads continue in the background"
                );
                Ok(HydrationOutcome::TimedOut)
            }
        }
    }
}

// ============================================================================
// Hydration pass
// ============================================================================

async fn hydrate_pass<R: RecordReader>(
    reader: Arc<R>,
    stores: Arc<Stores>,
    flag: HydratedFlag,
    timed_out: Arc<AtomicBool>,
) -> HydrationReport {
    let mut report = HydrationReport::default();

    // Feed, subscription, and unread loads are independent; entry hydration
    // waits only on the feed map, never on the other two.
    let (feeds, subscriptions, unread) = tokio::join!(
        hydrate_feeds(&*reader, &stores),
        hydrate_subscriptions(&*reader, &stores),
        hydrate_unread(&*reader, &stores),
    );

    let feed_map = match feeds {
        Ok(map) => {
            report.feeds = map.len();
            Some(map)
        }
        Err(e) => {
            report.push_error(Loader::Feeds, &e);
            None
        }
    };
    match subscriptions {
        Ok(count) => report.subscriptions = count,
        Err(e) => report.push_error(Loader::Subscriptions, &e),
    }
    match unread {
        Ok(count) => report.unread = count,
        Err(e) => report.push_error(Loader::Unread, &e),
    }

    match feed_map {
        Some(map) => match hydrate_entries(&*reader, &stores, &map).await {
            Ok(stats) => {
                report.entries = stats.joined;
                report.dropped_entries = stats.dropped;
            }
            Err(e) => report.push_error(Loader::Entries, &e),
        },
        // No feed map means no way to resolve entry relations.
        None => report.errors.push(LoaderError {
            loader: Loader::Entries,
            message: "skipped: feed hydration failed".to_string(),
        }),
    }

    if report.is_complete() && !timed_out.load(Ordering::SeqCst) {
        flag.set(true);
    }

    report
}

async fn hydrate_feeds<R: RecordReader + ?Sized>(
    reader: &R,
    stores: &Stores,
) -> Result<HashMap<String, Arc<FeedRecord>>> {
    let feeds = reader.find_all_feeds().await?;
    stores.feeds.upsert_many(feeds);
    Ok(stores.feeds.feed_map())
}

async fn hydrate_subscriptions<R: RecordReader + ?Sized>(
    reader: &R,
    stores: &Stores,
) -> Result<usize> {
    let subscriptions = reader.find_all_subscriptions().await?;
    let count = subscriptions.len();
    stores.subscriptions.upsert_many(subscriptions);
    Ok(count)
}

async fn hydrate_unread<R: RecordReader + ?Sized>(reader: &R, stores: &Stores) -> Result<usize> {
    let unread = reader.get_all_unread().await?;
    let count = unread.len();
    stores.unread.hydrate(unread);
    Ok(count)
}

struct EntryStats {
    joined: usize,
    dropped: usize,
}

async fn hydrate_entries<R: RecordReader + ?Sized>(
    reader: &R,
    stores: &Stores,
    feed_map: &HashMap<String, Arc<FeedRecord>>,
) -> Result<EntryStats> {
    let (entries, read, feed_ids, collections) = tokio::try_join!(
        reader.find_all_entries(),
        reader.find_all_entry_related(EntryRelatedKind::Read),
        reader.find_all_entry_related(EntryRelatedKind::FeedId),
        reader.find_all_entry_related(EntryRelatedKind::Collection),
    )?;

    let (batch, dropped) = join_entries(feed_map, entries, &read, &feed_ids, &collections);
    let joined = batch.len();

    // One bulk upsert per pass, then the starred-id set is replaced with
    // the full collection key set. An id dropped during the join for a
    // missing feed still counts as starred here; kept as observed.
    stores.entries.upsert_many(batch);
    stores
        .entries
        .set_star_ids(collections.keys().cloned().collect::<HashSet<_>>());

    Ok(EntryStats { joined, dropped })
}

// ============================================================================
// Entry join
// ============================================================================

/// Join entries with their relation tables and the resolved feed map.
///
/// Entries with no feed-id relation, or whose relation points at an
/// unknown feed, are dropped and logged; they never reach the store with
/// a placeholder feed. Returns the ordered batch and the drop count.
fn join_entries(
    feed_map: &HashMap<String, Arc<FeedRecord>>,
    entries: Vec<EntryRecord>,
    read: &HashMap<String, String>,
    feed_ids: &HashMap<String, String>,
    collections: &HashMap<String, String>,
) -> (Vec<CombinedEntry>, usize) {
    let mut batch = Vec::with_capacity(entries.len());
    let mut dropped = 0;

    for entry in entries {
        let Some(feed_id) = feed_ids.get(&entry.id) else {
            log_hydrate_error(&format!("Entry {} has no related feed id", entry.id));
            dropped += 1;
            continue;
        };
        let Some(feed) = feed_map.get(feed_id) else {
            log_hydrate_error(&format!("Entry related feed {} is missing", feed_id));
            dropped += 1;
            continue;
        };

        batch.push(CombinedEntry {
            read: is_read(read.get(&entry.id)),
            collection: collections.get(&entry.id).cloned(),
            feed: Arc::clone(feed),
            entry,
        });
    }

    (batch, dropped)
}

/// Read relation values are opaque TEXT; absence means unread.
fn is_read(value: Option<&String>) -> bool {
    matches!(value.map(String::as_str), Some("1") | Some("true"))
}

fn log_hydrate_error(message: &str) {
    // Framed as a data-integrity notice, not a transient failure.
    debug!("Hydrate error: {}, maybe local database data is dirty.", message);
}

// ============================================================================
// Tests
// ============================================================================
