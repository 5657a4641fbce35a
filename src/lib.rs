//! Local-store hydration layer for an offline-first RSS client.
//!
//! At startup the client should render from whatever it already has on
//! disk instead of waiting on the network. This crate does that one job:
//! it bulk-reads persisted feeds, subscriptions, unread counts, entries,
//! and entry relations from SQLite and pushes them into in-memory
//! reactive stores, bounded by a timeout so a slow database never blocks
//! launch.
//!
//! ```no_run
//! use std::sync::Arc;
//! use riffle::storage::Database;
//! use riffle::store::Stores;
//! use riffle::{HydratedFlag, Hydrator};
//!
//! # async fn start() -> anyhow::Result<()> {
//! let db = Arc::new(Database::open("local.db").await?);
//! let stores = Arc::new(Stores::new());
//! let flag = HydratedFlag::new();
//!
//! let outcome = Hydrator::new(db, Arc::clone(&stores), flag.clone())
//!     .run()
//!     .await?;
//! if flag.get() {
//!     // stores are fully hydrated; local persistence may resume
//! }
//! # let _ = outcome;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod hydrate;
pub mod storage;
pub mod store;

pub use config::HydrateConfig;
pub use hydrate::{
    HydratedFlag, HydrationOutcome, HydrationReport, Hydrator, Loader, LoaderError, RecordReader,
};
