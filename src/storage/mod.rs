mod entries;
mod feeds;
mod schema;
mod subscriptions;
mod types;
mod unread;

pub use schema::Database;
pub use types::{DatabaseError, EntryRecord, EntryRelatedKind, FeedRecord, SubscriptionRecord};
