use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another instance of the application has locked the database
    #[error("Another instance appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5): database is locked
        // SQLITE_LOCKED (6): database table is locked
        // SQLITE_CANTOPEN (14): unable to open database file
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }
}

// ============================================================================
// Entry Relation Kinds
// ============================================================================

/// Kind discriminator for the `entry_related` table.
///
/// Each kind is an independent denormalized mapping from entry id to one
/// auxiliary attribute, stored separately from the entry record itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryRelatedKind {
    /// Entry id -> read flag ("1" / "true" means read)
    Read,
    /// Entry id -> owning feed id
    FeedId,
    /// Entry id -> collection membership marker (e.g. "starred")
    Collection,
}

impl EntryRelatedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryRelatedKind::Read => "read",
            EntryRelatedKind::FeedId => "feed_id",
            EntryRelatedKind::Collection => "collection",
        }
    }
}

impl std::fmt::Display for EntryRelatedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// Feed metadata as persisted locally.
///
/// Ids are opaque strings assigned by the sync backend; this layer never
/// interprets them beyond identity.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FeedRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    pub site_url: Option<String>,
    pub image: Option<String>,
}

/// A user's subscription to a feed.
///
/// Keyed by feed id; `view` is the client's preferred rendering mode for
/// the feed (list, card, ...), persisted as a small integer.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SubscriptionRecord {
    pub feed_id: String,
    pub title: Option<String>,
    pub category: Option<String>,
    pub view: i64,
}

/// An entry (article) as persisted locally.
///
/// Note: the owning feed is NOT a column here — that relation lives in the
/// `entry_related` table under [`EntryRelatedKind::FeedId`], mirroring the
/// denormalized layout the sync layer writes.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EntryRecord {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub author: Option<String>,
    pub published: Option<i64>,
    pub inserted_at: i64,
}
