use anyhow::Result;
use std::collections::HashMap;

use super::schema::Database;

impl Database {
    // ========================================================================
    // Unread Count Operations
    // ========================================================================

    /// Get all per-feed unread counts as a feed-id -> count mapping.
    pub async fn get_all_unread(&self) -> Result<HashMap<String, i64>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT feed_id, count FROM feed_unread")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().collect())
    }

    /// Set the unread count for a single feed.
    pub async fn set_unread(&self, feed_id: &str, count: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO feed_unread (feed_id, count)
            VALUES (?, ?)
            ON CONFLICT(feed_id) DO UPDATE SET count = excluded.count
        "#,
        )
        .bind(feed_id)
        .bind(count)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::Database;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_get_all_unread_empty() {
        let db = test_db().await;
        assert!(db.get_all_unread().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_and_get_unread() {
        let db = test_db().await;
        db.set_unread("feed-1", 3).await.unwrap();
        db.set_unread("feed-2", 0).await.unwrap();

        let unread = db.get_all_unread().await.unwrap();
        assert_eq!(unread.len(), 2);
        assert_eq!(unread.get("feed-1"), Some(&3));
        assert_eq!(unread.get("feed-2"), Some(&0));
    }

    #[tokio::test]
    async fn test_set_unread_replaces_count() {
        let db = test_db().await;
        db.set_unread("feed-1", 3).await.unwrap();
        db.set_unread("feed-1", 7).await.unwrap();

        let unread = db.get_all_unread().await.unwrap();
        assert_eq!(unread.get("feed-1"), Some(&7));
    }
}
