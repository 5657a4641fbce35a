use anyhow::Result;
use sqlx::QueryBuilder;

use super::schema::Database;
use super::types::FeedRecord;

impl Database {
    // ========================================================================
    // Feed Operations
    // ========================================================================

    /// Find all locally persisted feeds.
    pub async fn find_all_feeds(&self) -> Result<Vec<FeedRecord>> {
        let feeds = sqlx::query_as::<_, FeedRecord>(
            r#"
            SELECT id, title, url, site_url, image
            FROM feeds
            ORDER BY id
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(feeds)
    }

    /// Upsert feeds in chunks of 100 so large sync batches stay well under
    /// SQLite's bind-parameter limit.
    pub async fn upsert_feeds(&self, feeds: &[FeedRecord]) -> Result<()> {
        if feeds.is_empty() {
            return Ok(());
        }

        const BATCH_SIZE: usize = 100;
        let mut tx = self.pool.begin().await?;

        for chunk in feeds.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<sqlx::Sqlite> =
                QueryBuilder::new("INSERT INTO feeds (id, title, url, site_url, image) ");

            builder.push_values(chunk, |mut b, feed| {
                b.push_bind(&feed.id)
                    .push_bind(&feed.title)
                    .push_bind(&feed.url)
                    .push_bind(&feed.site_url)
                    .push_bind(&feed.image);
            });

            builder.push(
                " ON CONFLICT(id) DO UPDATE SET title = excluded.title, url = excluded.url, \
                 site_url = excluded.site_url, image = excluded.image",
            );

            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
