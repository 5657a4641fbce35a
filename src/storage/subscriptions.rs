use anyhow::Result;
use sqlx::QueryBuilder;

use super::schema::Database;
use super::types::SubscriptionRecord;

impl Database {
    // ========================================================================
    // Subscription Operations
    // ========================================================================

    /// Find all locally persisted subscriptions.
    pub async fn find_all_subscriptions(&self) -> Result<Vec<SubscriptionRecord>> {
        let subscriptions = sqlx::query_as::<_, SubscriptionRecord>(
            r#"
            SELECT feed_id, title, category, view
            FROM subscriptions
            ORDER BY feed_id
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(subscriptions)
    }

    /// Upsert subscriptions in chunks of 100.
    pub async fn upsert_subscriptions(&self, subscriptions: &[SubscriptionRecord]) -> Result<()> {
        if subscriptions.is_empty() {
            return Ok(());
        }

        const BATCH_SIZE: usize = 100;
        let mut tx = self.pool.begin().await?;

        for chunk in subscriptions.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<sqlx::Sqlite> =
                QueryBuilder::new("INSERT INTO subscriptions (feed_id, title, category, view) ");

            builder.push_values(chunk, |mut b, sub| {
                b.push_bind(&sub.feed_id)
                    .push_bind(&sub.title)
                    .push_bind(&sub.category)
                    .push_bind(sub.view);
            });

            builder.push(
                " ON CONFLICT(feed_id) DO UPDATE SET title = excluded.title, \
                 category = excluded.category, view = excluded.view",
            );

            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
