use anyhow::Result;
use sqlx::QueryBuilder;
use std::collections::HashMap;

use super::schema::Database;
use super::types::{EntryRecord, EntryRelatedKind};

impl Database {
    // ========================================================================
    // Entry Operations
    // ========================================================================

    /// Find all locally persisted entries.
    pub async fn find_all_entries(&self) -> Result<Vec<EntryRecord>> {
        let entries = sqlx::query_as::<_, EntryRecord>(
            r#"
            SELECT id, title, url, author, published, inserted_at
            FROM entries
            ORDER BY published DESC, inserted_at DESC
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Upsert entries in chunks of 100.
    pub async fn upsert_entries(&self, entries: &[EntryRecord]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        const BATCH_SIZE: usize = 100;
        let mut tx = self.pool.begin().await?;

        for chunk in entries.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
                "INSERT INTO entries (id, title, url, author, published, inserted_at) ",
            );

            builder.push_values(chunk, |mut b, entry| {
                b.push_bind(&entry.id)
                    .push_bind(&entry.title)
                    .push_bind(&entry.url)
                    .push_bind(&entry.author)
                    .push_bind(entry.published)
                    .push_bind(entry.inserted_at);
            });

            builder.push(
                " ON CONFLICT(id) DO UPDATE SET title = excluded.title, url = excluded.url, \
                 author = excluded.author, published = excluded.published",
            );

            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // ========================================================================
    // Entry Relation Operations
    // ========================================================================

    /// Find all relation rows of one kind as an entry-id -> value mapping.
    ///
    /// Values are opaque TEXT at this layer; callers interpret them per kind
    /// (boolean for read state, feed id, collection marker).
    pub async fn find_all_entry_related(
        &self,
        kind: EntryRelatedKind,
    ) -> Result<HashMap<String, String>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT entry_id, value FROM entry_related WHERE kind = ?")
                .bind(kind.as_str())
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().collect())
    }

    /// Upsert a single relation row.
    pub async fn put_entry_related(
        &self,
        kind: EntryRelatedKind,
        entry_id: &str,
        value: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO entry_related (kind, entry_id, value)
            VALUES (?, ?, ?)
            ON CONFLICT(kind, entry_id) DO UPDATE SET value = excluded.value
        "#,
        )
        .bind(kind.as_str())
        .bind(entry_id)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
