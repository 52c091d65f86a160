use crate::models::ShortLink;
use crate::storage::{CoreStore, RelationalExtras, StorageError, StorageResult};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, PgPool};
use std::sync::Arc;

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    /// Build the pool without connecting; the first connection is made in `start`.
    pub fn new(database_url: &str, max_connections: u32) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(database_url)?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    async fn migrate(&self) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("CREATE SCHEMA IF NOT EXISTS shortener")
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS shortener.urls (
                short_url TEXT PRIMARY KEY,
                url TEXT NOT NULL UNIQUE,
                user_id TEXT,
                is_deleted BOOLEAN NOT NULL DEFAULT FALSE
            )
            "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_urls_user_id ON shortener.urls(user_id)")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl CoreStore for PostgresStorage {
    async fn start(&self) -> StorageResult<()> {
        self.migrate().await?;
        tracing::info!("PostgreSQL schema ready");
        Ok(())
    }

    async fn stop(&self) -> StorageResult<()> {
        self.pool.close().await;
        tracing::info!("PostgreSQL pool closed");
        Ok(())
    }

    async fn put(
        &self,
        short_code: &str,
        original_url: &str,
        user_id: &str,
    ) -> StorageResult<String> {
        // The no-op update makes RETURNING yield the existing row on conflict
        let stored = sqlx::query_scalar::<_, String>(
            r#"
            INSERT INTO shortener.urls (short_url, url, user_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (url) DO UPDATE SET url = EXCLUDED.url
            RETURNING short_url
            "#,
        )
        .bind(short_code)
        .bind(original_url)
        .bind((!user_id.is_empty()).then_some(user_id))
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(stored)
    }

    async fn get(&self, short_code: &str) -> StorageResult<(String, bool)> {
        let row = sqlx::query_as::<_, (String, bool)>(
            r#"
            SELECT url, is_deleted
            FROM shortener.urls
            WHERE short_url = $1
            "#,
        )
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.ok_or(StorageError::NotFound)
    }

    async fn count(&self) -> StorageResult<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shortener.urls")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count.max(0) as u64)
    }

    async fn list_by_owner(&self, user_id: &str) -> StorageResult<Vec<ShortLink>> {
        let links = sqlx::query_as::<_, ShortLink>(
            r#"
            SELECT short_url, url AS original_url, user_id, is_deleted
            FROM shortener.urls
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(links)
    }
}

#[async_trait]
impl RelationalExtras for PostgresStorage {
    async fn ping(&self) -> StorageResult<()> {
        let mut conn = self.pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }

    async fn soft_delete(&self, short_codes: &[String], user_id: &str) -> StorageResult<u64> {
        if short_codes.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE shortener.urls
            SET is_deleted = TRUE
            WHERE short_url = ANY($1) AND user_id = $2
            "#,
        )
        .bind(short_codes)
        .bind(user_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }
}
