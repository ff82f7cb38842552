use crate::models::{ApiKeyRecord, NewMapping, UrlMapping, UsageTotals, UserRecord, ViewOutcome};
use crate::storage::trait_def::unix_now;
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS urls (
                id BIGSERIAL PRIMARY KEY,
                created_utc BIGINT NOT NULL,
                expiry BIGINT,
                url TEXT NOT NULL,
                shorturl TEXT NOT NULL UNIQUE,
                views BIGINT NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at BIGINT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS api_keys (
                id BIGSERIAL PRIMARY KEY,
                key_hash TEXT NOT NULL UNIQUE,
                label TEXT,
                created_at BIGINT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn insert_mapping(&self, mapping: &NewMapping<'_>) -> StorageResult<UrlMapping> {
        let row = sqlx::query_as::<_, UrlMapping>(
            r#"
            INSERT INTO urls (created_utc, expiry, url, shorturl, views)
            VALUES ($1, $2, $3, $4, 0)
            ON CONFLICT(shorturl) DO NOTHING
            RETURNING id, created_utc, expiry, url, shorturl, views
            "#,
        )
        .bind(mapping.created_utc)
        .bind(mapping.expiry)
        .bind(mapping.source_url)
        .bind(mapping.short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.ok_or(StorageError::Conflict)
    }

    async fn get_mapping(&self, short_code: &str) -> Result<Option<UrlMapping>> {
        let url = sqlx::query_as::<_, UrlMapping>(
            r#"
            SELECT id, created_utc, expiry, url, shorturl, views
            FROM urls
            WHERE shorturl = $1
            "#,
        )
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(url)
    }

    async fn delete_mapping(&self, short_code: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM urls WHERE shorturl = $1")
            .bind(short_code)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_view(&self, short_code: &str, cutoff: i64) -> Result<ViewOutcome> {
        let mut tx = self.pool.begin().await?;

        let counted = sqlx::query_scalar::<_, String>(
            r#"
            UPDATE urls
            SET views = views + 1
            WHERE shorturl = $1 AND (expiry IS NULL OR expiry >= $2)
            RETURNING url
            "#,
        )
        .bind(short_code)
        .bind(cutoff)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(source_url) = counted {
            tx.commit().await?;
            return Ok(ViewOutcome::Counted(source_url));
        }

        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM urls WHERE shorturl = $1")
            .bind(short_code)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(if exists > 0 {
            ViewOutcome::Expired
        } else {
            ViewOutcome::Missing
        })
    }

    async fn usage_totals(&self) -> Result<UsageTotals> {
        let totals = sqlx::query_as::<_, UsageTotals>(
            r#"
            SELECT COUNT(*) AS url_count, COALESCE(SUM(views), 0)::BIGINT AS total_views
            FROM urls
            "#,
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(totals)
    }

    async fn list_mappings(&self, limit: i64, offset: i64) -> Result<Vec<UrlMapping>> {
        let urls = sqlx::query_as::<_, UrlMapping>(
            r#"
            SELECT id, created_utc, expiry, url, shorturl, views
            FROM urls
            ORDER BY created_utc DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(urls)
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> StorageResult<UserRecord> {
        let created_at = unix_now()?;

        let row = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (username, password_hash, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT(username) DO NOTHING
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(created_at)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.ok_or(StorageError::Conflict)
    }

    async fn get_user(&self, username: &str) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    async fn create_api_key(
        &self,
        key_hash: &str,
        label: Option<&str>,
    ) -> StorageResult<ApiKeyRecord> {
        let created_at = unix_now()?;

        let row = sqlx::query_as::<_, ApiKeyRecord>(
            r#"
            INSERT INTO api_keys (key_hash, label, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT(key_hash) DO NOTHING
            RETURNING id, label, created_at
            "#,
        )
        .bind(key_hash)
        .bind(label)
        .bind(created_at)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.ok_or(StorageError::Conflict)
    }

    async fn api_key_exists(&self, key_hash: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM api_keys WHERE key_hash = $1")
            .bind(key_hash)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count > 0)
    }

    async fn revoke_api_key(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_api_keys(&self) -> Result<Vec<ApiKeyRecord>> {
        let keys = sqlx::query_as::<_, ApiKeyRecord>(
            "SELECT id, label, created_at FROM api_keys ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(keys)
    }
}
