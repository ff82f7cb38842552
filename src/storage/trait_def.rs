use crate::models::{ApiKeyRecord, NewMapping, UrlMapping, UsageTotals, UserRecord, ViewOutcome};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unique value already exists")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Other(err.into())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables and indexes)
    async fn init(&self) -> Result<()>;

    /// Insert a new mapping. Fails with `StorageError::Conflict` when the
    /// short code is already taken; the existing row is left untouched.
    async fn insert_mapping(&self, mapping: &NewMapping<'_>) -> StorageResult<UrlMapping>;

    /// Get a mapping by short code
    async fn get_mapping(&self, short_code: &str) -> Result<Option<UrlMapping>>;

    /// Hard delete a mapping. Returns false when no row matched.
    async fn delete_mapping(&self, short_code: &str) -> Result<bool>;

    /// Count one view unless the mapping expired before `cutoff`.
    /// Lookup, expiry check and increment run in one transaction.
    async fn record_view(&self, short_code: &str, cutoff: i64) -> Result<ViewOutcome>;

    /// Number of mappings and sum of their view counters
    async fn usage_totals(&self) -> Result<UsageTotals>;

    /// List mappings, newest first
    async fn list_mappings(&self, limit: i64, offset: i64) -> Result<Vec<UrlMapping>>;

    /// Create a user. Fails with `StorageError::Conflict` on a duplicate username.
    async fn create_user(&self, username: &str, password_hash: &str) -> StorageResult<UserRecord>;

    async fn get_user(&self, username: &str) -> Result<Option<UserRecord>>;

    /// Store the digest of a newly issued API key
    async fn create_api_key(&self, key_hash: &str, label: Option<&str>)
        -> StorageResult<ApiKeyRecord>;

    async fn api_key_exists(&self, key_hash: &str) -> Result<bool>;

    async fn revoke_api_key(&self, id: i64) -> Result<bool>;

    async fn list_api_keys(&self) -> Result<Vec<ApiKeyRecord>>;
}

pub(crate) fn unix_now() -> StorageResult<i64> {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|e| StorageError::Other(e.into()))?
        .as_secs();
    Ok(secs as i64)
}
