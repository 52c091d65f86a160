use crate::models::ShortLink;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("short code not found")]
    NotFound,
    #[error("relational backend is not configured")]
    RelationalDisabled,
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
    #[error("malformed snapshot file: {0}")]
    MalformedSnapshot(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Operations every backend supports.
#[async_trait]
pub trait CoreStore: Send + Sync {
    /// Backend-specific setup (schema migration, snapshot recovery, ...)
    async fn start(&self) -> StorageResult<()>;

    /// Backend-specific teardown (pool close, snapshot save, ...)
    async fn stop(&self) -> StorageResult<()>;

    /// Store a new mapping and return the code it is stored under.
    ///
    /// A backend that enforces URL uniqueness returns the pre-existing code
    /// when the URL is already stored; callers detect that by comparing the
    /// returned code with the one they passed in.
    async fn put(
        &self,
        short_code: &str,
        original_url: &str,
        user_id: &str,
    ) -> StorageResult<String>;

    /// Look up a code. Soft-deleted rows still return their URL with the flag set.
    async fn get(&self, short_code: &str) -> StorageResult<(String, bool)>;

    /// Total number of stored mappings
    async fn count(&self) -> StorageResult<u64>;

    /// All rows owned by `user_id`, soft-deleted ones included
    async fn list_by_owner(&self, user_id: &str) -> StorageResult<Vec<ShortLink>>;
}

/// Capabilities only the relational backend provides.
#[async_trait]
pub trait RelationalExtras: Send + Sync {
    /// Connectivity probe
    async fn ping(&self) -> StorageResult<()>;

    /// Flag every listed code owned by `user_id` as deleted.
    ///
    /// Codes that are absent or owned by someone else are skipped silently.
    /// Returns the number of rows flipped.
    async fn soft_delete(&self, short_codes: &[String], user_id: &str) -> StorageResult<u64>;
}
