use crate::models::ShortLink;
use crate::storage::{
    CoreStore, MemoryStorage, PostgresStorage, RelationalExtras, StorageError, StorageResult,
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Selects the primary backend and keeps a separate handle on the relational
/// one for the operations only it supports.
///
/// Errors from either backend are returned unchanged; nothing is retried.
pub struct Repository {
    primary: Arc<dyn CoreStore>,
    relational: Option<Arc<PostgresStorage>>,
}

impl Repository {
    /// Relational primary when a connection string is given, in-memory otherwise.
    pub fn new(
        database_url: Option<&str>,
        max_connections: u32,
        snapshot_path: Option<PathBuf>,
    ) -> StorageResult<Self> {
        match database_url.filter(|url| !url.is_empty()) {
            Some(url) => {
                tracing::info!("Using PostgreSQL storage");
                let postgres = Arc::new(PostgresStorage::new(url, max_connections)?);
                Ok(Self::from_parts(postgres.clone(), Some(postgres)))
            }
            None => {
                tracing::info!(snapshot = ?snapshot_path, "Using in-memory storage");
                Ok(Self::from_parts(
                    Arc::new(MemoryStorage::new(snapshot_path)),
                    None,
                ))
            }
        }
    }

    pub fn from_parts(
        primary: Arc<dyn CoreStore>,
        relational: Option<Arc<PostgresStorage>>,
    ) -> Self {
        Self {
            primary,
            relational,
        }
    }

    fn relational(&self) -> StorageResult<&PostgresStorage> {
        self.relational
            .as_deref()
            .ok_or(StorageError::RelationalDisabled)
    }

    fn relational_is_primary(&self) -> bool {
        match &self.relational {
            Some(relational) => {
                let relational: Arc<dyn CoreStore> = relational.clone();
                Arc::ptr_eq(&self.primary, &relational)
            }
            None => false,
        }
    }
}

#[async_trait]
impl CoreStore for Repository {
    async fn start(&self) -> StorageResult<()> {
        self.primary.start().await?;

        if !self.relational_is_primary() {
            if let Some(relational) = &self.relational {
                relational.start().await?;
            }
        }

        Ok(())
    }

    async fn stop(&self) -> StorageResult<()> {
        self.primary.stop().await?;

        if !self.relational_is_primary() {
            if let Some(relational) = &self.relational {
                relational.stop().await?;
            }
        }

        Ok(())
    }

    async fn put(
        &self,
        short_code: &str,
        original_url: &str,
        user_id: &str,
    ) -> StorageResult<String> {
        self.primary.put(short_code, original_url, user_id).await
    }

    async fn get(&self, short_code: &str) -> StorageResult<(String, bool)> {
        self.primary.get(short_code).await
    }

    async fn count(&self) -> StorageResult<u64> {
        self.primary.count().await
    }

    async fn list_by_owner(&self, user_id: &str) -> StorageResult<Vec<ShortLink>> {
        self.primary.list_by_owner(user_id).await
    }
}

#[async_trait]
impl RelationalExtras for Repository {
    async fn ping(&self) -> StorageResult<()> {
        self.relational()?.ping().await
    }

    async fn soft_delete(&self, short_codes: &[String], user_id: &str) -> StorageResult<u64> {
        self.relational()?.soft_delete(short_codes, user_id).await
    }
}
