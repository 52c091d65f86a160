//! Business operations over the repository.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use crate::models::{BatchEntry, ShortLink};
use crate::shortcode::CodeGenerator;
use crate::storage::{CoreStore, RelationalExtras, Repository, StorageResult};

/// Outcome of shortening a single URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub short_code: String,
    /// The URL was already stored and `short_code` is the existing code
    pub conflict: bool,
}

/// Generates codes and stores mappings.
///
/// Owns the counter behind the code generator. Every generated code consumes
/// a counter value even when the store answers with an existing code.
pub struct LinkService {
    repository: Arc<Repository>,
    generator: CodeGenerator,
}

impl LinkService {
    pub fn new(repository: Arc<Repository>) -> Self {
        let counter = Arc::new(AtomicU64::new(0));
        Self {
            repository,
            generator: CodeGenerator::new(counter),
        }
    }

    /// Reseed the counter from the stored row count. Call once at startup.
    pub async fn start(&self) -> StorageResult<()> {
        let count = self.repository.count().await.inspect_err(|e| {
            tracing::error!(error = %e, "Failed to read stored row count");
        })?;

        self.generator.seed(count);
        tracing::info!(count, "Code counter started");
        Ok(())
    }

    pub async fn create(&self, original_url: &str, user_id: &str) -> StorageResult<Created> {
        let generated = self.generator.next();

        let stored = self
            .repository
            .put(&generated, original_url, user_id)
            .await
            .inspect_err(|e| {
                tracing::error!(url = %original_url, error = %e, "Failed to store url");
            })?;

        Ok(Created {
            conflict: stored != generated,
            short_code: stored,
        })
    }

    /// Returns the original URL and whether it has been soft-deleted
    pub async fn resolve(&self, short_code: &str) -> StorageResult<(String, bool)> {
        self.repository.get(short_code).await.inspect_err(|e| {
            tracing::error!(short_code = %short_code, error = %e, "Failed to get url");
        })
    }

    /// Shorten every entry in place.
    ///
    /// Stops at the first storage error; entries already processed keep their
    /// new codes and the rest are left untouched.
    pub async fn batch_create(&self, entries: &mut [BatchEntry], user_id: &str) -> StorageResult<()> {
        for entry in entries.iter_mut() {
            let generated = self.generator.next();

            let stored = self
                .repository
                .put(&generated, &entry.original_url, user_id)
                .await
                .inspect_err(|e| {
                    tracing::error!(url = %entry.original_url, error = %e, "Failed to store url");
                })?;

            entry.original_url.clear();
            entry.short_url = stored;
        }

        Ok(())
    }

    pub async fn list_owned(&self, user_id: &str) -> StorageResult<Vec<ShortLink>> {
        self.repository.list_by_owner(user_id).await.inspect_err(|e| {
            tracing::error!(user_id = %user_id, error = %e, "Failed to list user urls");
        })
    }

    pub async fn soft_delete(&self, short_codes: &[String], user_id: &str) -> StorageResult<()> {
        let deleted = self
            .repository
            .soft_delete(short_codes, user_id)
            .await
            .inspect_err(|e| {
                tracing::error!(user_id = %user_id, error = %e, "Failed to delete urls");
            })?;

        tracing::debug!(
            user_id = %user_id,
            requested = short_codes.len(),
            deleted,
            "Soft delete finished"
        );
        Ok(())
    }

    pub async fn liveness_check(&self) -> StorageResult<()> {
        self.repository.ping().await.inspect_err(|e| {
            tracing::error!(error = %e, "Failed to ping repository");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use std::collections::HashSet;

    async fn memory_service() -> LinkService {
        let repository = Arc::new(Repository::new(None, 5, None).unwrap());
        repository.start().await.unwrap();
        let service = LinkService::new(repository);
        service.start().await.unwrap();
        service
    }

    #[tokio::test]
    async fn test_first_code_is_b() {
        let service = memory_service().await;

        let created = service.create("https://example.com", "").await.unwrap();
        assert_eq!(
            created,
            Created {
                short_code: "b".to_string(),
                conflict: false
            }
        );
    }

    #[tokio::test]
    async fn test_distinct_urls_get_distinct_codes() {
        let service = memory_service().await;

        let mut codes = HashSet::new();
        for i in 0..100 {
            let created = service
                .create(&format!("https://example.com/{}", i), "user1")
                .await
                .unwrap();
            assert!(!created.conflict);
            assert!(codes.insert(created.short_code));
        }
    }

    #[tokio::test]
    async fn test_resolve_after_create() {
        let service = memory_service().await;

        let created = service.create("https://example.com/page", "user1").await.unwrap();
        let (url, is_deleted) = service.resolve(&created.short_code).await.unwrap();

        assert_eq!(url, "https://example.com/page");
        assert!(!is_deleted);
    }

    #[tokio::test]
    async fn test_resolve_unknown_code() {
        let service = memory_service().await;
        let err = service.resolve("nope").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn test_counter_reseeded_from_row_count() {
        let repository = Arc::new(Repository::new(None, 5, None).unwrap());
        repository.put("b", "https://a.example.com", "").await.unwrap();
        repository.put("c", "https://b.example.com", "").await.unwrap();

        let service = LinkService::new(repository);
        service.start().await.unwrap();

        // two rows stored, so the next value is 3
        let created = service.create("https://c.example.com", "").await.unwrap();
        assert_eq!(created.short_code, "d");
    }

    #[tokio::test]
    async fn test_batch_create_rewrites_entries() {
        let service = memory_service().await;

        let mut entries = vec![
            BatchEntry::new("1", "https://example.com/one"),
            BatchEntry::new("2", "https://example.com/two"),
        ];
        service.batch_create(&mut entries, "user1").await.unwrap();

        assert_eq!(entries[0].correlation_id, "1");
        assert_eq!(entries[0].short_url, "b");
        assert!(entries[0].original_url.is_empty());
        assert_eq!(entries[1].short_url, "c");
        assert!(entries[1].original_url.is_empty());

        let (url, _) = service.resolve("c").await.unwrap();
        assert_eq!(url, "https://example.com/two");

        let owned = service.list_owned("user1").await.unwrap();
        assert_eq!(owned.len(), 2);
    }

    #[tokio::test]
    async fn test_soft_delete_and_ping_need_relational_backend() {
        let service = memory_service().await;

        let err = service.liveness_check().await.unwrap_err();
        assert!(matches!(err, StorageError::RelationalDisabled));

        let err = service
            .soft_delete(&["b".to_string()], "user1")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::RelationalDisabled));
    }
}
