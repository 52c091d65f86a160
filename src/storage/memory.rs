use crate::models::ShortLink;
use crate::storage::{CoreStore, StorageError, StorageResult};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;

#[derive(Debug, Clone)]
struct Entry {
    original_url: String,
    user_id: Option<String>,
}

/// On-disk snapshot record
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRecord {
    short_url: String,
    original_url: String,
}

/// In-process storage backed by a concurrent map.
///
/// Rows are loaded from a JSON snapshot on `start` and written back in full
/// on `stop`. URL uniqueness is not enforced, so `put` never reports a conflict.
pub struct MemoryStorage {
    entries: DashMap<String, Entry>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryStorage {
    /// `snapshot_path` of `None` keeps everything in memory only
    pub fn new(snapshot_path: Option<PathBuf>) -> Self {
        Self {
            entries: DashMap::new(),
            snapshot_path,
        }
    }

    /// Load the snapshot file. A missing or empty file means no data yet.
    pub async fn recover(&self) -> StorageResult<usize> {
        let Some(path) = self.snapshot_path.as_ref() else {
            return Ok(0);
        };

        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        if raw.trim().is_empty() {
            return Ok(0);
        }

        let records: Vec<SnapshotRecord> = serde_json::from_str(&raw)?;
        let recovered = records.len();
        for record in records {
            self.entries.insert(
                record.short_url,
                Entry {
                    original_url: record.original_url,
                    user_id: None,
                },
            );
        }

        Ok(recovered)
    }

    /// Rewrite the snapshot file with the current contents.
    ///
    /// Only safe once no writers are active, i.e. at shutdown.
    pub async fn save(&self) -> StorageResult<usize> {
        let Some(path) = self.snapshot_path.as_ref() else {
            return Ok(0);
        };

        let records: Vec<SnapshotRecord> = self
            .entries
            .iter()
            .map(|entry| SnapshotRecord {
                short_url: entry.key().clone(),
                original_url: entry.value().original_url.clone(),
            })
            .collect();

        let payload = serde_json::to_vec(&records)?;
        tokio::fs::write(path, payload).await?;

        Ok(records.len())
    }
}

#[async_trait]
impl CoreStore for MemoryStorage {
    async fn start(&self) -> StorageResult<()> {
        let recovered = self.recover().await?;
        tracing::info!(recovered, path = ?self.snapshot_path, "In-memory storage recovered from snapshot");
        Ok(())
    }

    async fn stop(&self) -> StorageResult<()> {
        let saved = self.save().await?;
        tracing::info!(saved, path = ?self.snapshot_path, "In-memory storage saved snapshot");
        Ok(())
    }

    async fn put(
        &self,
        short_code: &str,
        original_url: &str,
        user_id: &str,
    ) -> StorageResult<String> {
        self.entries.insert(
            short_code.to_string(),
            Entry {
                original_url: original_url.to_string(),
                user_id: (!user_id.is_empty()).then(|| user_id.to_string()),
            },
        );

        Ok(short_code.to_string())
    }

    async fn get(&self, short_code: &str) -> StorageResult<(String, bool)> {
        self.entries
            .get(short_code)
            .map(|entry| (entry.original_url.clone(), false))
            .ok_or(StorageError::NotFound)
    }

    async fn count(&self) -> StorageResult<u64> {
        Ok(self.entries.len() as u64)
    }

    async fn list_by_owner(&self, user_id: &str) -> StorageResult<Vec<ShortLink>> {
        let links = self
            .entries
            .iter()
            .filter(|entry| entry.value().user_id.as_deref() == Some(user_id))
            .map(|entry| ShortLink {
                short_url: entry.key().clone(),
                original_url: entry.value().original_url.clone(),
                user_id: entry.value().user_id.clone(),
                is_deleted: false,
            })
            .collect();

        Ok(links)
    }
}
