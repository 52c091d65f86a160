use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::audit::AuditSink;
use crate::models::AuditEvent;

/// Appends one JSON object per line to a file.
///
/// The file is opened and closed on every event.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn append(&self, event: &AuditEvent) -> anyhow::Result<()> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        Ok(())
    }
}

#[async_trait]
impl AuditSink for FileSink {
    async fn update(&self, event: &AuditEvent) {
        if let Err(e) = self.append(event).await {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to write audit event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuditAction;

    fn log_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("snip-audit-{}-{}.log", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_appends_one_line_per_event() {
        let path = log_path("append");
        let _ = std::fs::remove_file(&path);
        let sink = FileSink::new(path.clone());

        let first = AuditEvent::now(AuditAction::Shorten, "user1", "https://example.com");
        let second = AuditEvent::now(AuditAction::Follow, "", "https://example.com");
        sink.update(&first).await;
        sink.update(&second).await;

        let raw = std::fs::read_to_string(&path).unwrap();
        let events: Vec<AuditEvent> = raw
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(events, vec![first, second]);

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_unwritable_path_is_swallowed() {
        let path = std::env::temp_dir()
            .join("snip-audit-no-such-dir")
            .join("nested")
            .join("audit.log");
        let sink = FileSink::new(path.clone());

        sink.update(&AuditEvent::now(AuditAction::Shorten, "user1", "https://example.com"))
            .await;

        assert!(!path.exists());
    }
}
