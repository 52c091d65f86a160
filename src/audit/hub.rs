use std::sync::Arc;

use crate::audit::{AuditSink, FileSink, HttpSink};
use crate::config::AuditConfig;
use crate::models::AuditEvent;

/// Ordered list of sinks that every event is delivered to
#[derive(Default, Clone)]
pub struct AuditHub {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl AuditHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a hub with the sinks enabled in the configuration
    pub fn from_config(config: &AuditConfig) -> anyhow::Result<Self> {
        let mut hub = Self::new();

        if let Some(url) = config.url.as_deref() {
            tracing::info!(endpoint = %url, "Audit HTTP sink enabled");
            hub.register(Arc::new(HttpSink::new(url)?));
        }
        if let Some(path) = config.file.as_ref() {
            tracing::info!(path = %path.display(), "Audit file sink enabled");
            hub.register(Arc::new(FileSink::new(path.clone())));
        }

        Ok(hub)
    }

    pub fn register(&mut self, sink: Arc<dyn AuditSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Deliver `event` to each sink in turn, waiting for one before the next
    pub async fn notify(&self, event: &AuditEvent) {
        for sink in &self.sinks {
            sink.update(event).await;
        }
    }
}
