use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;

use crate::audit::AuditSink;
use crate::models::AuditEvent;

/// POSTs each event as JSON to a remote endpoint
pub struct HttpSink {
    endpoint: String,
    client: Client,
}

impl HttpSink {
    pub fn new(endpoint: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("snip-audit/0.1.0")
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build HTTP client for audit delivery")?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl AuditSink for HttpSink {
    async fn update(&self, event: &AuditEvent) {
        match self.client.post(&self.endpoint).json(event).send().await {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    status = %response.status(),
                    "Audit endpoint rejected event"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(endpoint = %self.endpoint, error = %e, "Failed to send audit event");
            }
        }
    }
}
