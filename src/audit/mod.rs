//! Audit event fan-out
//!
//! Create and follow actions are broadcast to every registered sink, one at a
//! time and in registration order. Sinks own their failures: they log and
//! swallow them so a broken sink never affects the request that triggered
//! the event or the sinks after it.

pub mod file;
pub mod http;
pub mod hub;

use crate::models::AuditEvent;
use async_trait::async_trait;

pub use file::FileSink;
pub use http::HttpSink;
pub use hub::AuditHub;

/// A consumer of audit events
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Deliver one event. Must not fail outward; errors are handled internally.
    async fn update(&self, event: &AuditEvent);
}
