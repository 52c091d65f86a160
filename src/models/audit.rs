use serde::{Deserialize, Serialize};

/// What a user did to trigger an audit event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Shorten,
    Follow,
}

/// Fire-and-forget record of a create or follow action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub ts: i64,
    pub action: AuditAction,
    pub user_id: String,
    pub url: String,
}

impl AuditEvent {
    /// Build an event stamped with the current Unix time in seconds
    pub fn now(action: AuditAction, user_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            ts: chrono::Utc::now().timestamp(),
            action,
            user_id: user_id.into(),
            url: url.into(),
        }
    }
}
