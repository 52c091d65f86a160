use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored mapping from short code to original URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ShortLink {
    pub short_url: String,
    pub original_url: String,
    pub user_id: Option<String>,
    pub is_deleted: bool,
}

/// One element of a batch shortening request.
///
/// `original_url` is input-only and gets cleared once the entry is processed;
/// `short_url` is output-only and holds the stored code afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub correlation_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub original_url: String,
    #[serde(default)]
    pub short_url: String,
}

impl BatchEntry {
    pub fn new(correlation_id: impl Into<String>, original_url: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            original_url: original_url.into(),
            short_url: String::new(),
        }
    }
}
