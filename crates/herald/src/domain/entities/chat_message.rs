//! Chat Message Entity
//!
//! A plain channel chat message as relayed to consumers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A chat message from a tracked channel. Immutable once cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageRecord {
    /// Platform-specific message ID
    pub id: String,
    pub channel_id: String,
    pub author_id: String,
    /// Author's display name
    pub author_name: String,
    pub content: String,
    #[serde(default)]
    pub mentions: Vec<MentionRecord>,
    /// Creation time, unix milliseconds
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MentionRecord {
    pub id: String,
    pub name: String,
}

impl ChatMessageRecord {
    pub fn new(
        id: impl Into<String>,
        channel_id: impl Into<String>,
        author_id: impl Into<String>,
        author_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            author_id: author_id.into(),
            author_name: author_name.into(),
            content: content.into(),
            mentions: Vec::new(),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn with_mentions(mut self, mentions: Vec<MentionRecord>) -> Self {
        self.mentions = mentions;
        self
    }

    pub fn with_timestamp_ms(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }
}
