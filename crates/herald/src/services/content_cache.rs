//! Content Cache - bounded in-memory store of relayed content
//!
//! Embeds and chat messages are kept per channel in ring buffers. Embeds are
//! additionally mirrored into a small global "recent events" buffer that
//! backs the cross-channel feed.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::domain::entities::{ChatMessageRecord, EmbedRecord};
use crate::services::channel_buffer::{ChannelBuffer, Upsert};

/// Cache sizing
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Per-channel capacity for embeds and messages
    pub channel_capacity: usize,
    /// Capacity of the global recent-embeds feed
    pub recent_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 50,
            recent_capacity: 10,
        }
    }
}

pub struct ContentCache {
    config: CacheConfig,
    embeds: RwLock<HashMap<String, ChannelBuffer<EmbedRecord>>>,
    recent_embeds: RwLock<ChannelBuffer<EmbedRecord>>,
    messages: RwLock<HashMap<String, ChannelBuffer<ChatMessageRecord>>>,
}

impl ContentCache {
    pub fn new(config: CacheConfig) -> Self {
        let recent_embeds = RwLock::new(ChannelBuffer::new(config.recent_capacity));
        Self {
            config,
            embeds: RwLock::new(HashMap::new()),
            recent_embeds,
            messages: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Insert or replace an embed in its channel and in the recent feed.
    pub fn upsert_embed(&self, record: EmbedRecord) -> Upsert<EmbedRecord> {
        let outcome = {
            let mut embeds = self.embeds.write().unwrap_or_else(PoisonError::into_inner);
            embeds
                .entry(record.channel_id.clone())
                .or_insert_with(|| ChannelBuffer::new(self.config.channel_capacity))
                .upsert(record.clone())
        };

        let _ = self
            .recent_embeds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .upsert(record);

        outcome
    }

    /// Append a chat message. Returns `false` if the id was already cached.
    pub fn insert_message(&self, record: ChatMessageRecord) -> bool {
        let mut messages = self.messages.write().unwrap_or_else(PoisonError::into_inner);
        messages
            .entry(record.channel_id.clone())
            .or_insert_with(|| ChannelBuffer::new(self.config.channel_capacity))
            .insert_new(record)
    }

    pub fn embed(&self, channel_id: &str, id: &str) -> Option<EmbedRecord> {
        self.embeds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(channel_id)
            .and_then(|buffer| buffer.get(id).cloned())
    }

    /// Embeds of one channel, oldest first
    pub fn embeds(&self, channel_id: &str) -> Vec<EmbedRecord> {
        self.embeds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(channel_id)
            .map(ChannelBuffer::snapshot)
            .unwrap_or_default()
    }

    /// Global recent-embeds feed, oldest first
    pub fn recent_embeds(&self) -> Vec<EmbedRecord> {
        self.recent_embeds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Chat messages of one channel, oldest first
    pub fn messages(&self, channel_id: &str) -> Vec<ChatMessageRecord> {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(channel_id)
            .map(ChannelBuffer::snapshot)
            .unwrap_or_default()
    }

    /// Chat messages of every channel, grouped by channel id
    pub fn all_messages(&self) -> Vec<ChatMessageRecord> {
        let messages = self.messages.read().unwrap_or_else(PoisonError::into_inner);
        let mut channels: Vec<&String> = messages.keys().collect();
        channels.sort();
        channels
            .into_iter()
            .flat_map(|channel| messages[channel].snapshot())
            .collect()
    }
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn embed(channel: &str, id: usize) -> EmbedRecord {
        EmbedRecord::new(id.to_string(), channel)
    }

    #[test]
    fn test_ring_buffer_bound_per_channel() {
        let cache = ContentCache::default();
        for i in 0..51 {
            let _ = cache.upsert_embed(embed("events", i));
        }
        let ids: Vec<String> = cache.embeds("events").into_iter().map(|e| e.id).collect();
        let expected: Vec<String> = (1..51).map(|i| i.to_string()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_recent_feed_has_its_own_capacity() {
        let cache = ContentCache::default();
        for i in 0..6 {
            let _ = cache.upsert_embed(embed("a", i));
            let _ = cache.upsert_embed(embed("b", 100 + i));
        }
        let recent = cache.recent_embeds();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].id, "1");
        assert_eq!(recent[9].id, "105");
        assert_eq!(cache.embeds("a").len(), 6);
    }

    #[test]
    fn test_upsert_updates_both_views_in_place() {
        let cache = ContentCache::default();
        let _ = cache.upsert_embed(embed("a", 1));
        let _ = cache.upsert_embed(embed("a", 2));
        let outcome = cache.upsert_embed(embed("a", 1).with_title("3 going"));

        assert_eq!(outcome, Upsert::Replaced);
        let channel = cache.embeds("a");
        assert_eq!(channel[0].title.as_deref(), Some("3 going"));
        assert_eq!(cache.recent_embeds()[0].title.as_deref(), Some("3 going"));
        assert_eq!(cache.embed("a", "1").unwrap().title.as_deref(), Some("3 going"));
    }

    #[test]
    fn test_messages_are_append_only() {
        let cache = ContentCache::default();
        let msg = ChatMessageRecord::new("1", "chat", "u1", "Ann", "hi");
        assert!(cache.insert_message(msg.clone()));

        let mut edited = msg;
        edited.content = "edited".into();
        assert!(!cache.insert_message(edited));
        assert_eq!(cache.messages("chat")[0].content, "hi");
    }

    #[test]
    fn test_all_messages_grouped_by_channel() {
        let cache = ContentCache::default();
        assert!(cache.insert_message(ChatMessageRecord::new("2", "b", "u", "U", "x")));
        assert!(cache.insert_message(ChatMessageRecord::new("1", "a", "u", "U", "y")));
        let ids: Vec<String> = cache.all_messages().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(cache.messages("missing").is_empty());
    }

    #[test]
    fn test_concurrent_upserts_keep_bound() {
        let cache = Arc::new(ContentCache::default());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let _ = cache.upsert_embed(embed("shared", t * 1000 + i));
                        let _ = cache.embeds("shared");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.embeds("shared").len(), 50);
        assert_eq!(cache.recent_embeds().len(), 10);
    }
}
