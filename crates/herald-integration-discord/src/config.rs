//! Discord configuration

use serde::{Deserialize, Serialize};

/// Configuration for the Discord integration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Discord bot token
    pub token: String,
    /// User id whose embeds are authoritative event posts
    pub bot_user_id: Option<String>,
    /// Channels whose embeds are relayed (empty = every channel)
    pub embed_channels: Vec<String>,
    /// Channels whose chat is relayed (empty = every channel)
    pub message_channels: Vec<String>,
    /// Messages fetched per channel when the gateway connects
    pub backfill_limit: u8,
}

impl DiscordConfig {
    /// Create a new Discord configuration with just a token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    /// Set the expected author of event embeds
    pub fn with_bot_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.bot_user_id = Some(user_id.into());
        self
    }

    /// Restrict embed relaying to these channels
    pub fn with_embed_channels(mut self, channels: Vec<String>) -> Self {
        self.embed_channels = channels;
        self
    }

    /// Restrict chat relaying to these channels
    pub fn with_message_channels(mut self, channels: Vec<String>) -> Self {
        self.message_channels = channels;
        self
    }

    pub fn tracks_embeds(&self, channel_id: &str) -> bool {
        self.embed_channels.is_empty() || self.embed_channels.iter().any(|c| c == channel_id)
    }

    pub fn tracks_messages(&self, channel_id: &str) -> bool {
        self.message_channels.is_empty() || self.message_channels.iter().any(|c| c == channel_id)
    }

    /// Explicitly configured channels, without duplicates
    pub fn backfill_channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self
            .embed_channels
            .iter()
            .chain(self.message_channels.iter())
            .cloned()
            .collect();
        channels.sort();
        channels.dedup();
        channels
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            bot_user_id: None,
            embed_channels: Vec::new(),
            message_channels: Vec::new(),
            backfill_limit: 50,
        }
    }
}
