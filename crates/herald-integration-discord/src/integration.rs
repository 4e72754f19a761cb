//! PlatformGateway implementation for Discord

use std::sync::Arc;

use async_trait::async_trait;
use herald::domain::entities::{ButtonRecord, ChatMessageRecord, EmbedDraft, EmbedRecord};
use herald::ports::PlatformGateway;
use herald::RelayError;
use tracing::{debug, warn};

use crate::client::{parse_snowflake, DiscordClient};
use crate::config::DiscordConfig;
use crate::mapper::ContentMapper;
use crate::native::DiscordMessage;

/// Discord integration implementing PlatformGateway
pub struct DiscordIntegration {
    client: DiscordClient,
    mapper: Arc<ContentMapper>,
}

impl DiscordIntegration {
    /// Create a new Discord integration
    pub fn new(config: &DiscordConfig, mapper: Arc<ContentMapper>) -> Self {
        Self {
            client: DiscordClient::new(config),
            mapper,
        }
    }

    pub fn mapper(&self) -> &Arc<ContentMapper> {
        &self.mapper
    }

    fn ids(channel_id: &str, message_id: &str) -> Result<(u64, u64), RelayError> {
        Ok((
            parse_snowflake("channel", channel_id)?,
            parse_snowflake("message", message_id)?,
        ))
    }
}

fn api_error(e: serenity::Error) -> RelayError {
    RelayError::ExternalService(format!("Discord API error: {}", e))
}

#[async_trait]
impl PlatformGateway for DiscordIntegration {
    fn name(&self) -> &str {
        "discord"
    }

    async fn send_message(
        &self,
        channel_id: &str,
        content: &str,
    ) -> Result<ChatMessageRecord, RelayError> {
        let channel = parse_snowflake("channel", channel_id)?;
        let sent = self
            .client
            .send_message(channel, content)
            .await
            .map_err(api_error)?;

        let native = DiscordMessage::from_serenity(&sent)?;
        Ok(self.mapper.map_message(&native))
    }

    async fn post_embed(
        &self,
        channel_id: &str,
        draft: &EmbedDraft,
        controls: &[Vec<ButtonRecord>],
    ) -> Result<EmbedRecord, RelayError> {
        let channel = parse_snowflake("channel", channel_id)?;
        let sent = self
            .client
            .send_embed(channel, draft, controls)
            .await
            .map_err(api_error)?;

        let native = DiscordMessage::from_serenity(&sent)?;
        self.mapper.map_message_embed(&native).ok_or_else(|| {
            RelayError::ExternalService(format!("Discord returned message {} without an embed", native.id))
        })
    }

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), RelayError> {
        let (channel, message) = Self::ids(channel_id, message_id)?;
        self.client
            .react(channel, message, emoji)
            .await
            .map_err(api_error)
    }

    async fn fetch_embed(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<Option<EmbedRecord>, RelayError> {
        let (channel, message) = Self::ids(channel_id, message_id)?;
        let fetched = self
            .client
            .get_message(channel, message)
            .await
            .map_err(api_error)?;

        let native = DiscordMessage::from_serenity(&fetched)?;
        let embed = self.mapper.map_message_embed(&native);
        debug!(message_id = %message_id, has_embed = embed.is_some(), "Refetched Discord message");
        Ok(embed)
    }

    async fn health_check(&self) -> Result<bool, RelayError> {
        // Try to get current user to verify connection
        match self.client.http().get_current_user().await {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!(error = %e, "Discord health check failed");
                Ok(false)
            }
        }
    }
}
