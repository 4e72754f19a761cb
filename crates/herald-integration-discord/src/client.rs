//! Discord API client wrapper

use serenity::all::{
    ButtonStyle, ChannelId, CreateActionRow, CreateButton, CreateEmbed, CreateMessage,
    GetMessages, MessageId, ReactionType,
};
use serenity::http::Http;
use serenity::model::channel::Message as SerenityMessage;
use std::sync::Arc;
use tracing::{debug, error};

use herald::domain::entities::{ButtonRecord, EmbedDraft};
use herald::RelayError;

use crate::config::DiscordConfig;

/// Discord API client
pub struct DiscordClient {
    http: Arc<Http>,
}

impl DiscordClient {
    /// Create a new Discord client
    pub fn new(config: &DiscordConfig) -> Self {
        Self::from_http(Arc::new(Http::new(&config.token)))
    }

    /// Share the HTTP client of a running gateway
    pub fn from_http(http: Arc<Http>) -> Self {
        Self { http }
    }

    /// Get recent messages from a channel, newest first
    pub async fn get_messages(
        &self,
        channel_id: u64,
        limit: u8,
    ) -> Result<Vec<SerenityMessage>, serenity::Error> {
        debug!(channel_id = %channel_id, limit = %limit, "Fetching messages from Discord");
        ChannelId::new(channel_id)
            .messages(&self.http, GetMessages::new().limit(limit))
            .await
    }

    pub async fn get_message(
        &self,
        channel_id: u64,
        message_id: u64,
    ) -> Result<SerenityMessage, serenity::Error> {
        debug!(channel_id = %channel_id, message_id = %message_id, "Fetching Discord message");
        ChannelId::new(channel_id)
            .message(&self.http, MessageId::new(message_id))
            .await
    }

    /// Send a message to a channel
    pub async fn send_message(
        &self,
        channel_id: u64,
        content: &str,
    ) -> Result<SerenityMessage, serenity::Error> {
        debug!(channel_id = %channel_id, content_len = %content.len(), "Sending message to Discord");
        ChannelId::new(channel_id)
            .say(&self.http, content)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to send Discord message"))
    }

    /// Post an embed with rows of buttons
    pub async fn send_embed(
        &self,
        channel_id: u64,
        draft: &EmbedDraft,
        controls: &[Vec<ButtonRecord>],
    ) -> Result<SerenityMessage, serenity::Error> {
        debug!(
            channel_id = %channel_id,
            rows = controls.len(),
            "Posting embed to Discord"
        );

        let mut message = CreateMessage::new().embed(build_embed(draft));
        let rows = build_rows(controls);
        if !rows.is_empty() {
            message = message.components(rows);
        }

        ChannelId::new(channel_id)
            .send_message(&self.http, message)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to post Discord embed"))
    }

    /// React to a message with a unicode emoji
    pub async fn react(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> Result<(), serenity::Error> {
        debug!(channel_id = %channel_id, message_id = %message_id, emoji = %emoji, "Adding Discord reaction");
        ChannelId::new(channel_id)
            .create_reaction(
                &self.http,
                MessageId::new(message_id),
                ReactionType::Unicode(emoji.to_string()),
            )
            .await
    }

    /// Get the underlying HTTP client for advanced operations
    pub fn http(&self) -> &Arc<Http> {
        &self.http
    }
}

/// Parse a snowflake id; zero is not a valid id
pub fn parse_snowflake(kind: &str, raw: &str) -> Result<u64, RelayError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or_else(|| RelayError::Validation(format!("Invalid Discord {kind} id '{raw}'")))
}

fn build_embed(draft: &EmbedDraft) -> CreateEmbed {
    let mut embed = CreateEmbed::new();
    if let Some(title) = &draft.title {
        embed = embed.title(title);
    }
    if let Some(description) = &draft.description {
        embed = embed.description(description);
    }
    if let Some(color) = draft.color {
        embed = embed.colour(color);
    }
    for field in &draft.fields {
        embed = embed.field(&field.name, &field.value, false);
    }
    if let Some(url) = &draft.image_url {
        embed = embed.image(url);
    }
    if let Some(url) = &draft.thumbnail_url {
        embed = embed.thumbnail(url);
    }
    embed
}

fn build_rows(controls: &[Vec<ButtonRecord>]) -> Vec<CreateActionRow> {
    controls
        .iter()
        .filter(|row| !row.is_empty())
        .map(|row| {
            let buttons = row
                .iter()
                .map(|button| {
                    let created = match (&button.url, &button.custom_id) {
                        (Some(url), _) => CreateButton::new_link(url),
                        (None, Some(custom_id)) => {
                            CreateButton::new(custom_id).style(ButtonStyle::Primary)
                        }
                        (None, None) => CreateButton::new(button.label.clone())
                            .style(ButtonStyle::Secondary),
                    };
                    created.label(&button.label)
                })
                .collect();
            CreateActionRow::Buttons(buttons)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_snowflake() {
        assert_eq!(parse_snowflake("channel", "1234567890").unwrap(), 1234567890);
        assert_eq!(parse_snowflake("channel", " 42 ").unwrap(), 42);
        assert!(matches!(
            parse_snowflake("channel", "0"),
            Err(RelayError::Validation(_))
        ));
        assert!(parse_snowflake("message", "abc").is_err());
        assert!(parse_snowflake("message", "").is_err());
    }

    #[test]
    fn test_empty_rows_are_skipped() {
        let rows = build_rows(&[
            vec![ButtonRecord::with_custom_id("✅ Going", "rsvp:going:b622116c")],
            vec![],
            vec![ButtonRecord::link("Guide", "https://example.com/guide")],
        ]);
        assert_eq!(rows.len(), 2);
    }
}
