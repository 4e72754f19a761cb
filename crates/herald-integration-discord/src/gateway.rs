//! Discord gateway listener
//!
//! Receives gateway events through serenity, maps tracked messages into
//! relay records and forwards them to the server over a channel.

use std::sync::Arc;

use async_trait::async_trait;
use herald::InboundEvent;
use serenity::all::{
    ChannelId, Context, EventHandler, GatewayIntents, Message, MessageId, MessageUpdateEvent,
    Reaction, Ready,
};
use serenity::Client;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::client::{parse_snowflake, DiscordClient};
use crate::config::DiscordConfig;
use crate::mapper::{ContentMapper, Relevance};
use crate::native::DiscordMessage;

/// Intents needed to see message content and reactions in guild channels
pub fn gateway_intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::MESSAGE_CONTENT
}

pub struct GatewayHandler {
    config: DiscordConfig,
    mapper: Arc<ContentMapper>,
    events: mpsc::Sender<InboundEvent>,
}

impl GatewayHandler {
    pub fn new(
        config: DiscordConfig,
        mapper: Arc<ContentMapper>,
        events: mpsc::Sender<InboundEvent>,
    ) -> Self {
        Self {
            config,
            mapper,
            events,
        }
    }

    /// Relay records a newly observed message produces
    pub fn route(&self, message: &DiscordMessage) -> Vec<InboundEvent> {
        let mut events = Vec::with_capacity(2);

        if self.config.tracks_embeds(&message.channel_id) && !message.embeds.is_empty() {
            let relevance =
                ContentMapper::relevance(message, self.config.bot_user_id.as_deref());
            if relevance == Relevance::Permissive {
                debug!(
                    message_id = %message.id,
                    author_id = %message.author.id,
                    "Embed from unexpected author accepted"
                );
            }
            if relevance.is_relevant() {
                if let Some(embed) = self.mapper.map_message_embed(message) {
                    events.push(InboundEvent::Embed(embed));
                }
            }
        }

        if self.config.tracks_messages(&message.channel_id) && !message.content.is_empty() {
            events.push(InboundEvent::ChatMessage(self.mapper.map_message(message)));
        }

        events
    }

    async fn forward(&self, events: Vec<InboundEvent>) {
        for event in events {
            if self.events.send(event).await.is_err() {
                warn!("Inbound event receiver dropped");
                return;
            }
        }
    }

    async fn observe(&self, message: &Message) {
        match DiscordMessage::from_serenity(message) {
            Ok(native) => self.forward(self.route(&native)).await,
            Err(e) => warn!(message_id = %message.id, error = %e, "Skipping unreadable message"),
        }
    }

    /// Re-read an embed post after an edit or reaction change
    async fn refresh(&self, ctx: &Context, channel_id: ChannelId, message_id: MessageId) {
        if !self.config.tracks_embeds(&channel_id.to_string()) {
            return;
        }

        let message = match channel_id.message(&ctx.http, message_id).await {
            Ok(message) => message,
            Err(e) => {
                warn!(channel_id = %channel_id, message_id = %message_id, error = %e, "Failed to refresh message");
                return;
            }
        };

        let native = match DiscordMessage::from_serenity(&message) {
            Ok(native) => native,
            Err(e) => {
                warn!(message_id = %message_id, error = %e, "Skipping unreadable message");
                return;
            }
        };

        if let Some(embed) = self.mapper.map_message_embed(&native) {
            self.forward(vec![InboundEvent::Embed(embed)]).await;
        }
    }

    /// Replay recent history of explicitly configured channels, oldest first
    async fn backfill(&self, ctx: &Context) {
        let client = DiscordClient::from_http(ctx.http.clone());

        for channel in self.config.backfill_channels() {
            let channel_id = match parse_snowflake("channel", &channel) {
                Ok(id) => id,
                Err(e) => {
                    warn!(error = %e, "Skipping backfill");
                    continue;
                }
            };

            match client
                .get_messages(channel_id, self.config.backfill_limit)
                .await
            {
                Ok(messages) => {
                    info!(channel_id = %channel_id, count = messages.len(), "📥 Backfilling channel");
                    for message in messages.iter().rev() {
                        self.observe(message).await;
                    }
                }
                Err(e) => warn!(channel_id = %channel_id, error = %e, "Backfill failed"),
            }
        }
    }
}

#[async_trait]
impl EventHandler for GatewayHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "🔌 Discord gateway connected");
        self.backfill(&ctx).await;
    }

    async fn message(&self, _ctx: Context, message: Message) {
        self.observe(&message).await;
    }

    async fn message_update(
        &self,
        ctx: Context,
        _old_if_available: Option<Message>,
        _new: Option<Message>,
        event: MessageUpdateEvent,
    ) {
        self.refresh(&ctx, event.channel_id, event.id).await;
    }

    async fn reaction_add(&self, ctx: Context, reaction: Reaction) {
        self.refresh(&ctx, reaction.channel_id, reaction.message_id)
            .await;
    }

    async fn reaction_remove(&self, ctx: Context, reaction: Reaction) {
        self.refresh(&ctx, reaction.channel_id, reaction.message_id)
            .await;
    }
}

/// Build a serenity client whose events flow into `events`
pub async fn build_client(
    config: DiscordConfig,
    mapper: Arc<ContentMapper>,
    events: mpsc::Sender<InboundEvent>,
) -> Result<Client, serenity::Error> {
    let token = config.token.clone();
    let handler = GatewayHandler::new(config, mapper, events);
    Client::builder(&token, gateway_intents())
        .event_handler(handler)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{DiscordEmbed, DiscordUser};

    fn handler(config: DiscordConfig) -> (GatewayHandler, mpsc::Receiver<InboundEvent>) {
        let (tx, rx) = mpsc::channel(8);
        (
            GatewayHandler::new(config, Arc::new(ContentMapper::default()), tx),
            rx,
        )
    }

    fn message(channel: &str, content: &str, with_embed: bool) -> DiscordMessage {
        DiscordMessage {
            id: "1".into(),
            channel_id: channel.into(),
            author: DiscordUser {
                id: "5".into(),
                username: "ann".into(),
                ..Default::default()
            },
            content: content.into(),
            embeds: if with_embed {
                vec![DiscordEmbed {
                    title: Some("Raid".into()),
                    ..Default::default()
                }]
            } else {
                Vec::new()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_routes_by_tracked_channel() {
        let config = DiscordConfig::new("token")
            .with_embed_channels(vec!["events".into()])
            .with_message_channels(vec!["chat".into()]);
        let (handler, _rx) = handler(config);

        let events = handler.route(&message("events", "", true));
        assert!(matches!(events.as_slice(), [InboundEvent::Embed(_)]));

        let chat = handler.route(&message("chat", "hello", true));
        assert!(matches!(chat.as_slice(), [InboundEvent::ChatMessage(_)]));

        assert!(handler.route(&message("elsewhere", "hello", true)).is_empty());
    }

    #[test]
    fn test_untracked_lists_accept_everything() {
        let (handler, _rx) = handler(DiscordConfig::new("token"));
        let events = handler.route(&message("any", "hi", true));
        assert_eq!(events.len(), 2);

        assert!(handler.route(&message("any", "", false)).is_empty());
    }

    #[test]
    fn test_other_author_embeds_are_still_relayed() {
        let config = DiscordConfig::new("token").with_bot_user_id("999");
        let (handler, _rx) = handler(config);
        let events = handler.route(&message("events", "", true));
        assert!(matches!(events.as_slice(), [InboundEvent::Embed(_)]));
    }

    #[tokio::test]
    async fn test_forward_delivers_in_order() {
        let (handler, mut rx) = handler(DiscordConfig::new("token"));
        handler
            .forward(handler.route(&message("c", "hi", true)))
            .await;

        assert!(matches!(rx.recv().await, Some(InboundEvent::Embed(_))));
        assert!(matches!(rx.recv().await, Some(InboundEvent::ChatMessage(_))));
    }
}
