//! Chat Platform Port
//!
//! Outbound calls the relay makes against the chat platform, and the
//! inbound events a platform adapter feeds into the relay.

use async_trait::async_trait;

use crate::domain::entities::{ButtonRecord, ChatMessageRecord, EmbedDraft, EmbedRecord};
use crate::domain::errors::RelayError;

/// Outbound platform interface
///
/// Every write issued through this trait is expected to run inside the
/// dispatch queue, so implementations never see two concurrent writes.
///
/// # Example
///
/// ```rust,ignore
/// use herald::ports::PlatformGateway;
///
/// struct DiscordIntegration { /* ... */ }
///
/// #[async_trait]
/// impl PlatformGateway for DiscordIntegration {
///     async fn send_message(&self, channel_id: &str, content: &str)
///         -> Result<ChatMessageRecord, RelayError>
///     {
///         // POST to the channel and map the created message
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait PlatformGateway: Send + Sync {
    /// Platform name (e.g., "discord")
    fn name(&self) -> &str;

    /// Post a plain chat message and return it as relayed
    async fn send_message(
        &self,
        channel_id: &str,
        content: &str,
    ) -> Result<ChatMessageRecord, RelayError>;

    /// Post an embed with rows of controls and return it as relayed
    async fn post_embed(
        &self,
        channel_id: &str,
        draft: &EmbedDraft,
        controls: &[Vec<ButtonRecord>],
    ) -> Result<EmbedRecord, RelayError>;

    /// React to a message with a unicode emoji
    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), RelayError>;

    /// Re-read a message and map its embed, if it carries one
    async fn fetch_embed(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<Option<EmbedRecord>, RelayError>;

    /// Check if the platform connection is healthy
    async fn health_check(&self) -> Result<bool, RelayError> {
        Ok(true)
    }
}

/// Content observed on the platform, already mapped to relay records
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// An embed post was created, edited or had its reactions change
    Embed(EmbedRecord),
    /// A chat message was created in a tracked channel
    ChatMessage(ChatMessageRecord),
}

impl InboundEvent {
    pub fn channel_id(&self) -> &str {
        match self {
            Self::Embed(embed) => &embed.channel_id,
            Self::ChatMessage(message) => &message.channel_id,
        }
    }

    pub fn record_id(&self) -> &str {
        match self {
            Self::Embed(embed) => &embed.id,
            Self::ChatMessage(message) => &message.id,
        }
    }
}
