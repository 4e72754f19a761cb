//! Discord Integration for Herald
//!
//! Connects the relay to Discord: a gateway listener that turns channel
//! activity into [`herald::InboundEvent`]s, and a [`DiscordIntegration`]
//! that implements [`herald::PlatformGateway`] for outbound writes.
//!
//! # Usage
//!
//! ```rust,ignore
//! use herald_integration_discord::{build_client, ContentMapper, DiscordConfig, DiscordIntegration};
//!
//! let config = DiscordConfig::new("your-bot-token");
//! let mapper = Arc::new(ContentMapper::default());
//! let integration = DiscordIntegration::new(&config, mapper.clone());
//! let mut client = build_client(config, mapper, events_tx).await?;
//! tokio::spawn(async move { client.start().await });
//! ```

mod client;
mod config;
mod gateway;
mod integration;
mod mapper;
mod native;

pub use client::{parse_snowflake, DiscordClient};
pub use config::DiscordConfig;
pub use gateway::{build_client, gateway_intents, GatewayHandler};
pub use integration::DiscordIntegration;
pub use mapper::{ContentMapper, Relevance, DEFAULT_RSVP_EMOJIS};
pub use native::{DiscordEmbed, DiscordMessage, DiscordUser};
