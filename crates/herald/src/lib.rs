//! Herald Relay Library
//!
//! Core types and services for relaying chat-platform content to overlay and
//! dashboard consumers.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain/`): relay records and their rules
//!   - `entities/`: EmbedRecord, ChatMessageRecord, ButtonLayout
//!   - `value_objects/`: InteractionId codec, Topic
//!   - `errors/`: RelayError
//!
//! - **Ports** (`ports/`): abstract interfaces (traits)
//!   - `platform`: outbound chat-platform calls and inbound events
//!   - `fetcher`: remote resource fetching
//!
//! - **Services** (`services/`): shared in-memory state and executors
//!
//! # Usage
//!
//! ```rust,ignore
//! use herald::{BroadcastHub, ContentCache, EmbedRecord, Topic};
//!
//! let cache = Arc::new(ContentCache::default());
//! let hub = Arc::new(BroadcastHub::new(cache, HubConfig::default()));
//! let mut subscriber = hub.subscribe(Topic::Embeds, None)?;
//! hub.publish_embed(EmbedRecord::new("123", "456"));
//! ```

pub mod domain;
pub mod ports;
pub mod services;

// Re-export commonly used types
pub use domain::{
    truncate_chars, ButtonLayout, ButtonRecord, ChatMessageRecord, EmbedAuthor, EmbedDraft,
    EmbedField, EmbedRecord, IdentifierCodec, InteractionId, LayoutChange, MentionRecord,
    RelayError, Topic,
};
pub use ports::{InboundEvent, PlatformGateway, ResourceFetcher};
pub use services::{
    BroadcastHub, CacheConfig, ContentCache, DispatchConfig, DispatchQueue, FetchCacheConfig,
    FetchDedupCache, HubConfig, Outbound, SubscriberHandle,
};
