//! Relay Services
//!
//! In-memory state and executors shared by every relay operation:
//! - `content_cache`: per-channel ring buffers of embeds and chat messages
//! - `fetch_cache`: single-flight cache for remote assets
//! - `dispatch_queue`: serialized outbound platform calls
//! - `broadcast_hub`: fan-out to live subscribers

pub mod broadcast_hub;
pub mod channel_buffer;
pub mod content_cache;
pub mod dispatch_queue;
pub mod fetch_cache;

pub use broadcast_hub::{BroadcastHub, HubConfig, Outbound, SubscriberHandle, SweepReport};
pub use channel_buffer::{ChannelBuffer, Keyed, Upsert};
pub use content_cache::{CacheConfig, ContentCache};
pub use dispatch_queue::{DispatchConfig, DispatchQueue};
pub use fetch_cache::{FetchCacheConfig, FetchDedupCache};
