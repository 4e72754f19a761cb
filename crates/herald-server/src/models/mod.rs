//! Herald Data Models
//!
//! Request and response bodies of the HTTP API. Relayed records themselves
//! (EmbedRecord, ChatMessageRecord) come from the domain crate.

mod health;
mod relay;

pub use health::*;
pub use relay::*;
