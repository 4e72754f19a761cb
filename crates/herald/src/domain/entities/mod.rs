//! Domain Entities
//!
//! Records relayed to consumers and the button layout used to author them.

mod chat_message;
mod embed;
mod layout;

pub use chat_message::*;
pub use embed::*;
pub use layout::*;
