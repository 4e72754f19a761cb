//! Ports (Interfaces)
//!
//! Abstract interfaces through which the relay talks to the chat platform
//! and to remote asset hosts. Implementations live in adapter crates.

pub mod fetcher;
pub mod platform;

// Re-exports
pub use fetcher::*;
pub use platform::*;
