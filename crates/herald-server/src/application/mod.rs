//! Application Layer (Use Cases)
//!
//! Orchestrates the relay core and the platform gateway.

mod relay_service;

pub use relay_service::RelayService;

#[cfg(test)]
pub(crate) use relay_service::testing;
