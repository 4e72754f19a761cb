//! Infrastructure Adapters
//!
//! Implementations of domain ports for external systems.

pub mod http_fetcher;

// Re-exports
pub use http_fetcher::{Asset, AssetPolicy, HttpAssetFetcher};
