//! Remote Resource Port
//!
//! Fetches remote resources (avatars, thumbnails) on behalf of the
//! single-flight fetch cache.

use async_trait::async_trait;

use crate::domain::errors::RelayError;

#[async_trait]
pub trait ResourceFetcher: Send + Sync + 'static {
    type Output: Clone + Send + Sync + 'static;

    /// Fetch the resource identified by `key` (usually a URL).
    async fn fetch(&self, key: &str) -> Result<Self::Output, RelayError>;
}
