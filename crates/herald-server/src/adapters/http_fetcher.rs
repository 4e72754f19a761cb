//! HTTP Asset Fetcher
//!
//! Downloads remote assets (avatars, embed images) using reqwest.

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::{Client, Url};
use std::time::Duration;

use herald::{RelayError, ResourceFetcher};

/// Largest asset body accepted from upstream
pub const MAX_ASSET_BYTES: usize = 8 * 1024 * 1024;

/// Fetched asset body and its content type
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Which remote URLs may be proxied
#[derive(Debug, Clone)]
pub struct AssetPolicy {
    allowed_hosts: Vec<String>,
}

impl AssetPolicy {
    pub fn new(allowed_hosts: Vec<String>) -> Self {
        Self {
            allowed_hosts: allowed_hosts
                .into_iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Accept only https URLs on an allowed host
    pub fn validate(&self, raw: &str) -> Result<Url, RelayError> {
        let url = Url::parse(raw)
            .map_err(|e| RelayError::Validation(format!("Invalid asset url '{raw}': {e}")))?;

        if url.scheme() != "https" {
            return Err(RelayError::Validation(format!(
                "Asset url must use https: {raw}"
            )));
        }

        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        if !self.allowed_hosts.iter().any(|h| *h == host) {
            return Err(RelayError::Validation(format!(
                "Asset host '{host}' is not allowed"
            )));
        }

        Ok(url)
    }
}

/// reqwest implementation of ResourceFetcher
pub struct HttpAssetFetcher {
    client: Client,
}

impl HttpAssetFetcher {
    pub fn new(timeout: Duration) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("herald/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RelayError::ExternalService(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ResourceFetcher for HttpAssetFetcher {
    type Output = Asset;

    async fn fetch(&self, key: &str) -> Result<Asset, RelayError> {
        let mut response = self
            .client
            .get(key)
            .send()
            .await
            .map_err(|e| RelayError::TransientFetch(format!("{key}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::TransientFetch(format!(
                "{key}: upstream returned {status}"
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        // Refuse oversized bodies before and while reading them
        let declared = response.content_length().unwrap_or(0);
        within_limit(key, usize::try_from(declared).unwrap_or(usize::MAX))?;

        let mut body = Vec::with_capacity(declared.min(MAX_ASSET_BYTES as u64) as usize);
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| RelayError::TransientFetch(format!("{key}: {e}")))?
        {
            within_limit(key, body.len() + chunk.len())?;
            body.extend_from_slice(&chunk);
        }

        Ok(Asset {
            bytes: Bytes::from(body),
            content_type,
        })
    }
}

fn within_limit(key: &str, len: usize) -> Result<(), RelayError> {
    if len > MAX_ASSET_BYTES {
        return Err(RelayError::TransientFetch(format!(
            "{key}: body of {len} bytes exceeds limit"
        )));
    }
    Ok(())
}
