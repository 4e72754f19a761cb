//! Health check payload

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub status: String,
    pub message: String,
    pub version: String,
    /// Name of the connected chat platform, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_healthy: Option<bool>,
    pub embed_subscribers: usize,
    pub message_subscribers: usize,
    pub pending_dispatches: usize,
}
