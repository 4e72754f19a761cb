//! Relay requests - user actions forwarded to the chat platform

use herald::{EmbedDraft, EmbedField};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Relay a chat line
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    /// Display name of the user the line is sent for
    pub actor: String,
    pub content: String,
}

/// Post an event embed
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostEmbedRequest {
    pub actor: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<u32>,
    #[serde(default)]
    pub fields: Option<Vec<EmbedField>>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Button labels, row by row (at most 5x5)
    #[serde(default)]
    pub rows: Option<Vec<Vec<String>>>,
}

impl PostEmbedRequest {
    /// Split into the embed content and the button rows
    pub fn into_parts(self) -> (String, EmbedDraft, Vec<Vec<String>>) {
        let draft = EmbedDraft {
            title: self.title,
            description: self.description,
            color: self.color,
            fields: self.fields.unwrap_or_default(),
            image_url: self.image_url,
            thumbnail_url: self.thumbnail_url,
        };
        (self.actor, draft, self.rows.unwrap_or_default())
    }
}

/// Overlay control press
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ControlPressRequest {
    pub actor: String,
    /// Encoded control id, or a bare RSVP emoji for reaction-tallied controls
    pub custom_id: String,
}

/// WebSocket subscription scope
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StreamQuery {
    /// Only relay this channel
    pub channel: Option<String>,
}

/// Remote asset to proxy
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AssetQuery {
    /// https URL on an allowed host
    pub url: String,
}
