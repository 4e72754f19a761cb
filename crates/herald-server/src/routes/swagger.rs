//! OpenAPI Documentation
//!
//! Centralized API documentation using utoipa.

use utoipa::OpenApi;

use herald::{
    ButtonRecord, ChatMessageRecord, EmbedAuthor, EmbedField, EmbedRecord, MentionRecord, Topic,
};

use crate::models::{ControlPressRequest, HealthCheck, PostEmbedRequest, SendMessageRequest};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::health_check,
        // Embed endpoints
        super::embeds::list_recent_embeds,
        super::embeds::list_channel_embeds,
        super::embeds::post_embed,
        super::controls::press_control,
        // Message endpoints
        super::messages::list_messages,
        super::messages::send_message,
        // Streams
        super::ws::stream_embeds,
        super::ws::stream_messages,
        // Assets
        super::assets::get_asset,
    ),
    info(
        title = "Herald API",
        version = "0.1.0",
        description = "Chat-platform relay: cached event embeds and channel chat for overlays and dashboards, with user actions relayed back.",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Current server"),
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Embeds", description = "Event embeds and their controls"),
        (name = "Messages", description = "Channel chat"),
        (name = "Streams", description = "WebSocket live streams"),
        (name = "Assets", description = "Remote asset proxy"),
    ),
    components(
        schemas(
            HealthCheck,
            // Records
            EmbedRecord,
            EmbedAuthor,
            EmbedField,
            ButtonRecord,
            ChatMessageRecord,
            MentionRecord,
            Topic,
            // Requests
            SendMessageRequest,
            PostEmbedRequest,
            ControlPressRequest,
        )
    ),
)]
pub struct ApiDoc;
