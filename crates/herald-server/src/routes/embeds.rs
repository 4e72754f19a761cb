//! Embed Routes - event post snapshots and authoring
//!
//! HTTP handlers that delegate to RelayService.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use herald::EmbedRecord;

use super::{api_error, snapshot_response, ApiError};
use crate::models::PostEmbedRequest;
use crate::AppState;

/// Recent embeds across all channels, oldest first
#[utoipa::path(
    get,
    path = "/embeds",
    responses(
        (status = 200, description = "Recent embeds", body = Vec<EmbedRecord>),
        (status = 304, description = "Snapshot unchanged since the given ETag")
    ),
    tag = "Embeds"
)]
pub async fn list_recent_embeds(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    snapshot_response(&headers, &state.relay.cache().recent_embeds())
}

/// Embeds of one channel, oldest first
#[utoipa::path(
    get,
    path = "/embeds/{channel_id}",
    params(("channel_id" = String, Path, description = "Channel ID")),
    responses(
        (status = 200, description = "Channel embeds", body = Vec<EmbedRecord>),
        (status = 304, description = "Snapshot unchanged since the given ETag")
    ),
    tag = "Embeds"
)]
pub async fn list_channel_embeds(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    snapshot_response(&headers, &state.relay.cache().embeds(&channel_id))
}

/// Post an event embed with a button grid
#[utoipa::path(
    post,
    path = "/channels/{channel_id}/embeds",
    params(("channel_id" = String, Path, description = "Channel ID")),
    request_body = PostEmbedRequest,
    responses(
        (status = 200, description = "Embed posted", body = EmbedRecord),
        (status = 422, description = "Invalid embed or button grid too large"),
        (status = 502, description = "Platform call failed"),
        (status = 503, description = "No platform or dispatch queue full")
    ),
    tag = "Embeds"
)]
pub async fn post_embed(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Json(payload): Json<PostEmbedRequest>,
) -> Result<Json<EmbedRecord>, ApiError> {
    let (actor, draft, rows) = payload.into_parts();
    let record = state
        .relay
        .post_embed(&channel_id, &actor, draft, rows)
        .await
        .map_err(api_error)?;

    Ok(Json(record))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/embeds", get(list_recent_embeds))
        .route("/embeds/:channel_id", get(list_channel_embeds))
        .route("/channels/:channel_id/embeds", post(post_embed))
}
