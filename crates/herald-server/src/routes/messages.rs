//! Message Routes - channel chat

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use herald::ChatMessageRecord;

use super::{api_error, snapshot_response, ApiError};
use crate::models::SendMessageRequest;
use crate::AppState;

/// Cached chat of one channel, oldest first
#[utoipa::path(
    get,
    path = "/messages/{channel_id}",
    params(("channel_id" = String, Path, description = "Channel ID")),
    responses(
        (status = 200, description = "Channel chat", body = Vec<ChatMessageRecord>),
        (status = 304, description = "Snapshot unchanged since the given ETag")
    ),
    tag = "Messages"
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    snapshot_response(&headers, &state.relay.cache().messages(&channel_id))
}

/// Relay a chat line to the channel
#[utoipa::path(
    post,
    path = "/channels/{channel_id}/messages",
    params(("channel_id" = String, Path, description = "Channel ID")),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Message relayed", body = ChatMessageRecord),
        (status = 422, description = "Empty actor or content"),
        (status = 502, description = "Platform call failed"),
        (status = 503, description = "No platform or dispatch queue full")
    ),
    tag = "Messages"
)]
pub async fn send_message(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<ChatMessageRecord>, ApiError> {
    let record = state
        .relay
        .send_message(&channel_id, &payload.actor, &payload.content)
        .await
        .map_err(api_error)?;

    Ok(Json(record))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages/:channel_id", get(list_messages))
        .route("/channels/:channel_id/messages", post(send_message))
}
