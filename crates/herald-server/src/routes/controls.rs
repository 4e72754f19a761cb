//! Control Routes - overlay button presses relayed as reactions

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use herald::EmbedRecord;

use super::{api_error, ApiError};
use crate::models::ControlPressRequest;
use crate::AppState;

/// Press a control on an event embed
#[utoipa::path(
    post,
    path = "/channels/{channel_id}/embeds/{message_id}/controls",
    params(
        ("channel_id" = String, Path, description = "Channel ID"),
        ("message_id" = String, Path, description = "Embed message ID")
    ),
    request_body = ControlPressRequest,
    responses(
        (status = 200, description = "Reaction added; refreshed embed", body = EmbedRecord),
        (status = 404, description = "Embed or control not found"),
        (status = 422, description = "Malformed or non-RSVP control id"),
        (status = 502, description = "Platform call failed"),
        (status = 503, description = "No platform or dispatch queue full")
    ),
    tag = "Embeds"
)]
pub async fn press_control(
    State(state): State<AppState>,
    Path((channel_id, message_id)): Path<(String, String)>,
    Json(payload): Json<ControlPressRequest>,
) -> Result<Json<EmbedRecord>, ApiError> {
    let record = state
        .relay
        .press_control(&channel_id, &message_id, &payload.actor, &payload.custom_id)
        .await
        .map_err(api_error)?;

    Ok(Json(record))
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/channels/:channel_id/embeds/:message_id/controls",
        post(press_control),
    )
}
