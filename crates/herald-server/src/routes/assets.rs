//! Asset Proxy Route
//!
//! Serves remote images through the shared fetch cache so many overlay
//! clients cost one upstream request per TTL.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use super::{api_error, ApiError};
use crate::models::AssetQuery;
use crate::AppState;

const ASSET_CACHE_CONTROL: &str = "public, max-age=3600";

/// Proxy a remote asset
#[utoipa::path(
    get,
    path = "/assets",
    params(AssetQuery),
    responses(
        (status = 200, description = "Asset body with upstream content type"),
        (status = 422, description = "URL is not https or host is not allowed"),
        (status = 502, description = "Upstream fetch failed")
    ),
    tag = "Assets"
)]
pub async fn get_asset(
    State(state): State<AppState>,
    Query(query): Query<AssetQuery>,
) -> Result<Response, ApiError> {
    let url = state.asset_policy.validate(&query.url).map_err(api_error)?;

    let asset = state.assets.get(url.as_str()).await.ok_or_else(|| {
        (
            StatusCode::BAD_GATEWAY,
            format!("Failed to fetch asset {url}"),
        )
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, asset.content_type),
            (header::CACHE_CONTROL, ASSET_CACHE_CONTROL.to_string()),
        ],
        asset.bytes,
    )
        .into_response())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/assets", get(get_asset))
}
