//! Herald API Routes
//!
//! - /embeds, /messages - cached snapshots (ETag aware)
//! - /channels/:channel_id/... - user actions relayed to the platform
//! - /ws/embeds, /ws/messages - live streams
//! - /assets - remote asset proxy

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use herald::RelayError;
use serde::Serialize;
use sha2::{Digest, Sha256};

pub mod assets;
pub mod controls;
pub mod embeds;
pub mod messages;
pub mod swagger;
pub mod ws;

/// Error half of every handler result
pub type ApiError = (StatusCode, String);

pub fn status_for(error: &RelayError) -> StatusCode {
    match error {
        RelayError::Validation(_)
        | RelayError::MalformedId(_)
        | RelayError::CapacityRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RelayError::NotFound { .. } => StatusCode::NOT_FOUND,
        RelayError::QueueFull { .. } | RelayError::QueueClosed | RelayError::Unavailable(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        RelayError::TransientFetch(_) | RelayError::ExternalService(_) => StatusCode::BAD_GATEWAY,
        RelayError::QueueTask(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn api_error(error: RelayError) -> ApiError {
    let status = status_for(&error);
    if status.is_server_error() {
        tracing::warn!(error = %error, status = %status, "Request failed");
    }
    (status, error.to_string())
}

/// JSON snapshot with a content-hash ETag; 304 when the client already has it
pub fn snapshot_response<T: Serialize>(headers: &HeaderMap, body: &T) -> Result<Response, ApiError> {
    let json = serde_json::to_vec(body)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let etag = format!("\"{}\"", hex::encode(Sha256::digest(&json)));

    let cached = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| etag_matches(v, &etag));
    if cached {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
    }

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            ),
            (
                header::ETAG,
                HeaderValue::from_str(&etag)
                    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?,
            ),
        ],
        json,
    )
        .into_response())
}

fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (RelayError::Validation("x".into()), 422),
            (RelayError::MalformedId("x".into()), 422),
            (RelayError::CapacityRejected("x".into()), 422),
            (RelayError::not_found("Embed", "1"), 404),
            (RelayError::QueueFull { capacity: 1 }, 503),
            (RelayError::QueueClosed, 503),
            (RelayError::Unavailable("x".into()), 503),
            (RelayError::TransientFetch("x".into()), 502),
            (RelayError::ExternalService("x".into()), 502),
            (RelayError::QueueTask("x".into()), 500),
        ];
        for (error, status) in cases {
            assert_eq!(status_for(&error).as_u16(), status, "{error}");
        }
    }

    #[test]
    fn test_etag_matching() {
        let etag = "\"abc\"";
        assert!(etag_matches("\"abc\"", etag));
        assert!(etag_matches("\"zzz\", W/\"abc\"", etag));
        assert!(etag_matches("*", etag));
        assert!(!etag_matches("\"abd\"", etag));
    }

    #[test]
    fn test_snapshot_response_etag() {
        let body = vec!["a", "b"];
        let first = snapshot_response(&HeaderMap::new(), &body).unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let etag = first.headers()[header::ETAG].clone();
        assert_eq!(etag.len(), 66);

        let mut headers = HeaderMap::new();
        headers.insert(header::IF_NONE_MATCH, etag);
        let second = snapshot_response(&headers, &body).unwrap();
        assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    }
}
