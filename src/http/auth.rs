use axum::http::{HeaderMap, header::AUTHORIZATION};

use super::router::ApiError;

/// Header carrying the caller id.
pub(super) const CALLER_HEADER: &str = "x-user-id";

/// Checks `Authorization: Bearer <key>` when a client key is configured.
pub(super) fn authorize(headers: &HeaderMap, client_key: Option<&str>) -> Result<(), ApiError> {
    let Some(expected) = client_key else {
        return Ok(());
    };
    let provided = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if provided == Some(expected) {
        Ok(())
    } else {
        Err(ApiError::unauthorized())
    }
}

/// Caller id from [`CALLER_HEADER`], trimmed; empty when absent.
pub(super) fn caller_id(headers: &HeaderMap) -> String {
    headers
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}
