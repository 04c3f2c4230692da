//! Routes over a [`QueueHandle`].
//!
//! Errors are JSON `{"error": "<message>"}`. Quota rejections are 429; a
//! caller cooldown also sets `Retry-After` in whole seconds.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{RejectReason, StatusError, SubmitError},
    ledger::UsageView,
    queue::{QueueHandle, QueueStats, Submitted},
    store::JobView,
};

use super::auth::{authorize, caller_id};

/// Shared router state.
#[derive(Clone)]
pub struct AppState {
    queue: QueueHandle,
    client_key: Option<Arc<str>>,
}

/// Request body for `POST /jobs`.
#[derive(Debug, Default, Deserialize)]
struct SubmitRequest {
    #[serde(default)]
    query: Option<String>,
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    queue: Option<QueueStats>,
}

/// JSON error response.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    message: String,
    retry_after_secs: Option<u64>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            retry_after_secs: None,
        }
    }

    pub(crate) fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    fn closed() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "queue is shutting down")
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Rejected(reason) => {
                let status = if reason.is_quota() {
                    StatusCode::TOO_MANY_REQUESTS
                } else {
                    StatusCode::BAD_REQUEST
                };
                let retry_after_secs = match reason {
                    RejectReason::CallerCoolingDown { retry_after_secs } => Some(retry_after_secs),
                    _ => None,
                };
                Self {
                    retry_after_secs,
                    ..Self::new(status, reason.to_string())
                }
            }
            SubmitError::Closed => Self::closed(),
        }
    }
}

impl From<StatusError> for ApiError {
    fn from(err: StatusError) -> Self {
        match err {
            StatusError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Job not found"),
            StatusError::Closed => Self::closed(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        let mut res = (self.status, body).into_response();
        if let Some(secs) = self.retry_after_secs {
            res.headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        res
    }
}

async fn handle_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Submitted>), ApiError> {
    authorize(&headers, state.client_key.as_deref())?;
    let caller = caller_id(&headers);
    // Body problems surface as a missing query, after the quota checks.
    let query = serde_json::from_slice::<SubmitRequest>(&body)
        .unwrap_or_default()
        .query
        .unwrap_or_default();

    let submitted = state.queue.submit(caller, query).await?;
    Ok((StatusCode::ACCEPTED, Json(submitted)))
}

async fn handle_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<JobView>, ApiError> {
    authorize(&headers, state.client_key.as_deref())?;
    let view = state.queue.status_by_str(&id).await?;
    Ok(Json(view))
}

async fn handle_usage(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UsageView>, ApiError> {
    authorize(&headers, state.client_key.as_deref())?;
    let caller = caller_id(&headers);
    if caller.is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Missing user ID"));
    }
    let usage = state
        .queue
        .usage(caller)
        .await
        .map_err(|_| ApiError::closed())?;
    Ok(Json(usage))
}

async fn handle_health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.queue.stats().await {
        Ok(stats) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                queue: Some(stats),
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unavailable",
                queue: None,
            }),
        ),
    }
}

/// Builds the router.
///
/// With `client_key` set, every route except `/health` requires
/// `Authorization: Bearer <client_key>`.
pub fn router(queue: QueueHandle, client_key: Option<String>) -> Router {
    let state = AppState {
        queue,
        client_key: client_key.map(Arc::from),
    };
    Router::new()
        .route("/health", get(handle_health))
        .route("/jobs", post(handle_submit))
        .route("/jobs/{id}", get(handle_status))
        .route("/usage", get(handle_usage))
        .with_state(state)
}
