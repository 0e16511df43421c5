// crates/server/src/routes/runs.rs
//! Run control endpoints.
//!
//! - POST /run - start a new session
//! - POST /stop?session_id= - advisory stop request
//! - GET /worker?session_id= - worker phase diagnostics

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use runwatch_core::views::RunResponse;
use runwatch_core::RunRequest;
use serde::Serialize;

use super::sessions::SessionQuery;
use crate::error::{ApiError, ApiResult};
use crate::execution::WorkerSnapshot;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct StopResponse {
    pub session_id: String,
    pub stop_requested: bool,
}

/// POST /api/run - the body is optional; every field has a default.
async fn start_run(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<RunResponse>)> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        RunRequest::default()
    } else {
        serde_json::from_slice::<RunRequest>(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid run request: {e}")))?
    };

    // The worker keeps running after the handle is dropped.
    let (response, _handle) = state.service.create_session(&request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/stop
async fn stop_run(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<(StatusCode, Json<StopResponse>)> {
    let session_id = query.require()?;
    if !state.runner.request_stop(session_id) {
        return Err(ApiError::SessionNotFound(session_id.to_string()));
    }
    Ok((
        StatusCode::ACCEPTED,
        Json(StopResponse {
            session_id: session_id.to_string(),
            stop_requested: true,
        }),
    ))
}

/// GET /api/worker
async fn get_worker(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<WorkerSnapshot>> {
    let session_id = query.require()?;
    state
        .runner
        .worker(session_id)
        .map(Json)
        .ok_or_else(|| ApiError::SessionNotFound(session_id.to_string()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/run", post(start_run))
        .route("/stop", post(stop_run))
        .route("/worker", get(get_worker))
}
