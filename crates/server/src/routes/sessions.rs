// crates/server/src/routes/sessions.rs
//! Read-only session views.
//!
//! - GET /progress?session_id=
//! - GET /stats?session_id=
//! - GET /logs?session_id=&level=&limit=
//! - GET /case_status?session_id=
//! - GET /current_case_info?session_id=
//! - GET /ui_lock?session_id=

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use runwatch_core::views::{
    self, CaseStatusEntry, CurrentCaseView, LogEntryView, LogQuery, ProgressView, StatsView,
    UiLockView,
};
use runwatch_core::{LogLevel, SessionRecord};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `?session_id=` on every session endpoint. Missing or blank ids are a 400.
#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: Option<String>,
}

impl SessionQuery {
    pub fn require(&self) -> ApiResult<&str> {
        require_session_id(self.session_id.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub session_id: Option<String>,
    pub level: Option<String>,
    pub limit: Option<i64>,
}

pub(crate) fn require_session_id(id: Option<&str>) -> ApiResult<&str> {
    id.map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("session_id is required".to_string()))
}

/// Project one session, mapping an unknown id to 404.
pub(crate) fn project<T>(
    state: &AppState,
    session_id: &str,
    f: impl FnOnce(&SessionRecord) -> T,
) -> ApiResult<T> {
    state
        .store
        .project(session_id, f)
        .ok_or_else(|| ApiError::SessionNotFound(session_id.to_string()))
}

/// GET /api/progress
async fn get_progress(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<ProgressView>> {
    project(&state, query.require()?, views::progress).map(Json)
}

/// GET /api/stats
async fn get_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<StatsView>> {
    project(&state, query.require()?, views::stats).map(Json)
}

/// GET /api/logs - optional level filter, then the last `limit` entries.
/// A negative or zero limit is ignored.
async fn get_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> ApiResult<Json<Vec<LogEntryView>>> {
    let session_id = require_session_id(query.session_id.as_deref())?;
    let level = query
        .level
        .as_deref()
        .filter(|l| !l.trim().is_empty())
        .map(str::parse::<LogLevel>)
        .transpose()?;
    let limit = query.limit.and_then(|l| usize::try_from(l).ok());
    let filter = LogQuery { level, limit };

    project(&state, session_id, |s| views::logs(s, filter)).map(Json)
}

/// GET /api/case_status
async fn get_case_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<Vec<CaseStatusEntry>>> {
    project(&state, query.require()?, views::case_status).map(Json)
}

/// GET /api/current_case_info
async fn get_current_case(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<CurrentCaseView>> {
    project(&state, query.require()?, views::current_case).map(Json)
}

/// GET /api/ui_lock
async fn get_ui_lock(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<UiLockView>> {
    project(&state, query.require()?, views::ui_lock).map(Json)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/progress", get(get_progress))
        .route("/stats", get(get_stats))
        .route("/logs", get(get_logs))
        .route("/case_status", get(get_case_status))
        .route("/current_case_info", get(get_current_case))
        .route("/ui_lock", get(get_ui_lock))
}
