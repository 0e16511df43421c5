// crates/server/src/routes/health.rs
//! GET /health - liveness plus a session count, so a client can tell a
//! restarted server (empty store) from a live one.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use runwatch_core::SessionStatus;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Sessions created since startup.
    pub sessions: usize,
    /// Sessions whose runner is still executing.
    pub running: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        sessions: state.store.len(),
        running: state.store.count_by_status(SessionStatus::Running),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}
