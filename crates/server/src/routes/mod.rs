//! API route handlers for the runwatch server.

pub mod health;
pub mod metrics;
pub mod runs;
pub mod sessions;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined router: API routes under /api plus /metrics.
///
/// Routes:
/// - GET  /api/health - Health check
/// - POST /api/run - Start a session
/// - POST /api/stop?session_id= - Advisory stop request
/// - GET  /api/worker?session_id= - Worker phase
/// - GET  /api/progress?session_id= - Progress view
/// - GET  /api/stats?session_id= - Stats view
/// - GET  /api/logs?session_id=&level=&limit= - Logs view
/// - GET  /api/case_status?session_id= - Per-case status
/// - GET  /api/current_case_info?session_id= - Current case
/// - GET  /api/ui_lock?session_id= - UI lock flag
/// - GET  /metrics - Prometheus metrics
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest(
            "/api",
            health::router()
                .merge(runs::router())
                .merge(sessions::router()),
        )
        .merge(metrics::router())
        .with_state(state)
}
