// crates/server/src/lib.rs
//! Runwatch server library.
//!
//! Axum HTTP server that starts test-runner sessions and serves their
//! progress, statistics, logs and per-case status while they execute.

pub mod config;
pub mod error;
pub mod execution;
pub mod metrics;
pub mod routes;
pub mod service;
pub mod state;

pub use config::ServerConfig;
pub use error::*;
pub use execution::{ExecutionRunner, RunHandle, WorkerPhase};
pub use metrics::init_metrics;
pub use routes::api_routes;
pub use service::SessionService;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
pub fn create_app(config: ServerConfig) -> Router {
    create_app_with_state(AppState::new(config))
}

/// Same as [`create_app`] but with caller-owned state, so tests and the
/// binary can reach the store directly.
pub fn create_app_with_state(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
