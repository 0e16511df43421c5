// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use runwatch_core::SessionStore;

use crate::config::ServerConfig;
use crate::execution::ExecutionRunner;
use crate::service::SessionService;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Every session created since startup.
    pub store: Arc<SessionStore>,
    /// Starts one execution worker per session.
    pub runner: Arc<ExecutionRunner>,
    /// Request intake for new runs.
    pub service: SessionService,
    pub config: ServerConfig,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let store = Arc::new(SessionStore::with_log_capacity(config.log_capacity));
        let runner = Arc::new(ExecutionRunner::new(
            Arc::clone(&store),
            config.runner.clone(),
            config.output_root.clone(),
        ));
        let service = SessionService::new(Arc::clone(&store), Arc::clone(&runner));
        Arc::new(Self {
            start_time: Instant::now(),
            store,
            runner,
            service,
            config,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_uses_configured_capacity() {
        let state = AppState::new(ServerConfig {
            log_capacity: 7,
            ..ServerConfig::default()
        });
        assert_eq!(state.store.log_capacity(), 7);
        assert!(state.store.is_empty());
        assert!(state.uptime_secs() < 5);
    }
}
