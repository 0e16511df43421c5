// crates/server/src/service.rs
//! Run intake: turn a request into a started session.

use std::sync::Arc;

use runwatch_core::{views, LogLevel, RunRequest, SessionStore};

use crate::error::{ApiError, ApiResult};
use crate::execution::{ExecutionRunner, RunHandle};

pub struct SessionService {
    store: Arc<SessionStore>,
    runner: Arc<ExecutionRunner>,
}

impl SessionService {
    pub fn new(store: Arc<SessionStore>, runner: Arc<ExecutionRunner>) -> Self {
        Self { store, runner }
    }

    /// Create a session, seed requested cases, lock the UI and start the
    /// worker. Returns the run response and the worker handle.
    pub async fn create_session(&self, request: &RunRequest) -> ApiResult<(views::RunResponse, RunHandle)> {
        let session_id = self.store.create().id;

        let cases = request.selected_cases();
        if !cases.is_empty() {
            self.store.initialize_cases(&session_id, &cases);
        }
        self.store.set_ui_lock(&session_id, true);

        let payload = serde_json::json!({
            "project": request.project,
            "target_root": request.target_root,
            "target_name": request.target_name,
            "case_names": request.case_names,
            "settings_dir": request.settings_dir,
        });
        self.store.append_log(
            &session_id,
            LogLevel::Info,
            format!("Received payload: {payload}"),
        );
        tracing::info!(session_id = %session_id, project = %request.project_name(), "Run requested");

        let handle = self.runner.start(&session_id, request).await;

        let response = self
            .store
            .project(&session_id, views::run_response)
            .ok_or_else(|| ApiError::Internal(format!("session {session_id} vanished after creation")))?;
        Ok((response, handle))
    }
}
