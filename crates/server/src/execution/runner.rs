// crates/server/src/execution/runner.rs
//! Starts execution workers and tracks their phase.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use chrono::Local;
use runwatch_core::{plan_run, LogLevel, RunRequest, RunnerProgram, SessionId, SessionStore, Totals};

use super::state::WorkerState;
use super::types::{RunHandle, WorkerPhase, WorkerSnapshot};
use super::worker::{self, WorkerContext};
use crate::metrics;

/// Launches one worker per session against a shared [`SessionStore`].
///
/// Thread-safe via `Arc` wrapping. There is no bound on concurrent workers.
pub struct ExecutionRunner {
    store: Arc<SessionStore>,
    program: RunnerProgram,
    output_root: PathBuf,
    workers: RwLock<HashMap<SessionId, Arc<WorkerState>>>,
}

impl ExecutionRunner {
    pub fn new(store: Arc<SessionStore>, program: RunnerProgram, output_root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            program,
            output_root: output_root.into(),
            workers: RwLock::new(HashMap::new()),
        }
    }

    pub fn program(&self) -> &RunnerProgram {
        &self.program
    }

    /// Start executing `request` for an existing session.
    ///
    /// Marks the session `RUNNING`, prepares the output directory and
    /// command on the blocking pool, then spawns the worker task and returns
    /// without waiting for it. If the run cannot be prepared the session is
    /// finished `FAILED` here and no task is spawned. Starting twice for one
    /// session is not guarded against.
    pub async fn start(&self, session_id: &str, request: &RunRequest) -> RunHandle {
        let state = Arc::new(WorkerState::new(session_id.to_string()));
        match self.workers.write() {
            Ok(mut workers) => {
                workers.insert(session_id.to_string(), Arc::clone(&state));
            }
            Err(e) => tracing::error!("RwLock poisoned writing workers map: {e}"),
        }

        self.store.mark_started(session_id);
        metrics::record_session_started();
        let started_at = self.store.project(session_id, |s| s.started_at).flatten();

        let planned = {
            let program = self.program.clone();
            let output_root = self.output_root.clone();
            let request = request.clone();
            tokio::task::spawn_blocking(move || {
                plan_run(&program, &output_root, &request, Local::now()).map_err(|e| e.to_string())
            })
            .await
            .unwrap_or_else(|e| Err(format!("Run preparation task failed: {e}")))
        };

        let plan = match planned {
            Ok(plan) => plan,
            Err(message) => {
                tracing::error!(session_id = %session_id, error = %message, "Failed to prepare run");
                self.store.append_log(session_id, LogLevel::Error, message);
                worker::finish(
                    &self.store,
                    session_id,
                    &state,
                    false,
                    Totals::default(),
                    started_at,
                );
                return RunHandle::new(session_id.to_string(), state, None);
            }
        };

        self.store.set_artifacts(session_id, plan.artifacts.clone());
        let command_line = plan.command_line();
        tracing::info!(session_id = %session_id, command = %command_line, "Starting runner");
        self.store.append_log(
            session_id,
            LogLevel::Info,
            format!("Starting runner: {command_line}"),
        );
        self.store.append_log(
            session_id,
            LogLevel::Info,
            format!("Output dir: {}", plan.output_dir.display()),
        );

        let task = tokio::spawn(worker::execute(WorkerContext {
            store: Arc::clone(&self.store),
            session_id: session_id.to_string(),
            plan,
            state: Arc::clone(&state),
            started_at,
        }));

        RunHandle::new(session_id.to_string(), state, Some(task))
    }

    /// Record an advisory stop request. The runner process is not signalled.
    ///
    /// Returns `false` if the session is unknown.
    pub fn request_stop(&self, session_id: &str) -> bool {
        if self.store.project(session_id, |_| ()).is_none() {
            return false;
        }
        tracing::warn!(session_id = %session_id, "Stop requested; cancellation is not implemented");
        self.store.append_log(
            session_id,
            LogLevel::Warn,
            "Stop requested (not yet implemented).",
        );
        if let Some(state) = self.worker_state(session_id) {
            state.request_stop();
        }
        true
    }

    pub fn phase(&self, session_id: &str) -> Option<WorkerPhase> {
        self.worker_state(session_id).map(|s| s.phase())
    }

    pub fn worker(&self, session_id: &str) -> Option<WorkerSnapshot> {
        self.worker_state(session_id).map(|s| s.snapshot())
    }

    fn worker_state(&self, session_id: &str) -> Option<Arc<WorkerState>> {
        match self.workers.read() {
            Ok(workers) => workers.get(session_id).cloned(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading workers map: {e}");
                None
            }
        }
    }
}
