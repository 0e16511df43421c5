// crates/server/src/execution/types.rs
//! Types for the execution worker.

use std::sync::Arc;

use runwatch_core::SessionId;
use serde::Serialize;
use tokio::task::JoinHandle;

use super::state::WorkerState;

/// Lifecycle phase of one execution worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum WorkerPhase {
    /// Registered, process not launched yet.
    Idle = 0,
    /// Launching the runner process.
    Spawning = 1,
    /// Reading runner output.
    Streaming = 2,
    /// Output closed, waiting for the exit status.
    Draining = 3,
    /// Session finalized.
    Terminal = 4,
}

impl WorkerPhase {
    pub(crate) fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Idle),
            1 => Some(Self::Spawning),
            2 => Some(Self::Streaming),
            3 => Some(Self::Draining),
            4 => Some(Self::Terminal),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Spawning => "spawning",
            Self::Streaming => "streaming",
            Self::Draining => "draining",
            Self::Terminal => "terminal",
        }
    }
}

/// Point-in-time view of a worker, served by `GET /api/worker`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct WorkerSnapshot {
    pub session_id: SessionId,
    pub phase: WorkerPhase,
    pub stop_requested: bool,
}

/// Handle to a started worker.
///
/// Dropping the handle detaches the task; the worker still runs to
/// completion.
pub struct RunHandle {
    pub session_id: SessionId,
    state: Arc<WorkerState>,
    task: Option<JoinHandle<()>>,
}

impl RunHandle {
    pub(crate) fn new(
        session_id: SessionId,
        state: Arc<WorkerState>,
        task: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            session_id,
            state,
            task,
        }
    }

    pub fn phase(&self) -> WorkerPhase {
        self.state.phase()
    }

    /// Wait for the worker task to finish.
    pub async fn wait(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(session_id = %self.session_id, error = %e, "Execution worker task failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_phase_discriminants() {
        for phase in [
            WorkerPhase::Idle,
            WorkerPhase::Spawning,
            WorkerPhase::Streaming,
            WorkerPhase::Draining,
            WorkerPhase::Terminal,
        ] {
            assert_eq!(WorkerPhase::from_u8(phase as u8), Some(phase));
        }
        assert_eq!(WorkerPhase::from_u8(9), None);
    }

    #[test]
    fn test_worker_snapshot_serialize() {
        let snap = WorkerSnapshot {
            session_id: "abc".into(),
            phase: WorkerPhase::Streaming,
            stop_requested: true,
        };
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"phase\":\"streaming\""));
        assert!(json.contains("\"stop_requested\":true"));

        let back: WorkerSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }

    #[tokio::test]
    async fn test_run_handle_without_task() {
        let state = Arc::new(WorkerState::new("abc".into()));
        state.set_phase(WorkerPhase::Terminal);
        let handle = RunHandle::new("abc".into(), state, None);
        assert_eq!(handle.phase(), WorkerPhase::Terminal);
        handle.wait().await;
    }
}
