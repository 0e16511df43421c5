// crates/server/src/execution/state.rs
//! Atomic state for a single execution worker.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use runwatch_core::SessionId;

use super::types::{WorkerPhase, WorkerSnapshot};

/// Lock-free phase tracking so pollers never contend with the worker.
pub struct WorkerState {
    session_id: SessionId,
    phase: AtomicU8,
    stop_requested: AtomicBool,
}

impl WorkerState {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            phase: AtomicU8::new(WorkerPhase::Idle as u8),
            stop_requested: AtomicBool::new(false),
        }
    }

    pub fn phase(&self) -> WorkerPhase {
        let raw = self.phase.load(Ordering::Acquire);
        WorkerPhase::from_u8(raw).unwrap_or(WorkerPhase::Terminal)
    }

    pub fn set_phase(&self, phase: WorkerPhase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    /// Raise the advisory stop flag. The worker does not act on it.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Relaxed);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> WorkerSnapshot {
        WorkerSnapshot {
            session_id: self.session_id.clone(),
            phase: self.phase(),
            stop_requested: self.stop_requested(),
        }
    }
}
