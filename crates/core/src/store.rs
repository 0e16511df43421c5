// crates/core/src/store.rs
//! In-memory session store.
//!
//! [`SessionStore`] owns every [`SessionRecord`] behind a single
//! `std::sync::RwLock`. Writers (one execution worker per session plus the
//! request path that creates it) take the write lock for each mutation;
//! pollers take the read lock and either clone the record or run a pure
//! projection over it, so a reader never observes a half-applied update.
//!
//! The lock is never held across an `.await`.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::types::{
    LogLevel, LogLine, Outcome, Progress, SessionId, SessionRecord, SessionStatus, Totals,
};

/// Default number of log entries retained per session.
pub const MAX_LOG_LINES: usize = 1000;

pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SessionRecord>>,
    log_capacity: usize,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_log_capacity(MAX_LOG_LINES)
    }

    /// Create a store retaining at most `log_capacity` log entries per session.
    pub fn with_log_capacity(log_capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            log_capacity: log_capacity.max(1),
        }
    }

    pub fn log_capacity(&self) -> usize {
        self.log_capacity
    }

    /// Create a new `PENDING` session and return a snapshot of it.
    pub fn create(&self) -> SessionRecord {
        let id = uuid::Uuid::new_v4().to_string();
        let mut record = SessionRecord::new(id.clone(), Utc::now());
        push_log(&mut record, self.log_capacity, LogLevel::Info, "Session created.");

        let snapshot = record.clone();
        match self.sessions.write() {
            Ok(mut sessions) => {
                sessions.insert(id.clone(), record);
            }
            Err(e) => tracing::error!("RwLock poisoned writing sessions map: {e}"),
        }
        tracing::info!(session_id = %id, "Session created");
        snapshot
    }

    /// Snapshot of a session, or `None` if the id is unknown.
    pub fn get(&self, id: &str) -> Option<SessionRecord> {
        self.project(id, SessionRecord::clone)
    }

    /// Run a read-only projection over one session under the read lock.
    pub fn project<T>(&self, id: &str, f: impl FnOnce(&SessionRecord) -> T) -> Option<T> {
        match self.sessions.read() {
            Ok(sessions) => sessions.get(id).map(f),
            Err(e) => {
                tracing::error!("RwLock poisoned reading sessions map: {e}");
                None
            }
        }
    }

    /// Number of sessions ever created.
    pub fn len(&self) -> usize {
        match self.sessions.read() {
            Ok(sessions) => sessions.len(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading sessions map: {e}");
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sessions currently in `status`.
    pub fn count_by_status(&self, status: SessionStatus) -> usize {
        match self.sessions.read() {
            Ok(sessions) => sessions.values().filter(|s| s.status == status).count(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading sessions map: {e}");
                0
            }
        }
    }

    /// Ids of every known session, sorted.
    pub fn ids(&self) -> Vec<SessionId> {
        match self.sessions.read() {
            Ok(sessions) => {
                let mut ids: Vec<_> = sessions.keys().cloned().collect();
                ids.sort();
                ids
            }
            Err(e) => {
                tracing::error!("RwLock poisoned reading sessions map: {e}");
                Vec::new()
            }
        }
    }

    /// Append one log entry, evicting the oldest entries past capacity.
    /// Unknown ids are ignored.
    pub fn append_log(&self, id: &str, level: LogLevel, message: impl Into<String>) {
        let capacity = self.log_capacity;
        let message = message.into();
        self.update(id, |s| push_log(s, capacity, level, message));
    }

    /// Seed the case map with `SCHEDULE` entries, replacing any prior map.
    pub fn initialize_cases<I, S>(&self, id: &str, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.update(id, |s| {
            s.cases.initialize(names);
            touch(s);
        });
    }

    pub fn set_status(&self, id: &str, status: SessionStatus) {
        self.update(id, |s| {
            s.status = status;
            touch(s);
        });
    }

    pub fn set_ui_lock(&self, id: &str, locked: bool) {
        self.update(id, |s| {
            s.ui_lock = locked;
            touch(s);
        });
    }

    /// Overwrite both step counters; negative values are clamped to zero.
    pub fn set_progress(&self, id: &str, current_step: i64, total_steps: i64) {
        self.update(id, |s| {
            s.progress = Progress {
                current_step: current_step.max(0) as u64,
                total_steps: total_steps.max(0) as u64,
            };
            touch(s);
        });
    }

    /// Write counters taken from a worker's [`crate::tally::RunTally`].
    pub fn apply_progress(&self, id: &str, progress: Progress) {
        self.update(id, |s| {
            s.progress = progress;
            touch(s);
        });
    }

    /// Merge entries into the session's artifact map.
    pub fn set_artifacts(&self, id: &str, artifacts: BTreeMap<String, String>) {
        self.update(id, |s| {
            s.stats.artifacts.extend(artifacts);
            touch(s);
        });
    }

    pub fn set_current_case(&self, id: &str, name: &str, documentation: Option<String>) {
        self.update(id, |s| {
            s.cases.set_current_case(name, documentation);
            touch(s);
        });
    }

    pub fn set_case_result(&self, id: &str, name: &str, outcome: Outcome) {
        self.update(id, |s| {
            s.cases.set_case_result(name, outcome);
            touch(s);
        });
    }

    /// Apply `outcome` to the session's current case in one step.
    ///
    /// Returns the case name, or `None` if the session is unknown or no case
    /// is being tracked.
    pub fn resolve_current_case(&self, id: &str, outcome: Outcome) -> Option<String> {
        self.update(id, |s| {
            let name = s.cases.resolve_current(outcome);
            if name.is_some() {
                touch(s);
            }
            name
        })
        .flatten()
    }

    /// Transition to `RUNNING`, stamp `started_at` and lock the UI.
    pub fn mark_started(&self, id: &str) {
        let capacity = self.log_capacity;
        self.update(id, |s| {
            let now = Utc::now();
            s.status = SessionStatus::Running;
            s.started_at = Some(now);
            s.ui_lock = true;
            s.updated_at = now;
            push_log(s, capacity, LogLevel::Info, "Execution started.");
        });
    }

    /// Transition to `COMPLETED`/`FAILED` and record final statistics.
    ///
    /// `success` comes from the runner's exit code alone; parsed failures in
    /// `totals` do not affect it.
    pub fn mark_finished(
        &self,
        id: &str,
        success: bool,
        totals: Totals,
        started_at: Option<DateTime<Utc>>,
    ) {
        let capacity = self.log_capacity;
        self.update(id, |s| {
            let now = Utc::now();
            s.status = if success {
                SessionStatus::Completed
            } else {
                SessionStatus::Failed
            };
            s.finished_at = Some(now);
            s.updated_at = now;
            s.stats.duration_seconds = started_at
                .map(|start| ((now - start).num_milliseconds().max(0)) as f64 / 1000.0)
                .unwrap_or(0.0);
            s.stats.success = success;
            s.stats.totals = totals;
            s.ui_lock = false;
            push_log(
                s,
                capacity,
                LogLevel::Info,
                format!(
                    "Execution finished. Success={} (Passed={}, Failed={}, Skipped={}).",
                    success, totals.passed, totals.failed, totals.skipped
                ),
            );
        });
        tracing::info!(
            session_id = %id,
            success,
            passed = totals.passed,
            failed = totals.failed,
            skipped = totals.skipped,
            "Session finished"
        );
    }

    fn update<T>(&self, id: &str, f: impl FnOnce(&mut SessionRecord) -> T) -> Option<T> {
        match self.sessions.write() {
            Ok(mut sessions) => sessions.get_mut(id).map(f),
            Err(e) => {
                tracing::error!("RwLock poisoned writing sessions map: {e}");
                None
            }
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn touch(s: &mut SessionRecord) {
    s.updated_at = Utc::now();
}

fn push_log(s: &mut SessionRecord, capacity: usize, level: LogLevel, message: impl Into<String>) {
    let now = Utc::now();
    s.logs.push_back(LogLine {
        timestamp: now,
        level,
        message: message.into(),
    });
    while s.logs.len() > capacity {
        s.logs.pop_front();
    }
    s.updated_at = now;
}
