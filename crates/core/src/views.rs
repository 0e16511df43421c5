// crates/core/src/views.rs
//! Read-only projections of a [`SessionRecord`] into response shapes.
//!
//! Every builder is a pure function of one record. Callers run them through
//! [`crate::store::SessionStore::project`] so they see a consistent snapshot.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{epoch_secs, CaseState, LogLevel, SessionRecord, SessionStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ProgressView {
    pub total_steps: u64,
    pub current_step: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct StatsView {
    pub duration_seconds: f64,
    pub steps_completed: u64,
    pub success: bool,
    pub artifacts: BTreeMap<String, String>,
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub started_at: Option<f64>,
    pub finished_at: Option<f64>,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct LogEntryView {
    pub timestamp: f64,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct CaseStatusEntry {
    pub name: String,
    pub status: CaseState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct CurrentCaseView {
    pub name: Option<String>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct UiLockView {
    pub locked: bool,
}

/// Response to a run request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct RunResponse {
    pub session_id: String,
    pub status: SessionStatus,
    pub created_at: f64,
    pub updated_at: f64,
}

/// Optional filters for the logs view. The level filter runs first, then
/// the result is trimmed to the last `limit` entries. A limit of zero
/// keeps everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogQuery {
    pub level: Option<LogLevel>,
    pub limit: Option<usize>,
}

pub fn progress(s: &SessionRecord) -> ProgressView {
    ProgressView {
        total_steps: s.progress.total_steps,
        current_step: s.progress.current_step,
        percent: s.progress.percent(),
    }
}

pub fn stats(s: &SessionRecord) -> StatsView {
    StatsView {
        duration_seconds: s.stats.duration_seconds,
        steps_completed: s.progress.current_step,
        success: s.stats.success,
        artifacts: s.stats.artifacts.clone(),
        passed: s.stats.totals.passed,
        failed: s.stats.totals.failed,
        skipped: s.stats.totals.skipped,
        started_at: s.started_at.map(epoch_secs),
        finished_at: s.finished_at.map(epoch_secs),
        status: s.status,
    }
}

pub fn logs(s: &SessionRecord, query: LogQuery) -> Vec<LogEntryView> {
    let matching: Vec<_> = s
        .logs
        .iter()
        .filter(|l| query.level.map_or(true, |level| l.level == level))
        .collect();
    let skip = query
        .limit
        .filter(|&limit| limit > 0)
        .map_or(0, |limit| matching.len().saturating_sub(limit));

    matching
        .into_iter()
        .skip(skip)
        .map(|l| LogEntryView {
            timestamp: epoch_secs(l.timestamp),
            level: l.level,
            message: l.message.clone(),
        })
        .collect()
}

pub fn case_status(s: &SessionRecord) -> Vec<CaseStatusEntry> {
    s.cases
        .entries()
        .into_iter()
        .map(|(name, status)| CaseStatusEntry {
            name: name.to_string(),
            status,
        })
        .collect()
}

pub fn current_case(s: &SessionRecord) -> CurrentCaseView {
    match s.cases.current() {
        Some(current) => CurrentCaseView {
            name: Some(current.name.clone()),
            documentation: current.documentation.clone(),
        },
        None => CurrentCaseView {
            name: None,
            documentation: None,
        },
    }
}

pub fn ui_lock(s: &SessionRecord) -> UiLockView {
    UiLockView { locked: s.ui_lock }
}

pub fn run_response(s: &SessionRecord) -> RunResponse {
    RunResponse {
        session_id: s.id.clone(),
        status: s.status,
        created_at: epoch_secs(s.created_at),
        updated_at: epoch_secs(s.updated_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SessionStore;
    use crate::types::{Outcome, Progress, Totals};
    use pretty_assertions::assert_eq;

    fn store_with_logs() -> (SessionStore, String) {
        let store = SessionStore::new();
        let id = store.create().id;
        for i in 0..10 {
            let level = if i % 2 == 0 { LogLevel::Error } else { LogLevel::Info };
            store.append_log(&id, level, format!("msg {i}"));
        }
        (store, id)
    }

    #[test]
    fn test_progress_view() {
        let store = SessionStore::new();
        let id = store.create().id;
        store.apply_progress(
            &id,
            Progress {
                current_step: 1,
                total_steps: 3,
            },
        );
        let view = store.project(&id, progress).unwrap();
        assert_eq!(
            view,
            ProgressView {
                total_steps: 3,
                current_step: 1,
                percent: 33.33
            }
        );
    }

    #[test]
    fn test_logs_level_then_limit() {
        let (store, id) = store_with_logs();
        let query = LogQuery {
            level: Some(LogLevel::Error),
            limit: Some(3),
        };
        let view = store.project(&id, |s| logs(s, query)).unwrap();
        let messages: Vec<_> = view.iter().map(|l| l.message.as_str()).collect();
        assert_eq!(messages, vec!["msg 4", "msg 6", "msg 8"]);
        assert!(view.iter().all(|l| l.level == LogLevel::Error));
        assert!(view.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_logs_error_limit_five() {
        let (store, id) = store_with_logs();
        let query = LogQuery {
            level: Some(LogLevel::Error),
            limit: Some(5),
        };
        let view = store.project(&id, |s| logs(s, query)).unwrap();
        assert_eq!(view.len(), 5);
        assert_eq!(view.last().unwrap().message, "msg 8");
    }

    #[test]
    fn test_logs_unfiltered() {
        let (store, id) = store_with_logs();
        let view = store.project(&id, |s| logs(s, LogQuery::default())).unwrap();
        // "Session created." plus ten appended entries
        assert_eq!(view.len(), 11);
        assert_eq!(view[0].message, "Session created.");
    }

    #[test]
    fn test_logs_limit_zero_and_oversized() {
        let (store, id) = store_with_logs();
        let zero = store
            .project(&id, |s| {
                logs(
                    s,
                    LogQuery {
                        level: None,
                        limit: Some(0),
                    },
                )
            })
            .unwrap();
        assert_eq!(zero.len(), 11);

        let all = store
            .project(&id, |s| {
                logs(
                    s,
                    LogQuery {
                        level: None,
                        limit: Some(500),
                    },
                )
            })
            .unwrap();
        assert_eq!(all.len(), 11);
    }

    #[test]
    fn test_case_status_and_current_case() {
        let store = SessionStore::new();
        let id = store.create().id;
        store.initialize_cases(&id, ["B", "A"]);
        store.set_current_case(&id, "A", Some("Checks the login form".into()));

        let cases = store.project(&id, case_status).unwrap();
        assert_eq!(
            cases,
            vec![
                CaseStatusEntry {
                    name: "A".into(),
                    status: CaseState::Testing
                },
                CaseStatusEntry {
                    name: "B".into(),
                    status: CaseState::Schedule
                },
            ]
        );

        let current = store.project(&id, current_case).unwrap();
        assert_eq!(current.name.as_deref(), Some("A"));
        assert_eq!(current.documentation.as_deref(), Some("Checks the login form"));

        store.resolve_current_case(&id, Outcome::Skip);
        let current = store.project(&id, current_case).unwrap();
        assert!(current.name.is_none());
    }

    #[test]
    fn test_stats_view_after_finish() {
        let store = SessionStore::new();
        let id = store.create().id;
        store.mark_started(&id);
        assert!(store.project(&id, ui_lock).unwrap().locked);

        store.mark_finished(
            &id,
            false,
            Totals {
                passed: 2,
                failed: 1,
                skipped: 0,
            },
            store.get(&id).unwrap().started_at,
        );

        let view = store.project(&id, stats).unwrap();
        assert_eq!(view.status, SessionStatus::Failed);
        assert_eq!(view.passed, 2);
        assert_eq!(view.failed, 1);
        assert!(view.started_at.is_some());
        assert!(view.finished_at.unwrap() >= view.started_at.unwrap());
        assert!(!store.project(&id, ui_lock).unwrap().locked);
    }

    #[test]
    fn test_stats_view_serializes_status() {
        let store = SessionStore::new();
        let id = store.create().id;
        let view = store.project(&id, stats).unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "PENDING");
        assert!(json["started_at"].is_null());
        assert_eq!(json["steps_completed"], 0);
    }

    #[test]
    fn test_run_response() {
        let store = SessionStore::new();
        let record = store.create();
        let view = run_response(&record);
        assert_eq!(view.session_id, record.id);
        assert_eq!(view.status, SessionStatus::Pending);
        assert!(view.updated_at >= view.created_at);
    }
}
