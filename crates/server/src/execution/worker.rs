// crates/server/src/execution/worker.rs
//! The execution worker: spawn the runner, stream its merged output through
//! the classifier into the session store, then finalize on exit.

use std::io::{BufRead, BufReader, PipeReader, Read};
use std::process::Stdio;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use runwatch_core::{
    classify, LineEvent, LogLevel, RunError, RunPlan, RunTally, SessionStore, Totals,
};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use super::state::WorkerState;
use super::types::WorkerPhase;
use crate::metrics;

/// Raw lines buffered between the pipe reader and the worker.
const LINE_CHANNEL_CAPACITY: usize = 256;

/// Longest line forwarded as one entry; longer output is split.
pub const MAX_LINE_BYTES: u64 = 64 * 1024;

/// Everything one worker needs; moved into its task.
pub struct WorkerContext {
    pub store: Arc<SessionStore>,
    pub session_id: String,
    pub plan: RunPlan,
    pub state: Arc<WorkerState>,
    pub started_at: Option<DateTime<Utc>>,
}

/// Run the session to a terminal status. Never returns early with the
/// session left `RUNNING`.
pub async fn execute(ctx: WorkerContext) {
    let WorkerContext {
        store,
        session_id,
        plan,
        state,
        started_at,
    } = ctx;

    state.set_phase(WorkerPhase::Spawning);
    let spawned = spawn_runner(&plan);

    let (mut child, output) = match spawned {
        Ok(spawned) => spawned,
        Err(e) => {
            let err = RunError::spawn(&plan.program, e);
            tracing::error!(session_id = %session_id, error = %err, "Failed to start runner");
            store.append_log(&session_id, LogLevel::Error, err.to_string());
            finish(&store, &session_id, &state, false, Totals::default(), started_at);
            return;
        }
    };

    tracing::info!(session_id = %session_id, pid = ?child.id(), "Runner process started");
    store.append_log(&session_id, LogLevel::Info, "Runner process started");
    state.set_phase(WorkerPhase::Streaming);

    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(LINE_CHANNEL_CAPACITY);
    let pump = tokio::task::spawn_blocking(move || pump_lines(output, tx));

    let mut tally = RunTally::new();
    while let Some(raw) = rx.recv().await {
        apply_line(&store, &session_id, &mut tally, &raw);
    }

    state.set_phase(WorkerPhase::Draining);
    if let Err(e) = pump.await {
        tracing::warn!(session_id = %session_id, error = %e, "Output pump task failed");
    }

    let success = match child.wait().await {
        Ok(status) => match status.code() {
            Some(code) => {
                store.append_log(
                    &session_id,
                    LogLevel::Info,
                    format!("Runner process finished with code {code}."),
                );
                code == 0
            }
            None => {
                store.append_log(
                    &session_id,
                    LogLevel::Warn,
                    "Runner process terminated by a signal.",
                );
                false
            }
        },
        Err(e) => {
            tracing::error!(session_id = %session_id, error = %e, "Failed waiting for runner");
            store.append_log(
                &session_id,
                LogLevel::Error,
                format!("Failed waiting for runner process: {e}"),
            );
            false
        }
    };

    store.apply_progress(&session_id, tally.settle());
    finish(&store, &session_id, &state, success, tally.totals(), started_at);
}

/// Finalize the session and move the worker to `Terminal`.
pub(crate) fn finish(
    store: &SessionStore,
    session_id: &str,
    state: &WorkerState,
    success: bool,
    totals: Totals,
    started_at: Option<DateTime<Utc>>,
) {
    store.mark_finished(session_id, success, totals, started_at);
    state.set_phase(WorkerPhase::Terminal);

    let outcome = store.project(session_id, |s| (s.status, s.stats.duration_seconds));
    if let Some((status, duration_seconds)) = outcome {
        metrics::record_session_finished(status.as_str(), duration_seconds);
    }
}

/// Launch the runner with stdout and stderr sharing one pipe, so lines
/// arrive in the order the child wrote them.
fn spawn_runner(plan: &RunPlan) -> std::io::Result<(Child, PipeReader)> {
    let (reader, writer) = std::io::pipe()?;
    let stderr = writer.try_clone()?;
    // The Command, and with it the parent's write ends, is dropped here.
    let child = Command::new(&plan.program)
        .args(&plan.args)
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(stderr)
        .spawn()?;
    Ok((child, reader))
}

/// Forward raw lines until EOF. Runs on the blocking pool.
///
/// A line longer than [`MAX_LINE_BYTES`] is forwarded in chunks.
fn pump_lines<R: Read>(reader: R, tx: mpsc::Sender<Vec<u8>>) {
    let mut reader = BufReader::new(reader);
    loop {
        let mut buf = Vec::new();
        match (&mut reader).take(MAX_LINE_BYTES).read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if tx.blocking_send(buf).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error reading runner output");
                break;
            }
        }
    }
}

/// Decode, log and classify one raw output line, applying the result.
///
/// Returns `false` for blank lines, which are skipped entirely.
pub fn apply_line(store: &SessionStore, session_id: &str, tally: &mut RunTally, raw: &[u8]) -> bool {
    let decoded = String::from_utf8_lossy(raw);
    let line = decoded.trim();
    if line.is_empty() {
        return false;
    }

    store.append_log(session_id, LogLevel::Info, line);
    metrics::record_line_processed();

    match classify(line) {
        LineEvent::Start(name) => {
            let progress = tally.on_start();
            if !name.is_empty() {
                store.set_current_case(session_id, &name, None);
            }
            store.apply_progress(session_id, progress);
        }
        LineEvent::Result(outcome) => {
            if store.resolve_current_case(session_id, outcome).is_some() {
                store.apply_progress(session_id, tally.on_result(outcome));
            }
        }
        LineEvent::Plain => store.apply_progress(session_id, tally.settle()),
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use runwatch_core::CaseState;

    fn feed(store: &SessionStore, id: &str, tally: &mut RunTally, lines: &[&str]) {
        for line in lines {
            apply_line(store, id, tally, line.as_bytes());
        }
    }

    #[test]
    fn test_start_then_pass() {
        let store = SessionStore::new();
        let id = store.create().id;
        let mut tally = RunTally::new();

        feed(&store, &id, &mut tally, &["Starting test: Login"]);
        let record = store.get(&id).unwrap();
        assert_eq!(record.cases.state("Login"), CaseState::Testing);
        assert_eq!(record.progress.total_steps, 1);

        feed(&store, &id, &mut tally, &["Login                | PASS |"]);
        let record = store.get(&id).unwrap();
        assert_eq!(record.cases.state("Login"), CaseState::Pass);
        assert!(record.cases.current().is_none());
        assert_eq!(record.progress.current_step, 1);
        assert_eq!(tally.totals().passed, 1);
    }

    #[test]
    fn test_second_start_demotes_first() {
        let store = SessionStore::new();
        let id = store.create().id;
        let mut tally = RunTally::new();
        feed(&store, &id, &mut tally, &["Starting test: A", "Starting test: B"]);

        let record = store.get(&id).unwrap();
        assert_eq!(record.cases.state("A"), CaseState::Schedule);
        assert_eq!(record.cases.state("B"), CaseState::Testing);
        assert_eq!(record.progress.total_steps, 2);
    }

    #[test]
    fn test_result_without_current_case_is_logged_only() {
        let store = SessionStore::new();
        let id = store.create().id;
        let mut tally = RunTally::new();
        feed(&store, &id, &mut tally, &["Everything | FAIL |"]);

        let record = store.get(&id).unwrap();
        assert_eq!(record.progress.current_step, 0);
        assert_eq!(tally.totals(), Totals::default());
        assert_eq!(record.logs.back().unwrap().message, "Everything | FAIL |");
    }

    #[test]
    fn test_blank_and_invalid_utf8_lines() {
        let store = SessionStore::new();
        let id = store.create().id;
        let mut tally = RunTally::new();

        assert!(!apply_line(&store, &id, &mut tally, b"   \r\n"));
        assert!(apply_line(&store, &id, &mut tally, b"bad \xff byte\r\n"));

        let record = store.get(&id).unwrap();
        // "Session created." plus the decoded line
        assert_eq!(record.logs.len(), 2);
        assert_eq!(record.logs[1].message, "bad \u{fffd} byte");
    }

    #[test]
    fn test_pump_splits_overlong_lines() {
        let mut input = vec![b'x'; MAX_LINE_BYTES as usize + 10];
        input.extend_from_slice(b"\nshort\n");
        let (tx, mut rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        pump_lines(input.as_slice(), tx);

        let mut chunks = Vec::new();
        while let Ok(chunk) = rx.try_recv() {
            chunks.push(chunk);
        }
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), MAX_LINE_BYTES as usize);
        assert_eq!(chunks[1], b"xxxxxxxxxx\n");
        assert_eq!(chunks[2], b"short\n");
    }

    #[test]
    fn test_start_without_name_counts_step() {
        let store = SessionStore::new();
        let id = store.create().id;
        let mut tally = RunTally::new();
        feed(&store, &id, &mut tally, &["starting test:"]);

        let record = store.get(&id).unwrap();
        assert_eq!(record.progress.total_steps, 1);
        assert!(record.cases.current().is_none());
        assert!(record.cases.is_empty());
    }

    fn output_line() -> impl Strategy<Value = String> {
        let name = prop::sample::select(vec!["Login", "Logout", "Cart", ""]);
        let outcome = prop::sample::select(vec!["PASS", "FAIL", "SKIP"]);
        prop_oneof![
            3 => name.clone().prop_map(|n| format!("Starting test: {n}")),
            3 => (name, outcome).prop_map(|(n, o)| format!("{n:<20} | {o} |")),
            2 => "[a-z ]{0,30}",
        ]
    }

    proptest! {
        #[test]
        fn output_stream_keeps_progress_and_case_invariants(
            lines in prop::collection::vec(output_line(), 0..80)
        ) {
            let store = SessionStore::new();
            let id = store.create().id;
            let mut tally = RunTally::new();
            let mut last_total = 0;

            for line in &lines {
                apply_line(&store, &id, &mut tally, line.as_bytes());
                let record = store.get(&id).unwrap();
                let p = record.progress;

                prop_assert!(p.total_steps >= last_total);
                prop_assert!(p.current_step <= p.total_steps);
                prop_assert!((0.0..=100.0).contains(&p.percent()));
                last_total = p.total_steps;

                let testing = record
                    .cases
                    .entries()
                    .iter()
                    .filter(|(_, s)| *s == CaseState::Testing)
                    .count();
                prop_assert!(testing <= 1);
            }

            let totals = tally.totals();
            let record = store.get(&id).unwrap();
            prop_assert_eq!(
                totals.passed + totals.failed + totals.skipped,
                record.progress.current_step
            );
        }
    }
}
