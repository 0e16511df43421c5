// crates/core/src/cases.rs
//! Per-case state machine.
//!
//! Every named case moves through `NOTRUN`/`SCHEDULE` → `TESTING` → one of
//! `PASS`/`FAIL`/`SKIP`. At most one case is `TESTING` at a time: starting a
//! new case demotes any other `TESTING` case back to `SCHEDULE`, since its
//! result was never observed. Results are last-write-wins.

use std::collections::HashMap;

use crate::types::{CaseState, Outcome};

/// The case currently being executed, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentCase {
    pub name: String,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CaseBook {
    states: HashMap<String, CaseState>,
    current: Option<CurrentCase>,
}

impl CaseBook {
    /// Replace the whole map with `SCHEDULE` entries for each non-empty name.
    pub fn initialize<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.states = names
            .into_iter()
            .filter_map(|n| {
                let name = n.as_ref().trim();
                (!name.is_empty()).then(|| (name.to_string(), CaseState::Schedule))
            })
            .collect();
        self.current = None;
    }

    pub fn set_current_case(&mut self, name: &str, documentation: Option<String>) {
        for (other, state) in self.states.iter_mut() {
            if *state == CaseState::Testing && other != name {
                *state = CaseState::Schedule;
            }
        }
        self.states.insert(name.to_string(), CaseState::Testing);
        self.current = Some(CurrentCase {
            name: name.to_string(),
            documentation,
        });
    }

    pub fn set_case_result(&mut self, name: &str, outcome: Outcome) {
        let state = self.states.entry(name.to_string()).or_default();
        *state = outcome.into();
        if self.current.as_ref().is_some_and(|c| c.name == name) {
            self.current = None;
        }
    }

    /// Apply `outcome` to the tracked current case.
    ///
    /// Returns the case name, or `None` when no case is being tracked (the
    /// result is then dropped).
    pub fn resolve_current(&mut self, outcome: Outcome) -> Option<String> {
        let name = self.current.as_ref()?.name.clone();
        self.set_case_result(&name, outcome);
        Some(name)
    }

    pub fn state(&self, name: &str) -> CaseState {
        self.states.get(name).copied().unwrap_or_default()
    }

    pub fn current(&self) -> Option<&CurrentCase> {
        self.current.as_ref()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// All known cases, sorted by name.
    pub fn entries(&self) -> Vec<(&str, CaseState)> {
        let mut entries: Vec<_> = self
            .states
            .iter()
            .map(|(name, state)| (name.as_str(), *state))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}
