// crates/core/src/tally.rs
//! Step and outcome counters owned by one execution worker.
//!
//! `total_steps` only ever grows and `current_step` never exceeds it.

use crate::types::{Outcome, Progress, Totals};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTally {
    total_steps: u64,
    current_step: u64,
    totals: Totals,
}

impl RunTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// A case started: one more expected step.
    pub fn on_start(&mut self) -> Progress {
        self.total_steps += 1;
        Progress {
            current_step: self.current_step,
            total_steps: self.total_steps.max(1),
        }
    }

    /// A tracked case finished with `outcome`.
    pub fn on_result(&mut self, outcome: Outcome) -> Progress {
        self.totals.record(outcome);
        self.current_step += 1;
        self.settle()
    }

    /// Grow `total_steps` to at least `current_step`.
    pub fn settle(&mut self) -> Progress {
        self.total_steps = self.total_steps.max(self.current_step);
        self.progress()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            current_step: self.current_step,
            total_steps: self.total_steps,
        }
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_start_then_result() {
        let mut tally = RunTally::new();
        let p = tally.on_start();
        assert_eq!(p.total_steps, 1);
        assert_eq!(p.current_step, 0);

        let p = tally.on_result(Outcome::Pass);
        assert_eq!(p.total_steps, 1);
        assert_eq!(p.current_step, 1);
        assert_eq!(p.percent(), 100.0);
        assert_eq!(tally.totals().passed, 1);
    }

    #[test]
    fn test_result_without_start_grows_total() {
        let mut tally = RunTally::new();
        let p = tally.on_result(Outcome::Fail);
        assert_eq!(p.current_step, 1);
        assert_eq!(p.total_steps, 1);
    }

    #[test]
    fn test_invariants_hold_over_mixed_sequence() {
        let mut tally = RunTally::new();
        let mut last_total = 0;
        let ops = [0, 1, 1, 0, 0, 2, 1, 3, 0, 1, 1, 1];
        for op in ops {
            let p = match op {
                0 => tally.on_start(),
                1 => tally.on_result(Outcome::Pass),
                2 => tally.on_result(Outcome::Skip),
                _ => tally.settle(),
            };
            assert!(p.current_step <= p.total_steps);
            assert!(p.total_steps >= last_total);
            assert!((0.0..=100.0).contains(&p.percent()));
            last_total = p.total_steps;
        }
        let totals = tally.totals();
        assert_eq!(totals.passed, 6);
        assert_eq!(totals.skipped, 1);
    }

    #[test]
    fn test_settle_is_idempotent() {
        let mut tally = RunTally::new();
        tally.on_start();
        let a = tally.settle();
        let b = tally.settle();
        assert_eq!(a, b);
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Start,
        Result(Outcome),
        Settle,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Start),
            Just(Op::Result(Outcome::Pass)),
            Just(Op::Result(Outcome::Fail)),
            Just(Op::Result(Outcome::Skip)),
            Just(Op::Settle),
        ]
    }

    proptest! {
        #[test]
        fn progress_invariants_hold(ops in prop::collection::vec(op_strategy(), 0..200)) {
            let mut tally = RunTally::new();
            let mut last_total = 0;
            let mut results = 0;
            for op in ops {
                let p = match op {
                    Op::Start => tally.on_start(),
                    Op::Result(outcome) => {
                        results += 1;
                        tally.on_result(outcome)
                    }
                    Op::Settle => tally.settle(),
                };
                prop_assert!(p.current_step <= p.total_steps);
                prop_assert!(p.total_steps >= last_total);
                last_total = p.total_steps;

                let pct = p.percent();
                prop_assert!((0.0..=100.0).contains(&pct));
                prop_assert!(((pct * 100.0).round() - pct * 100.0).abs() < 1e-6);
            }
            let totals = tally.totals();
            prop_assert_eq!(totals.passed + totals.failed + totals.skipped, results);
            prop_assert_eq!(tally.progress().current_step, results);
        }
    }
}
