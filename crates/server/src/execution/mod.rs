// crates/server/src/execution/mod.rs
//! Background execution of runner processes, one worker per session.
//!
//! Provides:
//! - `ExecutionRunner` - starts workers and tracks their phase
//! - `WorkerState` - atomic phase and stop flag per worker
//! - `RunHandle` - handle to a started worker task
//! - `worker` - the streaming loop that feeds runner output into the store

pub mod runner;
pub mod state;
pub mod types;
pub mod worker;

pub use runner::ExecutionRunner;
pub use state::WorkerState;
pub use types::{RunHandle, WorkerPhase, WorkerSnapshot};
