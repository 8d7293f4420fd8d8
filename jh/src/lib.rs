//! JobHistory - SQLite-backed ELT job run history
//!
//! Records every run of a named job (start, success, failure) and answers
//! the one question the DAG generator cares about: has this job ever
//! completed successfully, and when was the last time?
//!
//! # Architecture
//!
//! ```text
//! .airlift/
//! └── airlift.db          # single SQLite file
//!     └── runs            # one row per run: run_id, job_id, state,
//!                         # started_at, ended_at, error
//! ```
//!
//! # Example
//!
//! ```ignore
//! use jobhistory::JobHistory;
//!
//! let history = JobHistory::open(".airlift/airlift.db")?;
//! let run = history.start_run("tap-gitlab-to-jsonl")?;
//! history.complete_run(&run.run_id)?;
//! let last = history.latest_success("tap-gitlab-to-jsonl")?;
//! ```

pub mod cli;
pub mod config;
mod history;

pub use history::{JobHistory, JobRun, RunState};

/// Default number of runs shown by listing commands
pub const DEFAULT_LIST_LIMIT: usize = 10;
