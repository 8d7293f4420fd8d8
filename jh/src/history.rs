//! Core JobHistory implementation

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use eyre::{Context, Result, eyre};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// State of a recorded job run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Started but not yet finished
    Running,
    /// Finished successfully
    Success,
    /// Finished with an error
    Failed,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for RunState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown run state: {}. Use: running, success, or failed", s)),
        }
    }
}

/// A single historical run of a named job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRun {
    /// Unique run ID (UUIDv7, time-ordered)
    pub run_id: String,

    /// Job identifier (the schedule name)
    pub job_id: String,

    /// Current state
    pub state: RunState,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished (None while running)
    pub ended_at: Option<DateTime<Utc>>,

    /// Error message for failed runs
    pub error: Option<String>,
}

impl JobRun {
    /// Check if the run is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, RunState::Success | RunState::Failed)
    }
}

/// SQLite-backed store of job run history
pub struct JobHistory {
    conn: Connection,
    path: PathBuf,
}

impl JobHistory {
    /// Open or create a history database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create history directory")?;
        }

        let conn = Connection::open(&path).context(format!("Failed to open history db: {}", path.display()))?;
        init_schema(&conn)?;

        debug!(?path, "Opened job history");
        Ok(Self { conn, path })
    }

    /// Open an in-memory history (tests and dry runs)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    /// Path of the backing database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record the start of a run for the given job
    pub fn start_run(&self, job_id: &str) -> Result<JobRun> {
        let run = JobRun {
            run_id: Uuid::now_v7().to_string(),
            job_id: job_id.to_string(),
            state: RunState::Running,
            started_at: Utc::now(),
            ended_at: None,
            error: None,
        };

        self.conn.execute(
            "INSERT INTO runs (run_id, job_id, state, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![run.run_id, run.job_id, run.state.to_string(), run.started_at.to_rfc3339()],
        )?;

        info!(job_id, run_id = %run.run_id, "Run started");
        Ok(run)
    }

    /// Mark a run as successfully completed
    pub fn complete_run(&self, run_id: &str) -> Result<()> {
        self.finish(run_id, RunState::Success, None)
    }

    /// Mark a run as failed with an error message
    pub fn fail_run(&self, run_id: &str, error: &str) -> Result<()> {
        self.finish(run_id, RunState::Failed, Some(error))
    }

    fn finish(&self, run_id: &str, state: RunState, error: Option<&str>) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE runs SET state = ?1, ended_at = ?2, error = ?3 WHERE run_id = ?4",
            params![state.to_string(), Utc::now().to_rfc3339(), error, run_id],
        )?;

        if updated == 0 {
            return Err(eyre!("Run not found: {}", run_id));
        }

        info!(run_id, %state, "Run finished");
        Ok(())
    }

    /// Record an already-finished run in one step.
    ///
    /// Used to bootstrap history for a job that ran outside this store,
    /// e.g. marking a manual first run as successful.
    pub fn record(&self, job_id: &str, state: RunState) -> Result<JobRun> {
        let now = Utc::now();
        let run = JobRun {
            run_id: Uuid::now_v7().to_string(),
            job_id: job_id.to_string(),
            state,
            started_at: now,
            ended_at: Some(now),
            error: None,
        };

        self.conn.execute(
            "INSERT INTO runs (run_id, job_id, state, started_at, ended_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                run.run_id,
                run.job_id,
                run.state.to_string(),
                run.started_at.to_rfc3339(),
                now.to_rfc3339()
            ],
        )?;

        info!(job_id, run_id = %run.run_id, %state, "Run recorded");
        Ok(run)
    }

    /// Find the most recent successfully completed run for a job
    pub fn latest_success(&self, job_id: &str) -> Result<Option<JobRun>> {
        let run = self
            .conn
            .query_row(
                "SELECT run_id, job_id, state, started_at, ended_at, error
                 FROM runs
                 WHERE job_id = ?1 AND state = 'success'
                 ORDER BY ended_at DESC, id DESC
                 LIMIT 1",
                params![job_id],
                row_to_run,
            )
            .optional()?;

        Ok(run)
    }

    /// List recent runs for a job, newest first
    pub fn recent_runs(&self, job_id: &str, limit: usize) -> Result<Vec<JobRun>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, job_id, state, started_at, ended_at, error
             FROM runs
             WHERE job_id = ?1
             ORDER BY started_at DESC, id DESC
             LIMIT ?2",
        )?;

        let runs = stmt
            .query_map(params![job_id, limit as i64], row_to_run)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(runs)
    }

    /// Count of runs per job across the whole store
    pub fn run_counts(&self) -> Result<HashMap<String, usize>> {
        let mut stmt = self.conn.prepare("SELECT job_id, COUNT(*) FROM runs GROUP BY job_id")?;

        let counts = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize)))?
            .collect::<rusqlite::Result<HashMap<_, _>>>()?;

        Ok(counts)
    }
}

/// Initialise history tables. Safe to call on every startup (idempotent).
fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS runs (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id      TEXT NOT NULL UNIQUE,
            job_id      TEXT NOT NULL,
            state       TEXT NOT NULL,
            started_at  TEXT NOT NULL,
            ended_at    TEXT,
            error       TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_runs_job
            ON runs(job_id, started_at DESC);",
    )?;
    Ok(())
}

fn row_to_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<JobRun> {
    let state_str: String = row.get(2)?;
    let started_at: String = row.get(3)?;
    let ended_at: Option<String> = row.get(4)?;

    Ok(JobRun {
        run_id: row.get(0)?,
        job_id: row.get(1)?,
        state: state_str.parse().unwrap_or(RunState::Failed),
        started_at: parse_ts(&started_at),
        ended_at: ended_at.as_deref().map(parse_ts),
        error: row.get(5)?,
    })
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| DateTime::<Utc>::MIN_UTC)
}
