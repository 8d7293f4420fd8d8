//! Orchestrator DAG defaults

use serde::{Deserialize, Serialize};

/// Default arguments applied to every generated DAG.
///
/// Catchup stays off: the extractors do not support date-window
/// extraction, so backfilling date-chunked jobs would only re-run the
/// same full extraction repeatedly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DagDefaults {
    /// Owner tag shown in the orchestrator UI
    pub owner: String,

    /// Whether a run waits for the previous run to succeed
    #[serde(rename = "depends-on-past")]
    pub depends_on_past: bool,

    /// Email on task failure
    #[serde(rename = "email-on-failure")]
    pub email_on_failure: bool,

    /// Email on task retry
    #[serde(rename = "email-on-retry")]
    pub email_on_retry: bool,

    /// Backfill missed runs since the start date
    pub catchup: bool,

    /// Retries per task before failing the run
    pub retries: u32,

    /// Delay between retries, in minutes
    #[serde(rename = "retry-delay-mins")]
    pub retry_delay_mins: u32,

    /// Maximum concurrent task instances per DAG
    pub concurrency: u32,
}

impl Default for DagDefaults {
    fn default() -> Self {
        Self {
            owner: "airflow".to_string(),
            depends_on_past: false,
            email_on_failure: false,
            email_on_retry: false,
            catchup: false,
            retries: 1,
            retry_delay_mins: 5,
            concurrency: 1,
        }
    }
}
