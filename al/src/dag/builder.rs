//! Descriptor builder
//!
//! One pass over the schedule list per invocation. A schedule produces a
//! descriptor only if its interval is not `@once` and the job history has
//! at least one successful run; everything else is the orchestrator's
//! problem.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use eyre::Result;
use jobhistory::JobHistory;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ProjectConfig;
use crate::project::Project;
use crate::schedule::Schedule;

use super::DAG_ID_PREFIX;
use super::defaults::DagDefaults;

/// Arguments attached to a generated DAG: project defaults plus the
/// schedule's own start date when present
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DagArgs {
    #[serde(flatten)]
    pub defaults: DagDefaults,

    /// First date the orchestrator may run this DAG
    #[serde(rename = "start-date", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDateTime>,
}

impl DagArgs {
    fn for_schedule(defaults: &DagDefaults, schedule: &Schedule) -> Self {
        Self {
            defaults: defaults.clone(),
            start_date: schedule.start_date,
        }
    }
}

/// A scheduled task ready for registration with the orchestrator.
///
/// Ephemeral: built fresh on every generator invocation, never persisted
/// by this component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDescriptor {
    /// Deterministic DAG identifier: `scheduled_<schedule name>`
    pub dag_id: String,

    /// Name of the originating schedule
    pub schedule_name: String,

    /// Recurrence interval, passed through to the orchestrator
    pub interval: String,

    /// DAG arguments (defaults merged with the schedule)
    pub args: DagArgs,

    /// Shell command the orchestrator executes
    pub command: String,

    /// Full task environment: ambient env with schedule overrides applied
    pub env: HashMap<String, String>,
}

/// Shell command for one scheduled ELT run
pub fn elt_command(project: &Project, schedule: &Schedule) -> String {
    format!(
        "cd {}; .airlift/run/bin elt {} {} --job-id={} --transform={}",
        project.root().display(),
        schedule.extractor,
        schedule.loader,
        schedule.name,
        schedule.transform
    )
}

/// Task environment: ambient env with schedule overrides winning on collision
pub fn task_env(base_env: &HashMap<String, String>, schedule: &Schedule) -> HashMap<String, String> {
    let mut env = base_env.clone();
    env.extend(schedule.env.iter().map(|(k, v)| (k.clone(), v.clone())));
    env
}

/// Build descriptors for every eligible schedule, in file order.
///
/// Skips `@once` schedules and schedules without a recorded successful
/// run, logging the reason for each. History lookup errors propagate.
pub fn build_descriptors(
    project: &Project,
    config: &ProjectConfig,
    history: &JobHistory,
    base_env: &HashMap<String, String>,
) -> Result<Vec<TaskDescriptor>> {
    let mut descriptors = Vec::new();

    for schedule in &config.schedules {
        if schedule.is_once() {
            info!(
                schedule = %schedule.name,
                "No DAG created because its interval is set to `@once`"
            );
            continue;
        }

        if history.latest_success(&schedule.name)?.is_none() {
            info!(
                schedule = %schedule.name,
                "No DAG created because it hasn't had a successful (manual) run yet"
            );
            continue;
        }

        let dag_id = format!("{}{}", DAG_ID_PREFIX, schedule.name);
        debug!(%dag_id, interval = %schedule.interval, "Building descriptor");

        descriptors.push(TaskDescriptor {
            dag_id,
            schedule_name: schedule.name.clone(),
            interval: schedule.interval.clone(),
            args: DagArgs::for_schedule(&config.orchestrator, schedule),
            command: elt_command(project, schedule),
            env: task_env(base_env, schedule),
        });
    }

    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::PROJECT_FILE;
    use crate::schedule::Transform;
    use jobhistory::RunState;
    use tempfile::TempDir;

    fn fixture(schedules: Vec<Schedule>) -> (TempDir, Project, ProjectConfig, JobHistory) {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(PROJECT_FILE), "schedules: []\n").unwrap();
        let project = Project::at(temp.path()).unwrap();
        let config = ProjectConfig {
            schedules,
            ..Default::default()
        };
        let history = JobHistory::open_in_memory().unwrap();
        (temp, project, config, history)
    }

    #[test]
    fn test_once_schedule_produces_no_descriptor() {
        let schedule = Schedule::new("manual", "tap-csv", "target-jsonl");
        assert!(schedule.is_once());
        let (_temp, project, config, history) = fixture(vec![schedule]);

        // Even with a successful run on record
        history.record("manual", RunState::Success).unwrap();

        let descriptors = build_descriptors(&project, &config, &history, &HashMap::new()).unwrap();
        assert!(descriptors.is_empty());
    }

    #[test]
    fn test_schedule_without_success_produces_no_descriptor() {
        let schedule = Schedule::new("gitlab", "tap-gitlab", "target-postgres").with_interval("0 * * * *");
        let (_temp, project, config, history) = fixture(vec![schedule]);

        // A failed run does not count
        history.record("gitlab", RunState::Failed).unwrap();

        let descriptors = build_descriptors(&project, &config, &history, &HashMap::new()).unwrap();
        assert!(descriptors.is_empty());
    }

    #[test]
    fn test_eligible_schedule_produces_one_descriptor() {
        let schedule = Schedule::new("gitlab", "tap-gitlab", "target-postgres").with_interval("0 * * * *");
        let (_temp, project, config, history) = fixture(vec![schedule]);

        history.record("gitlab", RunState::Success).unwrap();

        let descriptors = build_descriptors(&project, &config, &history, &HashMap::new()).unwrap();
        assert_eq!(descriptors.len(), 1);

        let d = &descriptors[0];
        assert_eq!(d.dag_id, "scheduled_gitlab");
        assert_eq!(d.interval, "0 * * * *");
        assert_eq!(d.args.defaults.concurrency, 1);
        assert_eq!(d.args.defaults.retries, 1);
        assert!(!d.args.defaults.catchup);
        assert!(d.args.start_date.is_none());
    }

    #[test]
    fn test_command_interpolation() {
        let schedule = Schedule::new("gitlab", "tap-gitlab", "target-postgres")
            .with_interval("@daily")
            .with_transform(Transform::Run);
        let (temp, project, config, history) = fixture(vec![schedule]);

        history.record("gitlab", RunState::Success).unwrap();

        let descriptors = build_descriptors(&project, &config, &history, &HashMap::new()).unwrap();
        let expected = format!(
            "cd {}; .airlift/run/bin elt tap-gitlab target-postgres --job-id=gitlab --transform=run",
            temp.path().display()
        );
        assert_eq!(descriptors[0].command, expected);
    }

    #[test]
    fn test_schedule_env_overrides_base_env() {
        let schedule = Schedule::new("gitlab", "tap-gitlab", "target-postgres")
            .with_interval("@daily")
            .with_env("TAP_GITLAB_TOKEN", "from-schedule");
        let (_temp, project, config, history) = fixture(vec![schedule]);

        history.record("gitlab", RunState::Success).unwrap();

        let base_env = HashMap::from([
            ("TAP_GITLAB_TOKEN".to_string(), "from-ambient".to_string()),
            ("PATH".to_string(), "/usr/bin".to_string()),
        ]);

        let descriptors = build_descriptors(&project, &config, &history, &base_env).unwrap();
        let env = &descriptors[0].env;

        // Override wins, ambient entries survive
        assert_eq!(env.get("TAP_GITLAB_TOKEN").map(String::as_str), Some("from-schedule"));
        assert_eq!(env.get("PATH").map(String::as_str), Some("/usr/bin"));
    }

    #[test]
    fn test_start_date_carried_into_args() {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let schedule = Schedule::new("gitlab", "tap-gitlab", "target-postgres")
            .with_interval("@daily")
            .with_start_date(start);
        let (_temp, project, config, history) = fixture(vec![schedule]);

        history.record("gitlab", RunState::Success).unwrap();

        let descriptors = build_descriptors(&project, &config, &history, &HashMap::new()).unwrap();
        assert_eq!(descriptors[0].args.start_date, Some(start));
    }

    #[test]
    fn test_file_order_preserved_and_skips_interleaved() {
        let schedules = vec![
            Schedule::new("a", "tap-a", "target-a").with_interval("@daily"),
            Schedule::new("b", "tap-b", "target-b"), // @once
            Schedule::new("c", "tap-c", "target-c").with_interval("@hourly"),
            Schedule::new("d", "tap-d", "target-d").with_interval("@daily"), // never ran
        ];
        let (_temp, project, config, history) = fixture(schedules);

        history.record("a", RunState::Success).unwrap();
        history.record("b", RunState::Success).unwrap();
        history.record("c", RunState::Success).unwrap();

        let descriptors = build_descriptors(&project, &config, &history, &HashMap::new()).unwrap();
        let ids: Vec<&str> = descriptors.iter().map(|d| d.dag_id.as_str()).collect();
        assert_eq!(ids, vec!["scheduled_a", "scheduled_c"]);
    }

    #[test]
    fn test_descriptor_serializes_to_json() {
        let schedule = Schedule::new("gitlab", "tap-gitlab", "target-postgres").with_interval("@daily");
        let (_temp, project, config, history) = fixture(vec![schedule]);

        history.record("gitlab", RunState::Success).unwrap();

        let descriptors = build_descriptors(&project, &config, &history, &HashMap::new()).unwrap();
        let json = serde_json::to_value(&descriptors[0]).unwrap();

        assert_eq!(json["dag_id"], "scheduled_gitlab");
        assert_eq!(json["args"]["retries"], 1);
        assert_eq!(json["args"]["concurrency"], 1);
        // No start date: the field is omitted, not null
        assert!(json["args"].get("start-date").is_none());
    }
}
