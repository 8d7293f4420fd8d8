//! Project file loading and validation
//!
//! The project file (`airlift.yml`) holds the schedule list and optional
//! orchestrator default overrides. Malformed schedules fail the load;
//! the generator never sees a half-valid project.

use std::collections::HashSet;
use std::path::Path;

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dag::DagDefaults;
use crate::schedule::{Schedule, validate_interval};

/// Parsed contents of the project file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Schedules in file order
    pub schedules: Vec<Schedule>,

    /// Orchestrator DAG defaults, overridable per project
    pub orchestrator: DagDefaults,
}

impl ProjectConfig {
    /// Load and validate the project file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read project file: {}", path.display()))?;

        let config: Self =
            serde_yaml::from_str(&content).context(format!("Failed to parse project file: {}", path.display()))?;

        config.validate()?;
        debug!(path = %path.display(), schedules = config.schedules.len(), "Loaded project file");
        Ok(config)
    }

    /// Save the project file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path.as_ref(), content).context("Failed to write project file")?;
        Ok(())
    }

    /// Reject duplicate names and invalid intervals
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for schedule in &self.schedules {
            if !seen.insert(schedule.name.as_str()) {
                return Err(eyre!("Duplicate schedule name: {}", schedule.name));
            }
            validate_interval(&schedule.interval)
                .map_err(|e| eyre!("Schedule '{}': {}", schedule.name, e))?;
        }
        Ok(())
    }

    /// Look up a schedule by name
    pub fn schedule(&self, name: &str) -> Option<&Schedule> {
        self.schedules.iter().find(|s| s.name == name)
    }

    /// Add a schedule, enforcing name uniqueness and interval validity
    pub fn add_schedule(&mut self, schedule: Schedule) -> Result<()> {
        if self.schedule(&schedule.name).is_some() {
            return Err(eyre!("Schedule already exists: {}", schedule.name));
        }
        validate_interval(&schedule.interval).map_err(|e| eyre!("Schedule '{}': {}", schedule.name, e))?;
        self.schedules.push(schedule);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Transform;
    use tempfile::TempDir;

    const PROJECT_YAML: &str = r#"
schedules:
  - name: gitlab-to-postgres
    interval: "0 * * * *"
    extractor: tap-gitlab
    loader: target-postgres
    transform: run
  - name: csv-to-jsonl
    interval: "@once"
    extractor: tap-csv
    loader: target-jsonl

orchestrator:
  owner: data-eng
  retries: 3
"#;

    #[test]
    fn test_load_project_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("airlift.yml");
        std::fs::write(&path, PROJECT_YAML).unwrap();

        let config = ProjectConfig::load(&path).unwrap();
        assert_eq!(config.schedules.len(), 2);
        assert_eq!(config.schedules[0].name, "gitlab-to-postgres");
        assert_eq!(config.schedules[0].transform, Transform::Run);
        assert_eq!(config.orchestrator.owner, "data-eng");
        assert_eq!(config.orchestrator.retries, 3);

        // Unspecified orchestrator fields keep their defaults
        assert_eq!(config.orchestrator.concurrency, 1);
        assert!(!config.orchestrator.catchup);
    }

    #[test]
    fn test_load_empty_project_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("airlift.yml");
        std::fs::write(&path, "schedules: []\n").unwrap();

        let config = ProjectConfig::load(&path).unwrap();
        assert!(config.schedules.is_empty());
        assert_eq!(config.orchestrator.owner, "airflow");
    }

    #[test]
    fn test_load_rejects_duplicate_names() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("airlift.yml");
        std::fs::write(
            &path,
            r#"
schedules:
  - name: dup
    interval: "@daily"
    extractor: tap-a
    loader: target-a
  - name: dup
    interval: "@daily"
    extractor: tap-b
    loader: target-b
"#,
        )
        .unwrap();

        let err = ProjectConfig::load(&path).unwrap_err().to_string();
        assert!(err.contains("Duplicate schedule name"));
    }

    #[test]
    fn test_load_rejects_bad_interval() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("airlift.yml");
        std::fs::write(
            &path,
            r#"
schedules:
  - name: bad
    interval: "every 5 minutes"
    extractor: tap-a
    loader: target-a
"#,
        )
        .unwrap();

        assert!(ProjectConfig::load(&path).is_err());
    }

    #[test]
    fn test_add_schedule_rejects_duplicate() {
        let mut config = ProjectConfig::default();
        config
            .add_schedule(Schedule::new("gitlab", "tap-gitlab", "target-jsonl"))
            .unwrap();

        let err = config
            .add_schedule(Schedule::new("gitlab", "tap-gitlab", "target-csv"))
            .unwrap_err()
            .to_string();
        assert!(err.contains("already exists"));
    }

    #[test]
    fn test_save_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("airlift.yml");

        let mut config = ProjectConfig::default();
        config
            .add_schedule(
                Schedule::new("gitlab", "tap-gitlab", "target-jsonl")
                    .with_interval("@daily")
                    .with_env("TAP_GITLAB_TOKEN", "secret"),
            )
            .unwrap();
        config.save(&path).unwrap();

        let loaded = ProjectConfig::load(&path).unwrap();
        assert_eq!(loaded.schedules.len(), 1);
        assert_eq!(loaded.schedules[0].interval, "@daily");
        assert_eq!(
            loaded.schedules[0].env.get("TAP_GITLAB_TOKEN").map(String::as_str),
            Some("secret")
        );
    }
}
