//! Airlift - translates ELT schedules into orchestrator DAG descriptors
//!
//! An airlift project (`airlift.yml`) declares named recurring
//! extractions. The generator walks the schedule list once, skips
//! anything manual-only or never successfully run, and emits one task
//! descriptor per eligible schedule for the external orchestrator to
//! register as a DAG.
//!
//! # Example
//!
//! ```ignore
//! use airlift::config::ProjectConfig;
//! use airlift::dag::build_descriptors;
//! use airlift::project::Project;
//! use jobhistory::JobHistory;
//!
//! let project = Project::find()?;
//! let config = ProjectConfig::load(project.file_path())?;
//! let history = JobHistory::open(project.database_path()?)?;
//! let env = std::env::vars().collect();
//! let descriptors = build_descriptors(&project, &config, &history, &env)?;
//! ```

pub mod cli;
pub mod config;
pub mod dag;
pub mod project;
pub mod schedule;

pub use config::ProjectConfig;
pub use dag::{DagDefaults, TaskDescriptor, build_descriptors};
pub use project::Project;
pub use schedule::{INTERVAL_ONCE, Schedule, Transform};
