//! DAG descriptor generation
//!
//! Turns eligible schedules into task descriptors for the external
//! orchestrator: default arguments, a shell command, and a merged
//! environment per schedule.

mod builder;
mod defaults;

pub use builder::{DagArgs, TaskDescriptor, build_descriptors, elt_command, task_env};
pub use defaults::DagDefaults;

/// Prefix for generated DAG identifiers
pub const DAG_ID_PREFIX: &str = "scheduled_";
