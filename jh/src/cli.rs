//! CLI argument parsing for jobhistory

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::RunState;

#[derive(Parser, Debug)]
#[command(name = "jh")]
#[command(author, version, about = "Inspect and mark ELT job run history", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the history database (overrides config)
    #[arg(short, long)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the most recent successful run of a job
    Latest {
        /// Job identifier (the schedule name)
        #[arg(required = true)]
        job_id: String,
    },

    /// List recent runs of a job, newest first
    List {
        /// Job identifier (the schedule name)
        #[arg(required = true)]
        job_id: String,

        /// Maximum runs to show
        #[arg(short, long, default_value_t = crate::DEFAULT_LIST_LIMIT)]
        limit: usize,
    },

    /// Record a finished run for a job (bootstrap manual runs)
    Mark {
        /// Job identifier (the schedule name)
        #[arg(required = true)]
        job_id: String,

        /// Final state of the run
        #[arg(default_value = "success")]
        state: RunState,
    },
}

impl clap::ValueEnum for RunState {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Running, Self::Success, Self::Failed]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(match self {
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
        }))
    }
}
