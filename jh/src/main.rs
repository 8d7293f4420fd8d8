use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::info;

use jobhistory::JobHistory;
use jobhistory::cli::{Cli, Command};
use jobhistory::config::Config;

fn setup_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let db_path = cli.db.unwrap_or(config.db_path);

    info!("jobhistory starting");

    let history = JobHistory::open(&db_path)?;

    match cli.command {
        Command::Latest { job_id } => match history.latest_success(&job_id)? {
            Some(run) => {
                println!(
                    "{} {} last succeeded at {}",
                    "✓".green(),
                    job_id.cyan(),
                    run.ended_at.map(|t| t.to_rfc3339()).unwrap_or_default()
                );
            }
            None => {
                println!("{} {} has no successful runs", "✗".red(), job_id.cyan());
            }
        },
        Command::List { job_id, limit } => {
            let runs = history.recent_runs(&job_id, limit)?;
            if runs.is_empty() {
                println!("No runs found for {}", job_id.cyan());
            } else {
                for run in runs {
                    let state = match run.state {
                        jobhistory::RunState::Success => run.state.to_string().green(),
                        jobhistory::RunState::Failed => run.state.to_string().red(),
                        jobhistory::RunState::Running => run.state.to_string().yellow(),
                    };
                    println!(
                        "{} {} started={} ended={}",
                        state,
                        run.run_id.dimmed(),
                        run.started_at.to_rfc3339(),
                        run.ended_at.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string())
                    );
                }
            }
        }
        Command::Mark { job_id, state } => {
            let run = history.record(&job_id, state)?;
            println!("{} Recorded {} run for {}", "✓".green(), state, run.job_id.cyan());
        }
    }

    Ok(())
}
