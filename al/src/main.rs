use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command as ShellCommand;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::info;

use airlift::cli::{Cli, Command, OutputFormat};
use airlift::config::ProjectConfig;
use airlift::dag::{build_descriptors, elt_command, task_env};
use airlift::project::Project;
use airlift::schedule::{Schedule, parse_start_date, validate_interval};
use jobhistory::{JobHistory, RunState};

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let project = match &cli.project {
        Some(root) => Project::at(root)?,
        None => Project::find()?,
    };
    let config = ProjectConfig::load(project.file_path()).context("Failed to load project file")?;

    info!(root = %project.root().display(), "airlift starting");

    match cli.command {
        Command::Generate { format, output } => cmd_generate(&project, &config, format, output),
        Command::List => cmd_list(&project, &config),
        Command::Add {
            name,
            extractor,
            loader,
            interval,
            transform,
            start_date,
            env,
        } => cmd_add(&project, config, name, extractor, loader, interval, transform, start_date, env),
        Command::Run { name } => cmd_run(&project, &config, &name),
        Command::History { name, limit } => cmd_history(&project, &name, limit),
    }
}

fn open_history(project: &Project) -> Result<JobHistory> {
    let db_path = project.database_path()?;
    JobHistory::open(&db_path)
}

fn ambient_env() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Build task descriptors and emit the manifest
fn cmd_generate(
    project: &Project,
    config: &ProjectConfig,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let history = open_history(project)?;
    let descriptors = build_descriptors(project, config, &history, &ambient_env())?;

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&descriptors)?,
        OutputFormat::Text => descriptors
            .iter()
            .map(|d| format!("{}\t{}\t{}", d.dag_id, d.interval, d.command))
            .collect::<Vec<_>>()
            .join("\n"),
    };

    match output {
        Some(path) => {
            std::fs::write(&path, rendered).context(format!("Failed to write manifest: {}", path.display()))?;
            eprintln!(
                "{} Wrote {} descriptor(s) to {}",
                "✓".green(),
                descriptors.len(),
                path.display()
            );
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// List schedules with their eligibility
fn cmd_list(project: &Project, config: &ProjectConfig) -> Result<()> {
    if config.schedules.is_empty() {
        println!("No schedules defined");
        return Ok(());
    }

    let history = open_history(project)?;

    for schedule in &config.schedules {
        let status = if schedule.is_once() {
            "skipped (interval is @once)".dimmed()
        } else if history.latest_success(&schedule.name)?.is_none() {
            "skipped (no successful run yet)".yellow()
        } else {
            "runnable".green()
        };

        println!(
            "{} {} {} -> {} [{}]",
            schedule.name.cyan(),
            schedule.interval.dimmed(),
            schedule.extractor,
            schedule.loader,
            status
        );
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_add(
    project: &Project,
    mut config: ProjectConfig,
    name: String,
    extractor: String,
    loader: String,
    interval: String,
    transform: airlift::Transform,
    start_date: Option<String>,
    env: Vec<(String, String)>,
) -> Result<()> {
    validate_interval(&interval).map_err(|e| eyre!("{}", e))?;

    let mut schedule = Schedule::new(&name, extractor, loader)
        .with_interval(interval)
        .with_transform(transform);

    if let Some(raw) = start_date {
        schedule = schedule.with_start_date(parse_start_date(&raw).map_err(|e| eyre!("{}", e))?);
    }
    for (key, value) in env {
        schedule = schedule.with_env(key, value);
    }

    config.add_schedule(schedule)?;
    config.save(project.file_path())?;

    println!("{} Added schedule: {}", "✓".green(), name.cyan());
    Ok(())
}

/// Execute a schedule's ELT command once, recording the outcome
fn cmd_run(project: &Project, config: &ProjectConfig, name: &str) -> Result<()> {
    let schedule = config.schedule(name).ok_or_else(|| eyre!("Unknown schedule: {}", name))?;

    let history = open_history(project)?;
    let run = history.start_run(&schedule.name)?;

    let command = elt_command(project, schedule);
    let env = task_env(&ambient_env(), schedule);

    info!(schedule = %schedule.name, %command, "Running ELT");

    let status = ShellCommand::new("sh")
        .arg("-c")
        .arg(&command)
        .env_clear()
        .envs(&env)
        .status();

    match status {
        Ok(exit) if exit.success() => {
            history.complete_run(&run.run_id)?;
            println!("{} {} succeeded", "✓".green(), name.cyan());
            Ok(())
        }
        Ok(exit) => {
            let reason = format!("ELT exited with {}", exit);
            history.fail_run(&run.run_id, &reason)?;
            Err(eyre!("{} failed: {}", name, reason))
        }
        Err(e) => {
            history.fail_run(&run.run_id, &e.to_string())?;
            Err(e).context(format!("Failed to spawn ELT command for {}", name))
        }
    }
}

fn cmd_history(project: &Project, name: &str, limit: usize) -> Result<()> {
    let history = open_history(project)?;
    let runs = history.recent_runs(name, limit)?;

    if runs.is_empty() {
        println!("No runs found for {}", name.cyan());
        return Ok(());
    }

    for run in runs {
        let state = match run.state {
            RunState::Success => run.state.to_string().green(),
            RunState::Failed => run.state.to_string().red(),
            RunState::Running => run.state.to_string().yellow(),
        };
        println!(
            "{} {} started={} ended={}",
            state,
            run.run_id.dimmed(),
            run.started_at.to_rfc3339(),
            run.ended_at.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string())
        );
    }

    Ok(())
}
