//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::schedule::Transform;

/// Airlift - translates ELT schedules into orchestrator DAG descriptors
#[derive(Parser, Debug)]
#[command(
    name = "airlift",
    about = "Generate orchestrator DAG descriptors from ELT schedules",
    version
)]
pub struct Cli {
    /// Project root (default: discover by walking up from cwd)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build task descriptors for all eligible schedules
    Generate {
        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        /// Write the manifest to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List schedules and their eligibility
    List,

    /// Add a schedule to the project file
    Add {
        /// Schedule name (unique, doubles as the job identifier)
        name: String,

        /// Extractor plugin identifier
        extractor: String,

        /// Loader plugin identifier
        loader: String,

        /// Recurrence interval (cron expression or @preset)
        #[arg(short, long, default_value = "@once")]
        interval: String,

        /// Transform behavior
        #[arg(short, long, default_value = "skip")]
        transform: Transform,

        /// First date the orchestrator may run this schedule (YYYY-MM-DD)
        #[arg(short, long)]
        start_date: Option<String>,

        /// Environment override, KEY=VALUE (repeatable)
        #[arg(short, long, value_parser = parse_env_pair)]
        env: Vec<(String, String)>,
    },

    /// Run a schedule's ELT command once, recording the outcome
    Run {
        /// Schedule name
        name: String,
    },

    /// Show recent runs for a schedule
    History {
        /// Schedule name
        name: String,

        /// Maximum runs to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

/// Output format for the generate command
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    #[default]
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl clap::ValueEnum for Transform {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Skip, Self::Run, Self::Only]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(match self {
            Self::Skip => "skip",
            Self::Run => "run",
            Self::Only => "only",
        }))
    }
}

/// Parse a KEY=VALUE environment override
fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("Expected KEY=VALUE, got: {}", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_generate_defaults() {
        let cli = Cli::parse_from(["al", "generate"]);
        if let Command::Generate { format, output } = cli.command {
            assert_eq!(format, OutputFormat::Json);
            assert!(output.is_none());
        } else {
            panic!("Expected Generate command");
        }
    }

    #[test]
    fn test_cli_parse_generate_text_to_file() {
        let cli = Cli::parse_from(["al", "generate", "--format", "text", "--output", "dags.txt"]);
        if let Command::Generate { format, output } = cli.command {
            assert_eq!(format, OutputFormat::Text);
            assert_eq!(output, Some(PathBuf::from("dags.txt")));
        } else {
            panic!("Expected Generate command");
        }
    }

    #[test]
    fn test_cli_parse_list() {
        let cli = Cli::parse_from(["al", "list"]);
        assert!(matches!(cli.command, Command::List));
    }

    #[test]
    fn test_cli_parse_add() {
        let cli = Cli::parse_from([
            "al",
            "add",
            "gitlab",
            "tap-gitlab",
            "target-postgres",
            "--interval",
            "@daily",
            "--transform",
            "run",
            "--env",
            "TAP_GITLAB_TOKEN=secret",
            "--env",
            "TAP_GITLAB_API_URL=https://gitlab.example.com",
        ]);

        if let Command::Add {
            name,
            extractor,
            loader,
            interval,
            transform,
            env,
            ..
        } = cli.command
        {
            assert_eq!(name, "gitlab");
            assert_eq!(extractor, "tap-gitlab");
            assert_eq!(loader, "target-postgres");
            assert_eq!(interval, "@daily");
            assert_eq!(transform, Transform::Run);
            assert_eq!(env.len(), 2);
            assert_eq!(env[0], ("TAP_GITLAB_TOKEN".to_string(), "secret".to_string()));
        } else {
            panic!("Expected Add command");
        }
    }

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["al", "run", "gitlab"]);
        if let Command::Run { name } = cli.command {
            assert_eq!(name, "gitlab");
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_cli_parse_history() {
        let cli = Cli::parse_from(["al", "history", "gitlab", "--limit", "3"]);
        assert!(matches!(cli.command, Command::History { limit: 3, .. }));
    }

    #[test]
    fn test_cli_with_project_override() {
        let cli = Cli::parse_from(["al", "--project", "/srv/elt", "list"]);
        assert_eq!(cli.project, Some(PathBuf::from("/srv/elt")));
    }

    #[test]
    fn test_parse_env_pair() {
        assert_eq!(
            parse_env_pair("KEY=value"),
            Ok(("KEY".to_string(), "value".to_string()))
        );
        assert_eq!(
            parse_env_pair("KEY=a=b"),
            Ok(("KEY".to_string(), "a=b".to_string()))
        );
        assert!(parse_env_pair("novalue").is_err());
        assert!(parse_env_pair("=bare").is_err());
    }

    #[test]
    fn test_output_format_from_str() {
        assert!(matches!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text)));
        assert!(matches!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json)));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
