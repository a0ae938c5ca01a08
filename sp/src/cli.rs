//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// SlidePilot - plan, review, then render slide decks
#[derive(Parser, Debug)]
#[command(name = "sp")]
#[command(author, version, about = "Generate a slide plan, review it, then render the deck", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Override service.base-url from the config
    #[arg(long, global = true, value_name = "URL")]
    pub server: Option<String>,

    /// Override output.dir from the config
    #[arg(long = "output-dir", global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Where the prompt text comes from
#[derive(Debug, Clone, clap::Args)]
pub struct PromptArgs {
    /// Presentation description (words are joined with spaces)
    #[arg(value_name = "PROMPT", conflicts_with = "input")]
    pub prompt: Vec<String>,

    /// Read the presentation description from a file
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,
}

impl PromptArgs {
    /// Resolve to the prompt text; `None` means read it from the input file
    pub fn inline(&self) -> Option<String> {
        if self.input.is_some() {
            return None;
        }
        Some(self.prompt.join(" "))
    }
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a plan and print it for review
    Plan {
        #[command(flatten)]
        prompt: PromptArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Also write the plan to this file (.json, .yaml or .yml)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Render a reviewed plan file into a deck
    Render {
        /// Plan file (.json, .yaml or .yml)
        #[arg(required = true)]
        plan_file: PathBuf,
    },

    /// Generate, review, approve and render in one go
    Run {
        #[command(flatten)]
        prompt: PromptArgs,

        /// Approve the plan without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Interactive review session
    Session {
        /// Optional first prompt
        prompt: Vec<String>,
    },

    /// Print the effective configuration
    Config,
}

/// Output format for plans
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(format!("Unknown format: {}. Use: text, json, or yaml", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}

/// Path of the log file written by `sp`
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("slidepilot")
        .join("logs")
        .join("slidepilot.log")
}
