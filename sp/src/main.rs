//! SlidePilot - plan, review, then render slide decks
//!
//! CLI entry point.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use slidepilot::cli::{Cli, Command, OutputFormat, PromptArgs, get_log_path};
use slidepilot::config::Config;
use slidepilot::domain::Plan;
use slidepilot::repl;
use slidepilot::review;
use slidepilot::save::FileSaver;
use slidepilot::service::HttpServices;
use slidepilot::workflow::{Phase, Services, WorkflowController, WorkflowHandle, WorkflowState};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    // Load configuration, then apply command-line overrides
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(server) = &cli.server {
        config.service.base_url = server.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output.dir = dir.clone();
    }
    config.validate().context("Invalid configuration")?;

    info!(base_url = %config.service.base_url, "SlidePilot loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Plan { prompt, format, output } => {
            debug!(%format, ?output, "main: matched Plan command");
            cmd_plan(&config, &prompt, &format, output.as_deref()).await
        }
        Command::Render { plan_file } => {
            debug!(plan_file = %plan_file.display(), "main: matched Render command");
            cmd_render(&config, &plan_file).await
        }
        Command::Run { prompt, yes } => {
            debug!(yes, "main: matched Run command");
            cmd_run(&config, &prompt, yes).await
        }
        Command::Session { prompt } => {
            debug!("main: matched Session command");
            let initial = (!prompt.is_empty()).then(|| prompt.join(" "));
            repl::run_interactive(start_workflow(&config)?, initial).await
        }
        Command::Config => {
            debug!("main: matched Config command");
            print!("{}", config.to_yaml()?);
            Ok(())
        }
    }
}

/// Wire the HTTP services and the file saver into a running controller
fn start_workflow(config: &Config) -> Result<WorkflowHandle> {
    let http = Arc::new(HttpServices::from_config(&config.service).context("Failed to create HTTP client")?);
    let services = Services {
        plan: http.clone(),
        render: http,
        saver: Arc::new(FileSaver::new(&config.output.dir)),
    };
    Ok(WorkflowController::spawn(services, config.output.filename.clone()))
}

fn read_prompt(args: &PromptArgs) -> Result<String> {
    match (args.inline(), &args.input) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => {
            fs::read_to_string(path).context(format!("Failed to read prompt from {}", path.display()))
        }
        (None, None) => Ok(String::new()),
    }
}

/// Turn a settled state into a process outcome
fn check(state: &WorkflowState, expected: Phase) -> Result<()> {
    if state.phase() == expected {
        return Ok(());
    }
    let message = state
        .error_message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Workflow ended in state '{}'", state.phase()));
    Err(eyre::eyre!(message))
}

fn report_saved(state: &WorkflowState) {
    match state.saved_to() {
        Some(path) => println!(
            "{} Saved presentation: {}",
            "✓".green(),
            path.display().to_string().cyan()
        ),
        None => println!(
            "{} Presentation rendered but could not be saved (see {})",
            "!".yellow(),
            get_log_path().display()
        ),
    }
}

/// Generate a plan and print it
async fn cmd_plan(config: &Config, prompt: &PromptArgs, format: &OutputFormat, output: Option<&Path>) -> Result<()> {
    debug!("cmd_plan: called");
    let text = read_prompt(prompt)?;
    let handle = start_workflow(config)?;

    let state = handle.submit(text).await?;
    check(&state, Phase::PlanReady)?;

    let Some(plan) = state.plan() else {
        return Err(eyre::eyre!("No plan was produced"));
    };
    println!("{}", review::format_plan(plan, format)?);
    if let Some(path) = output {
        plan.save(path)?;
        eprintln!("{} Plan written to {}", "✓".green(), path.display());
    }
    handle.shutdown().await;
    Ok(())
}

/// Render a reviewed plan file
async fn cmd_render(config: &Config, plan_file: &PathBuf) -> Result<()> {
    debug!("cmd_render: called");
    let plan = Plan::load(plan_file)?;
    let handle = start_workflow(config)?;

    handle.load_plan(plan).await?;
    println!("{}", "Rendering presentation...".dimmed());
    let state = handle.commit().await?;
    check(&state, Phase::Done)?;

    report_saved(&state);
    handle.shutdown().await;
    Ok(())
}

/// Generate, confirm, render
async fn cmd_run(config: &Config, prompt: &PromptArgs, yes: bool) -> Result<()> {
    debug!(yes, "cmd_run: called");
    let text = read_prompt(prompt)?;
    let handle = start_workflow(config)?;

    println!("{}", "Generating plan...".dimmed());
    let state = handle.submit(text).await?;
    check(&state, Phase::PlanReady)?;
    if let Some(plan) = state.plan() {
        print!("{}", review::plan_text(plan));
        println!();
    }

    if !yes && !confirm("Render this plan?")? {
        println!("Not rendered.");
        handle.shutdown().await;
        return Ok(());
    }

    println!("{}", "Rendering presentation...".dimmed());
    let state = handle.commit().await?;
    check(&state, Phase::Done)?;

    report_saved(&state);
    handle.shutdown().await;
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
