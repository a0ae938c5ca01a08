//! Review session management

use std::path::PathBuf;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::domain::{PlanEdit, SlideKind};
use crate::review;
use crate::workflow::{Phase, WorkflowError, WorkflowHandle, WorkflowState};

/// A parsed slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Help,
    Quit,
    Show,
    Status,
    Commit,
    Reset,
    Edit(PlanEdit),
    Save(PathBuf),
}

/// Parse a line starting with '/' into a command
pub fn parse_command(input: &str) -> Result<SessionCommand, String> {
    let mut parts = input.split_whitespace();
    let cmd = parts.next().unwrap_or("");
    let args: Vec<&str> = parts.collect();

    let position = |idx: usize| -> Result<usize, String> {
        args.get(idx)
            .ok_or_else(|| format!("{} needs a slide number", cmd))?
            .parse::<usize>()
            .map_err(|_| format!("'{}' is not a slide number", args[idx]))
    };
    let rest = |from: usize| args.get(from..).map(|a| a.join(" ")).unwrap_or_default();

    match cmd {
        "/help" | "/h" => Ok(SessionCommand::Help),
        "/quit" | "/q" | "/exit" => Ok(SessionCommand::Quit),
        "/show" | "/s" => Ok(SessionCommand::Show),
        "/status" => Ok(SessionCommand::Status),
        "/commit" | "/approve" => Ok(SessionCommand::Commit),
        "/reset" => Ok(SessionCommand::Reset),
        "/rm" => Ok(SessionCommand::Edit(PlanEdit::Remove { position: position(0)? })),
        "/mv" => Ok(SessionCommand::Edit(PlanEdit::Move {
            from: position(0)?,
            to: position(1)?,
        })),
        "/kind" => {
            let position = position(0)?;
            let kind = args
                .get(1)
                .ok_or_else(|| "/kind needs text or table".to_string())?
                .parse::<SlideKind>()
                .map_err(|e| e.to_string())?;
            Ok(SessionCommand::Edit(PlanEdit::SetKind { position, kind }))
        }
        "/topic" => Ok(SessionCommand::Edit(PlanEdit::SetTopic {
            position: position(0)?,
            topic: rest(1),
        })),
        "/rationale" => Ok(SessionCommand::Edit(PlanEdit::SetRationale { rationale: rest(0) })),
        "/save" => args
            .first()
            .map(|p| SessionCommand::Save(PathBuf::from(p)))
            .ok_or_else(|| "/save needs a file name".to_string()),
        _ => Err(format!("Unknown command: {}", cmd)),
    }
}

enum Flow {
    Continue,
    Quit,
}

/// Interactive plan review session
pub struct ReviewSession {
    handle: WorkflowHandle,
}

impl ReviewSession {
    pub fn new(handle: WorkflowHandle) -> Self {
        Self { handle }
    }

    /// Run the session main loop
    pub async fn run(&mut self, initial_prompt: Option<String>) -> Result<()> {
        self.print_welcome();

        if let Some(prompt) = initial_prompt {
            println!("{} {}", ">".bright_green(), prompt);
            self.submit(&prompt).await?;
        }

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match parse_command(input) {
                            Ok(cmd) => {
                                if let Flow::Quit = self.execute(cmd).await? {
                                    break;
                                }
                            }
                            Err(msg) => {
                                println!("{} {}", "?".yellow(), msg);
                                println!("Type {} for available commands", "/help".yellow());
                            }
                        }
                    } else {
                        self.submit(input).await?;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        self.handle.shutdown().await;
        println!("Goodbye!");
        Ok(())
    }

    async fn submit(&self, prompt: &str) -> Result<()> {
        debug!(prompt_len = prompt.len(), "submit: called");
        println!("{}", "Generating plan...".dimmed());
        let state = self.report(self.handle.submit(prompt).await)?;
        if let Some(state) = state
            && state.phase() == Phase::PlanReady
        {
            self.print_plan(&state);
            println!(
                "Edit with {} / {} / {}, approve with {}",
                "/rm".yellow(),
                "/mv".yellow(),
                "/kind".yellow(),
                "/commit".yellow()
            );
        }
        Ok(())
    }

    async fn execute(&self, cmd: SessionCommand) -> Result<Flow> {
        debug!(?cmd, "execute: called");
        match cmd {
            SessionCommand::Help => self.print_help(),
            SessionCommand::Quit => return Ok(Flow::Quit),
            SessionCommand::Show => {
                let state = self.report(self.handle.snapshot().await)?;
                if let Some(state) = state {
                    self.print_plan(&state);
                }
            }
            SessionCommand::Status => {
                if let Some(state) = self.report(self.handle.snapshot().await)? {
                    println!("{}", review::status_line(&state));
                    if state.can_commit() && state.phase() != Phase::Done {
                        println!("Approve with {}", "/commit".yellow());
                    }
                }
            }
            SessionCommand::Commit => {
                println!("{}", "Rendering presentation...".dimmed());
                if let Some(state) = self.report(self.handle.commit().await)?
                    && state.phase() == Phase::Done
                {
                    match state.saved_to() {
                        Some(path) => println!(
                            "{} Saved presentation: {}",
                            "✓".green(),
                            path.display().to_string().cyan()
                        ),
                        None => println!(
                            "{} Presentation rendered but could not be saved (see log)",
                            "!".yellow()
                        ),
                    }
                }
            }
            SessionCommand::Reset => {
                self.report(self.handle.reset().await)?;
                println!("{}", "Session reset.".dimmed());
            }
            SessionCommand::Edit(edit) => {
                if let Some(state) = self.report(self.handle.edit_plan(edit).await)? {
                    self.print_plan(&state);
                }
            }
            SessionCommand::Save(path) => {
                let state = self.report(self.handle.snapshot().await)?;
                match state.as_ref().and_then(|s| s.plan()) {
                    Some(plan) => {
                        plan.save(&path)?;
                        println!("{} Plan written to {}", "✓".green(), path.display());
                    }
                    None => println!("{} No plan to save yet", "?".yellow()),
                }
            }
        }
        Ok(Flow::Continue)
    }

    /// Print the outcome of a handle call; only a dead controller is an error
    fn report(&self, response: Result<WorkflowState, WorkflowError>) -> Result<Option<WorkflowState>> {
        match response {
            Ok(state) => {
                if let Some(err) = review::error_text(&state) {
                    println!("{}", err);
                }
                Ok(Some(state))
            }
            Err(WorkflowError::ChannelClosed) => Err(eyre::eyre!("Workflow controller stopped unexpectedly")),
            Err(e) => {
                println!("{} {}", "?".yellow(), e);
                Ok(None)
            }
        }
    }

    fn print_plan(&self, state: &WorkflowState) {
        match state.plan() {
            Some(plan) => {
                println!();
                print!("{}", review::plan_text(plan));
                println!();
            }
            None => println!("{}", "No plan yet. Describe your presentation to generate one.".dimmed()),
        }
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "SlidePilot Review Session".bright_cyan().bold());
        println!("Describe the presentation you want, review the plan, then approve it.");
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:20} Generate a plan from the text", "<text>".yellow());
        println!("  {:20} Show the current plan", "/show".yellow());
        println!("  {:20} Show the workflow state", "/status".yellow());
        println!("  {:20} Approve and render the deck", "/commit".yellow());
        println!("  {:20} Remove slide N", "/rm N".yellow());
        println!("  {:20} Move slide A to position B", "/mv A B".yellow());
        println!("  {:20} Change slide N's kind", "/kind N text|table".yellow());
        println!("  {:20} Change slide N's topic", "/topic N TEXT".yellow());
        println!("  {:20} Replace the rationale", "/rationale TEXT".yellow());
        println!("  {:20} Write the plan to a file", "/save FILE".yellow());
        println!("  {:20} Start over", "/reset".yellow());
        println!("  {:20} Exit the session", "/quit".yellow());
        println!();
    }
}
