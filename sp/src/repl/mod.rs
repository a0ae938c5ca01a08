//! Interactive review session for SlidePilot
//!
//! Plain lines become the prompt for a new plan; slash commands edit,
//! approve or reset the plan under review.

mod session;

pub use session::{ReviewSession, SessionCommand, parse_command};

use eyre::Result;
use tracing::info;

use crate::workflow::WorkflowHandle;

/// Run the interactive session
///
/// This is the main entry point for `sp session`.
pub async fn run_interactive(handle: WorkflowHandle, initial_prompt: Option<String>) -> Result<()> {
    info!(has_prompt = initial_prompt.is_some(), "Starting review session");
    let mut session = ReviewSession::new(handle);
    session.run(initial_prompt).await
}
