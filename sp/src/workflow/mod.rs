//! Plan-review-commit workflow
//!
//! - [`state`] - the session state and its phases
//! - [`machine`] - pure transition rules
//! - [`controller`] - actor that runs the machine against real services

mod controller;
pub mod machine;
mod state;

pub use controller::{Services, WorkflowController, WorkflowError, WorkflowHandle, WorkflowResponse};
pub use machine::{
    Action, Effect, Event, PLAN_FALLBACK_MESSAGE, RENDER_FALLBACK_MESSAGE, Rejection, Ticket, Transition,
    UNEXPECTED_MESSAGE, VALIDATION_MESSAGE, Workflow,
};
pub use state::{Failure, FailureKind, Phase, WorkflowState};
