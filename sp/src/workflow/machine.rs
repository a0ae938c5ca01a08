//! Workflow state machine
//!
//! Pure transitions: `Workflow::apply` takes an event, updates the state and
//! returns the effect the driver must run, if any. No I/O happens here.
//!
//! ```text
//! Idle ──generate──▶ GeneratingPlan ──ok──▶ PlanReady ──commit──▶ Committing ──ok──▶ Done
//!   │                     │                                          │
//!   └─empty─▶ Invalid     └──err──▶ GenerateFailed                   └──err──▶ CommitFailed
//!
//! reset: any ──▶ Idle
//! ```
//!
//! Every request effect carries a ticket. A settle event is only accepted
//! for the ticket of the call currently outstanding, so a result arriving
//! after a reset is dropped.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::state::{Failure, FailureKind, Phase, WorkflowState};
use crate::domain::{Plan, PlanEdit, PlanError};
use crate::service::{RenderedFile, ServiceError};

/// Shown when generate is triggered with empty input
pub const VALIDATION_MESSAGE: &str = "Describe the presentation you want before generating a plan.";

/// Shown when the plan service fails without a usable detail
pub const PLAN_FALLBACK_MESSAGE: &str = "Failed to generate the slide plan. Check the server logs.";

/// Shown when the render service fails without a usable detail
pub const RENDER_FALLBACK_MESSAGE: &str = "Failed to create the presentation file.";

/// Shown when a service answers with something that cannot be understood
pub const UNEXPECTED_MESSAGE: &str = "The service sent a response that could not be understood.";

/// Identifies one service call
pub type Ticket = u64;

/// User-triggered actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    EditInput(String),
    Generate,
    Commit,
    EditPlan(PlanEdit),
    /// Put a previously reviewed plan up for commit
    LoadPlan(Plan),
    Reset,
}

/// Everything that can move the workflow
#[derive(Debug)]
pub enum Event {
    Action(Action),
    PlanSettled {
        ticket: Ticket,
        result: Result<Plan, ServiceError>,
    },
    RenderSettled {
        ticket: Ticket,
        result: Result<RenderedFile, ServiceError>,
    },
    /// The save effect reported where the deck went (`None` if it failed)
    Delivered {
        ticket: Ticket,
        location: Option<PathBuf>,
    },
}

impl Event {
    /// Ticket of the call this event settles; `None` for user actions
    pub fn ticket(&self) -> Option<Ticket> {
        match self {
            Event::Action(_) => None,
            Event::PlanSettled { ticket, .. }
            | Event::RenderSettled { ticket, .. }
            | Event::Delivered { ticket, .. } => Some(*ticket),
        }
    }
}

impl From<Action> for Event {
    fn from(action: Action) -> Self {
        Event::Action(action)
    }
}

/// Work the driver must perform after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RequestPlan { ticket: Ticket, prompt: String },
    RequestRender { ticket: Ticket, plan: Plan },
    Save { ticket: Ticket, filename: String, data: Vec<u8> },
}

/// Why an event was refused; the state is unchanged
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("A request is already in progress")]
    Busy,

    #[error("There is no plan to work on")]
    NoPlan,

    #[error("Result belongs to a superseded request")]
    Stale,

    #[error("Invalid edit: {0}")]
    Edit(#[from] PlanError),
}

/// Outcome of applying an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Applied(Option<Effect>),
    Rejected(Rejection),
}

impl Transition {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Transition::Rejected(_))
    }

    pub fn effect(&self) -> Option<&Effect> {
        match self {
            Transition::Applied(effect) => effect.as_ref(),
            Transition::Rejected(_) => None,
        }
    }
}

/// The workflow state plus the bookkeeping needed to drive it
#[derive(Debug, Clone)]
pub struct Workflow {
    state: WorkflowState,
    filename: String,
    ticket: Ticket,
}

impl Workflow {
    /// New workflow whose commits save under `filename`
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            state: WorkflowState::default(),
            filename: filename.into(),
            ticket: 0,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Ticket of the most recent request (or reset)
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Apply one event
    pub fn apply(&mut self, event: Event) -> Transition {
        debug!(phase = %self.state.phase, ticket = self.ticket, "apply: called");
        match event {
            Event::Action(Action::EditInput(text)) => {
                self.state.input_text = text;
                Transition::Applied(None)
            }
            Event::Action(Action::Generate) => self.generate(),
            Event::Action(Action::Commit) => self.commit(),
            Event::Action(Action::EditPlan(edit)) => self.edit_plan(&edit),
            Event::Action(Action::LoadPlan(plan)) => self.load_plan(plan),
            Event::Action(Action::Reset) => self.reset(),
            Event::PlanSettled { ticket, result } => self.plan_settled(ticket, result),
            Event::RenderSettled { ticket, result } => self.render_settled(ticket, result),
            Event::Delivered { ticket, location } => self.delivered(ticket, location),
        }
    }

    fn next_ticket(&mut self) -> Ticket {
        self.ticket += 1;
        self.ticket
    }

    fn generate(&mut self) -> Transition {
        if self.state.busy {
            debug!("generate: rejected, busy");
            return Transition::Rejected(Rejection::Busy);
        }

        if self.state.input_text.trim().is_empty() {
            debug!("generate: empty input");
            self.state.failure = Some(Failure::new(FailureKind::Validation, VALIDATION_MESSAGE));
            self.state.phase = Phase::Invalid;
            return Transition::Applied(None);
        }

        let ticket = self.next_ticket();
        self.state.busy = true;
        self.state.failure = None;
        self.state.plan = None;
        self.state.saved_to = None;
        self.state.phase = Phase::GeneratingPlan;
        info!(ticket, prompt_len = self.state.input_text.len(), "Requesting plan");

        Transition::Applied(Some(Effect::RequestPlan {
            ticket,
            prompt: self.state.input_text.clone(),
        }))
    }

    fn commit(&mut self) -> Transition {
        if self.state.busy {
            debug!("commit: rejected, busy");
            return Transition::Rejected(Rejection::Busy);
        }
        let Some(plan) = self.state.plan.clone() else {
            debug!("commit: rejected, no plan");
            return Transition::Rejected(Rejection::NoPlan);
        };

        let ticket = self.next_ticket();
        self.state.busy = true;
        self.state.failure = None;
        self.state.saved_to = None;
        self.state.phase = Phase::Committing;
        info!(ticket, items = plan.items.len(), "Requesting render");

        Transition::Applied(Some(Effect::RequestRender { ticket, plan }))
    }

    fn edit_plan(&mut self, edit: &PlanEdit) -> Transition {
        if self.state.busy {
            return Transition::Rejected(Rejection::Busy);
        }
        let Some(plan) = self.state.plan.as_mut() else {
            return Transition::Rejected(Rejection::NoPlan);
        };
        if let Err(e) = plan.apply(edit) {
            debug!(error = %e, "edit_plan: rejected");
            return Transition::Rejected(Rejection::Edit(e));
        }

        // The saved deck no longer matches the plan
        if self.state.phase == Phase::Done {
            self.state.phase = Phase::PlanReady;
            self.state.saved_to = None;
        }
        Transition::Applied(None)
    }

    fn load_plan(&mut self, plan: Plan) -> Transition {
        if self.state.busy {
            return Transition::Rejected(Rejection::Busy);
        }
        info!(items = plan.items.len(), "Plan loaded for review");
        self.state.plan = Some(plan);
        self.state.failure = None;
        self.state.saved_to = None;
        self.state.phase = Phase::PlanReady;
        Transition::Applied(None)
    }

    fn reset(&mut self) -> Transition {
        if self.state.busy {
            // No cancellation: the call runs on, its result will be stale
            info!(ticket = self.ticket, "Reset while a request is in flight");
        }
        self.next_ticket();
        self.state = WorkflowState::default();
        Transition::Applied(None)
    }

    fn is_current(&self, ticket: Ticket, phase: Phase) -> bool {
        ticket == self.ticket && self.state.phase == phase
    }

    fn plan_settled(&mut self, ticket: Ticket, result: Result<Plan, ServiceError>) -> Transition {
        if !self.is_current(ticket, Phase::GeneratingPlan) {
            debug!(ticket, current = self.ticket, "plan_settled: stale");
            return Transition::Rejected(Rejection::Stale);
        }

        self.state.busy = false;
        match result {
            Ok(plan) => {
                info!(ticket, items = plan.items.len(), "Plan ready for review");
                self.state.plan = Some(plan);
                self.state.phase = Phase::PlanReady;
            }
            Err(e) => {
                warn!(ticket, error = %e, "Plan generation failed");
                self.state.plan = None;
                self.state.failure = Some(failure_for(&e, FailureKind::PlanService, PLAN_FALLBACK_MESSAGE));
                self.state.phase = Phase::GenerateFailed;
            }
        }
        Transition::Applied(None)
    }

    fn render_settled(&mut self, ticket: Ticket, result: Result<RenderedFile, ServiceError>) -> Transition {
        if !self.is_current(ticket, Phase::Committing) {
            debug!(ticket, current = self.ticket, "render_settled: stale");
            return Transition::Rejected(Rejection::Stale);
        }

        self.state.busy = false;
        match result {
            Ok(file) => {
                info!(ticket, bytes = file.len(), "Presentation rendered");
                self.state.phase = Phase::Done;
                Transition::Applied(Some(Effect::Save {
                    ticket,
                    filename: self.filename.clone(),
                    data: file.data,
                }))
            }
            Err(e) => {
                warn!(ticket, error = %e, "Presentation rendering failed");
                self.state.failure = Some(failure_for(&e, FailureKind::RenderService, RENDER_FALLBACK_MESSAGE));
                self.state.phase = Phase::CommitFailed;
                Transition::Applied(None)
            }
        }
    }

    fn delivered(&mut self, ticket: Ticket, location: Option<PathBuf>) -> Transition {
        if !self.is_current(ticket, Phase::Done) {
            return Transition::Rejected(Rejection::Stale);
        }
        self.state.saved_to = location;
        Transition::Applied(None)
    }
}

fn failure_for(err: &ServiceError, kind: FailureKind, fallback: &str) -> Failure {
    if err.is_malformed() {
        return Failure::new(FailureKind::Unexpected, UNEXPECTED_MESSAGE);
    }
    Failure::new(kind, err.user_message(fallback))
}
