//! Workflow state
//!
//! One `WorkflowState` exists per session. Only the state machine in
//! `machine.rs` mutates it; everything else sees snapshots.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::Plan;

/// Where the workflow currently stands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    /// Nothing in progress
    #[default]
    Idle,
    /// Generate was triggered with empty input
    Invalid,
    /// Waiting on the plan service
    GeneratingPlan,
    /// A plan is available for review
    PlanReady,
    /// The plan service call failed
    GenerateFailed,
    /// Waiting on the render service
    Committing,
    /// The deck was rendered and handed to the save effect
    Done,
    /// The render service call failed; the plan is kept for a retry
    CommitFailed,
}

impl Phase {
    /// True while a service call is outstanding
    pub fn is_busy(self) -> bool {
        matches!(self, Phase::GeneratingPlan | Phase::Committing)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Invalid => "invalid",
            Phase::GeneratingPlan => "generating-plan",
            Phase::PlanReady => "plan-ready",
            Phase::GenerateFailed => "generate-failed",
            Phase::Committing => "committing",
            Phase::Done => "done",
            Phase::CommitFailed => "commit-failed",
        };
        write!(f, "{}", s)
    }
}

/// Category of a workflow failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FailureKind {
    /// Input was empty; no service was contacted
    Validation,
    /// The plan service call failed
    PlanService,
    /// The render service call failed
    RenderService,
    /// A response that could not be understood
    Unexpected,
}

/// A failure surfaced to the reviewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// State of one plan-review-commit session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowState {
    pub(super) input_text: String,
    pub(super) plan: Option<Plan>,
    pub(super) busy: bool,
    pub(super) failure: Option<Failure>,
    pub(super) phase: Phase,
    pub(super) saved_to: Option<PathBuf>,
}

impl WorkflowState {
    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.failure.as_ref().map(|f| f.message.as_str())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Location reported by the save effect for the latest commit
    pub fn saved_to(&self) -> Option<&Path> {
        self.saved_to.as_deref()
    }

    /// Whether triggering commit would be accepted right now
    pub fn can_commit(&self) -> bool {
        !self.busy && self.plan.is_some()
    }
}
