//! SlidePilot - plan, review, then render slide decks
//!
//! A user describes a presentation, a remote plan service proposes an
//! ordered list of slides, the user reviews (and optionally edits) that
//! plan, and on approval a remote render service turns it into a `.pptx`
//! file that is saved locally.
//!
//! # Modules
//!
//! - [`domain`] - plan and slide types, plan edits
//! - [`service`] - plan/render service traits and the HTTP implementation
//! - [`workflow`] - the plan-review-commit state machine and its actor
//! - [`save`] - delivering rendered bytes to disk
//! - [`review`] - terminal rendering of plans and state
//! - [`repl`] - interactive review session
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod repl;
pub mod review;
pub mod save;
pub mod service;
pub mod workflow;

/// Name the rendered deck is saved under unless configured otherwise
pub const DEFAULT_FILENAME: &str = "presentation.pptx";

pub use config::Config;
pub use domain::{Plan, PlanEdit, SlideKind, SlideSpec};
pub use save::{FileSaver, SaveEffect};
pub use service::{HttpServices, PlanService, RenderService, RenderedFile, ServiceError};
pub use workflow::{Phase, Services, WorkflowController, WorkflowError, WorkflowHandle, WorkflowState};
