//! Domain types for SlidePilot

mod plan;

pub use plan::{Plan, PlanEdit, PlanError, SlideKind, SlideSpec};
