//! Terminal rendering of plans and workflow state for human review

use colored::*;
use eyre::Result;

use crate::cli::OutputFormat;
use crate::domain::{Plan, SlideKind};
use crate::workflow::{Phase, WorkflowState};

/// Format a plan in the requested output format
pub fn format_plan(plan: &Plan, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(plan_text(plan)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(plan)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(plan)?),
    }
}

/// Human-readable plan: rationale first, then numbered slides
pub fn plan_text(plan: &Plan) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "Rationale".bright_cyan().bold()));
    for line in plan.rationale.lines() {
        out.push_str(&format!("  {}\n", line));
    }
    out.push('\n');

    out.push_str(&format!(
        "{} ({})\n",
        "Slides".bright_cyan().bold(),
        plan.items.len()
    ));
    if plan.items.is_empty() {
        out.push_str(&format!("  {}\n", "(no slides)".dimmed()));
    }
    for (i, item) in plan.items.iter().enumerate() {
        let kind = match item.kind {
            SlideKind::Text => "text ".green(),
            SlideKind::Table => "table".yellow(),
        };
        out.push_str(&format!("  {:>2}. [{}] {}\n", i + 1, kind, item.topic));
    }
    out
}

/// One-line summary of where the workflow stands
pub fn status_line(state: &WorkflowState) -> String {
    let phase = state.phase().to_string();
    let phase = match state.phase() {
        Phase::PlanReady | Phase::Done => phase.green(),
        Phase::GeneratingPlan | Phase::Committing => phase.cyan(),
        Phase::Invalid | Phase::GenerateFailed | Phase::CommitFailed => phase.red(),
        Phase::Idle => phase.normal(),
    };

    let mut line = format!("state: {}", phase);
    if let Some(plan) = state.plan() {
        line.push_str(&format!(", plan: {} slides", plan.items.len()));
    }
    if let Some(path) = state.saved_to() {
        line.push_str(&format!(", saved: {}", path.display()));
    }
    line
}

/// The failure message, styled for the terminal
pub fn error_text(state: &WorkflowState) -> Option<String> {
    state.error_message().map(|m| format!("{} {}", "✗".red(), m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SlideSpec;

    fn plan() -> Plan {
        Plan::new(
            "Start broad\nthen narrow",
            vec![
                SlideSpec::new(SlideKind::Text, "Intro"),
                SlideSpec::new(SlideKind::Table, "Comparison"),
            ],
        )
    }

    #[test]
    fn test_plan_text_numbers_slides_in_order() {
        colored::control::set_override(false);
        let text = plan_text(&plan());
        assert!(text.contains("Start broad"));
        assert!(text.contains("then narrow"));
        let intro = text.find(" 1. [text ] Intro").unwrap();
        let comparison = text.find(" 2. [table] Comparison").unwrap();
        assert!(intro < comparison);
    }

    #[test]
    fn test_plan_text_empty() {
        colored::control::set_override(false);
        assert!(plan_text(&Plan::default()).contains("(no slides)"));
    }

    #[test]
    fn test_format_plan_json_and_yaml() {
        let json = format_plan(&plan(), &OutputFormat::Json).unwrap();
        let back: Plan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan());

        let yaml = format_plan(&plan(), &OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("kind: table_slide"));
    }

    #[test]
    fn test_status_line_idle() {
        colored::control::set_override(false);
        let state = WorkflowState::default();
        assert_eq!(status_line(&state), "state: idle");
        assert!(error_text(&state).is_none());
    }
}
