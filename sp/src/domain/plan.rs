//! Plan domain types
//!
//! A Plan is the reviewable outline returned by the plan service: an ordered
//! list of slide specs plus the rationale behind the structure. Item order is
//! slide order in the rendered deck.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Kind of slide the render service should produce for a topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlideKind {
    /// Narrative text slide (title plus body)
    #[serde(rename = "text_slide", alias = "narrative-text")]
    Text,
    /// Tabular comparison slide
    #[serde(rename = "table_slide", alias = "tabular")]
    Table,
}

impl fmt::Display for SlideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlideKind::Text => write!(f, "text"),
            SlideKind::Table => write!(f, "table"),
        }
    }
}

impl FromStr for SlideKind {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "text_slide" | "narrative-text" => Ok(SlideKind::Text),
            "table" | "table_slide" | "tabular" => Ok(SlideKind::Table),
            other => Err(PlanError::UnknownKind(other.to_string())),
        }
    }
}

/// One slide within a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSpec {
    #[serde(alias = "slide_type")]
    pub kind: SlideKind,
    pub topic: String,
}

impl SlideSpec {
    pub fn new(kind: SlideKind, topic: impl Into<String>) -> Self {
        Self {
            kind,
            topic: topic.into(),
        }
    }
}

/// Structured presentation plan produced by the plan service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Why the deck is structured this way, for the reviewer
    pub rationale: String,
    /// Slides in presentation order
    #[serde(alias = "plan")]
    pub items: Vec<SlideSpec>,
}

/// Errors from plan edits
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("No slide at position {position} (plan has {len} slides)")]
    OutOfRange { position: usize, len: usize },

    #[error("Unknown slide kind '{0}' (expected text or table)")]
    UnknownKind(String),

    #[error("Topic must not be empty")]
    EmptyTopic,
}

/// A reviewer's change to a plan between generate and commit
///
/// Positions are 1-based, matching how slides are numbered for the reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanEdit {
    Remove { position: usize },
    Move { from: usize, to: usize },
    SetKind { position: usize, kind: SlideKind },
    SetTopic { position: usize, topic: String },
    SetRationale { rationale: String },
}

impl Plan {
    pub fn new(rationale: impl Into<String>, items: Vec<SlideSpec>) -> Self {
        Self {
            rationale: rationale.into(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn index(&self, position: usize) -> Result<usize, PlanError> {
        if position == 0 || position > self.items.len() {
            return Err(PlanError::OutOfRange {
                position,
                len: self.items.len(),
            });
        }
        Ok(position - 1)
    }

    /// Apply an edit in place; the plan is untouched on error
    pub fn apply(&mut self, edit: &PlanEdit) -> Result<(), PlanError> {
        debug!(?edit, len = self.items.len(), "Plan::apply: called");
        match edit {
            PlanEdit::Remove { position } => {
                let idx = self.index(*position)?;
                self.items.remove(idx);
            }
            PlanEdit::Move { from, to } => {
                let from_idx = self.index(*from)?;
                let to_idx = self.index(*to)?;
                let item = self.items.remove(from_idx);
                self.items.insert(to_idx, item);
            }
            PlanEdit::SetKind { position, kind } => {
                let idx = self.index(*position)?;
                self.items[idx].kind = *kind;
            }
            PlanEdit::SetTopic { position, topic } => {
                let idx = self.index(*position)?;
                let topic = topic.trim();
                if topic.is_empty() {
                    return Err(PlanError::EmptyTopic);
                }
                self.items[idx].topic = topic.to_string();
            }
            PlanEdit::SetRationale { rationale } => {
                self.rationale = rationale.trim().to_string();
            }
        }
        Ok(())
    }

    /// Load a plan from a JSON or YAML file (chosen by extension)
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Plan::load: called");
        let content =
            fs::read_to_string(path).context(format!("Failed to read plan file: {}", path.display()))?;
        let plan = if is_yaml(path) {
            serde_yaml::from_str(&content).context(format!("Failed to parse plan file: {}", path.display()))?
        } else {
            serde_json::from_str(&content).context(format!("Failed to parse plan file: {}", path.display()))?
        };
        Ok(plan)
    }

    /// Save the plan as JSON or YAML (chosen by extension)
    pub fn save(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), items = self.items.len(), "Plan::save: called");
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        fs::write(path, content).context(format!("Failed to write plan file: {}", path.display()))?;
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}
